//! Parameter-set validation.
//!
//! [`validate`] decides, per topology, whether a [`ParameterSet`] is legal,
//! and explains why not. Each topology owns its rule set; there is no
//! generic cross-topology rule. Malformed input never panics and never
//! returns an error: every violation becomes one diagnostic in the
//! [`ValidationResult`].

use serde::Serialize;

use crate::topologies::{double_star_external, double_star_internal, h_bridge, single_star};

use super::{ParameterSet, Topology};

/// Outcome of validating a (Topology, ParameterSet) combination.
///
/// Valid iff `errors` is empty. `warnings` flag legal but questionable
/// combinations and never block computation. Produced fresh per call and
/// never mutated afterward.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// An empty (passing) result.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether the parameter set passed validation.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Append an error diagnostic.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Append a warning diagnostic.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validate a parameter set against a topology's rules.
///
/// Dispatches to the rule set owned by the topology variant. Parameters
/// outside a topology's schema are ignored unless that topology explicitly
/// forbids them.
pub fn validate(topology: Topology, params: &ParameterSet) -> ValidationResult {
    tracing::debug!(topology = %topology, params = params.len(), "validating parameter set");

    let result = match topology {
        Topology::DoubleStarInternalFuses => double_star_internal::validate(params),
        Topology::DoubleStarExternalFuses => double_star_external::validate(params),
        Topology::HBridgeInternalFuses => h_bridge::validate(params),
        Topology::SingleStarInternalFuses => single_star::validate(params),
    };

    if !result.is_valid() {
        tracing::debug!(topology = %topology, errors = result.errors.len(), "validation failed");
    }
    result
}

// ============ Shared rule primitives ============
//
// These check a single parameter and append a diagnostic naming it; rule
// composition stays inside each topology module.

/// Require a positive integer parameter; returns its value when well-formed.
pub(crate) fn require_count(
    params: &ParameterSet,
    name: &str,
    result: &mut ValidationResult,
) -> Option<u32> {
    match params.get(name) {
        None => {
            result.error(format!("missing required parameter '{name}'"));
            None
        }
        Some(value) => check_count(name, value, result),
    }
}

/// Check an optional positive integer parameter; `None` when absent or bad.
pub(crate) fn optional_count(
    params: &ParameterSet,
    name: &str,
    result: &mut ValidationResult,
) -> Option<u32> {
    params.get(name).and_then(|v| check_count(name, v, result))
}

/// Reject a parameter that must not appear for this topology.
pub(crate) fn forbid(
    params: &ParameterSet,
    name: &str,
    reason: &str,
    result: &mut ValidationResult,
) {
    if params.contains(name) {
        result.error(format!("parameter '{name}' is not allowed here: {reason}"));
    }
}

/// Check the optional grounding flag `G` (0 = grounded, 1 = ungrounded).
pub(crate) fn check_grounding_flag(params: &ParameterSet, result: &mut ValidationResult) {
    if let Some(g) = params.get(super::param::G) {
        if g != 0.0 && g != 1.0 {
            result.error(format!(
                "parameter 'G' must be 0 (grounded) or 1 (ungrounded), got {g}"
            ));
        }
    }
}

fn check_count(name: &str, value: f64, result: &mut ValidationResult) -> Option<u32> {
    if !value.is_finite() {
        result.error(format!("parameter '{name}' must be a finite number"));
        return None;
    }
    if value.fract() != 0.0 {
        result.error(format!("parameter '{name}' must be an integer, got {value}"));
        return None;
    }
    if value < 1.0 || value > u32::MAX as f64 {
        result.error(format!("parameter '{name}' must be a positive integer, got {value}"));
        return None;
    }
    Some(value as u32)
}

/// Check the optional failed-count `F`: integer in `0..limit`.
///
/// `limit_name` names the parameter that bounds the sweep (`N` or `Pa`).
pub(crate) fn check_failed_count(
    params: &ParameterSet,
    limit: Option<u32>,
    limit_name: &str,
    result: &mut ValidationResult,
) {
    let Some(f) = params.get(super::param::F) else {
        return;
    };
    if !f.is_finite() || f.fract() != 0.0 || f < 0.0 {
        result.error(format!("parameter 'F' must be a non-negative integer, got {f}"));
        return;
    }
    match limit {
        Some(limit) => {
            if f as u32 >= limit {
                result.error(format!(
                    "parameter 'F' must be smaller than {limit_name} ({limit}), got {f}"
                ));
            }
        }
        None => {
            if f > 0.0 {
                result.error(format!("parameter '{limit_name}' is required when 'F' > 0"));
            }
        }
    }
}
