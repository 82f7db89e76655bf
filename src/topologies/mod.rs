//! Per-topology unbalance formulas.
//!
//! This module provides the calculator side of the engine. Each topology
//! variant owns its IEEE C37.99 table model:
//! - Double star, internal fuses: Table 7 element-group ladder
//! - Double star, external fuses: Table 3 group-level model
//! - H-bridge, internal fuses: Table 8 bridge-arm model
//! - Single star, internal fuses: grounding-transformer neutral path
//!
//! The models share no formulas; [`compute`] and [`sweep`] only dispatch.
//!
//! ## Per-unit convention
//!
//! All inputs and outputs are per-unit on the bank's own base: 1.0 is the
//! healthy value of every capacitance, voltage, and current. `F` failed
//! elements (internal fuses) or failed units (external fuses) perturb the
//! affected branch; the formulas propagate that perturbation through unit,
//! group, string, and phase equivalents up to the neutral point.

pub(crate) mod double_star_external;
pub(crate) mod double_star_internal;
pub(crate) mod h_bridge;
pub(crate) mod single_star;

pub use double_star_external::DoubleStarExternal;
pub use double_star_internal::DoubleStarInternal;
pub use h_bridge::HBridge;
pub use single_star::SingleStar;

use serde::Serialize;

use crate::bank::{param, ParameterSet, Topology};
use crate::error::{BankError, Result};

/// Denominators below this magnitude are treated as zero.
pub(crate) const MIN_DENOMINATOR: f64 = 1e-12;

/// Default grounding flag: ungrounded (neutral current is the observable).
pub(crate) const DEFAULT_GROUNDING: f64 = 1.0;

/// Default series element groups per capacitor unit.
pub(crate) const DEFAULT_GROUPS_PER_UNIT: u32 = 1;

/// Default grounding-transformer reactance in per-unit (single star).
pub(crate) const DEFAULT_GROUNDING_REACTANCE_PU: f64 = 1.0;

/// Neutral quantities computed for one (Topology, ParameterSet) pair.
///
/// All fields are per-unit magnitudes. A value is only meaningful if the
/// parameter set passed [`crate::validate`] for the same topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeutralQuantities {
    /// Current in the neutral path: the neutral tie current for ungrounded
    /// double-star banks, the ground current for grounded ones, the
    /// bridge-arm current for the H-bridge, and the grounding-transformer
    /// current for the single star.
    pub neutral_current: f64,
    /// Neutral-to-reference voltage displacement.
    pub neutral_voltage: f64,
    /// Voltage across the worst-stressed remaining capacitor unit.
    pub unit_voltage: f64,
    /// Current through the worst-stressed remaining capacitor unit.
    pub unit_current: f64,
}

impl NeutralQuantities {
    /// Check all fields are finite, converting them to magnitudes.
    pub(crate) fn into_magnitudes(self) -> Result<Self> {
        let checked = |value: f64, quantity: &str| -> Result<f64> {
            if value.is_finite() {
                Ok(value.abs())
            } else {
                Err(BankError::NonFiniteResult {
                    quantity: quantity.to_string(),
                })
            }
        };
        Ok(Self {
            neutral_current: checked(self.neutral_current, "neutral current")?,
            neutral_voltage: checked(self.neutral_voltage, "neutral voltage")?,
            unit_voltage: checked(self.unit_voltage, "unit voltage")?,
            unit_current: checked(self.unit_current, "unit current")?,
        })
    }
}

/// One row of a failed-element sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Failed elements (internal fuses) or failed units (external fuses).
    pub failed: u32,
    pub quantities: NeutralQuantities,
}

/// Compute neutral quantities for a validated parameter set.
///
/// Assumes the caller ran [`crate::validate`] first; still fails fast with a
/// [`BankError`] on combinations validation would have rejected.
pub fn compute(topology: Topology, params: &ParameterSet) -> Result<NeutralQuantities> {
    tracing::debug!(topology = %topology, "computing neutral quantities");
    match topology {
        Topology::DoubleStarInternalFuses => DoubleStarInternal::from_params(params)?.quantities(),
        Topology::DoubleStarExternalFuses => DoubleStarExternal::from_params(params)?.quantities(),
        Topology::HBridgeInternalFuses => HBridge::from_params(params)?.quantities(),
        Topology::SingleStarInternalFuses => SingleStar::from_params(params)?.quantities(),
    }
}

/// Evaluate the calculator over the full failed-element range.
///
/// Internal-fuse topologies sweep `0..N` failed elements; the external-fuse
/// double star sweeps `0..Pa` failed units. The `F` parameter, if present,
/// is ignored in favor of the sweep variable.
pub fn sweep(topology: Topology, params: &ParameterSet) -> Result<Vec<SweepPoint>> {
    tracing::debug!(topology = %topology, "sweeping failed-element range");
    match topology {
        Topology::DoubleStarInternalFuses => DoubleStarInternal::from_params(params)?.sweep(),
        Topology::DoubleStarExternalFuses => DoubleStarExternal::from_params(params)?.sweep(),
        Topology::HBridgeInternalFuses => HBridge::from_params(params)?.sweep(),
        Topology::SingleStarInternalFuses => SingleStar::from_params(params)?.sweep(),
    }
}

// ============ Calculator-side parameter access ============
//
// Validation reports rule violations as diagnostics; by the time the
// calculator runs, the same conditions are contract violations and fail the
// call with a descriptive error instead.

/// Divide, failing on a (near-)zero denominator instead of producing inf/NaN.
pub(crate) fn safe_div(num: f64, den: f64, expression: &str) -> Result<f64> {
    if den.abs() < MIN_DENOMINATOR {
        return Err(BankError::division_by_zero(expression));
    }
    Ok(num / den)
}

/// Fetch a required positive integer parameter.
pub(crate) fn count(params: &ParameterSet, name: &str, topology: Topology) -> Result<u32> {
    let value = params
        .get(name)
        .ok_or_else(|| BankError::missing_parameter(name, topology.key()))?;
    as_count(name, value)
}

/// Fetch an optional positive integer parameter with a default.
pub(crate) fn count_or(params: &ParameterSet, name: &str, default: u32) -> Result<u32> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => as_count(name, value),
    }
}

/// Fetch the failed count `F` (default 0), bounded by `limit`.
pub(crate) fn failed_count(params: &ParameterSet, limit: u32, limit_name: &str) -> Result<u32> {
    let value = params.get_or(param::F, 0.0);
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 {
        return Err(BankError::invalid_parameter(
            param::F,
            format!("must be a non-negative integer, got {value}"),
        ));
    }
    let failed = value as u32;
    if failed >= limit {
        return Err(BankError::invalid_parameter(
            param::F,
            format!("must be smaller than {limit_name} ({limit}), got {failed}"),
        ));
    }
    Ok(failed)
}

/// Fetch the grounding flag `G` as 0.0 or 1.0.
pub(crate) fn grounding_flag(params: &ParameterSet) -> Result<f64> {
    let g = params.get_or(param::G, DEFAULT_GROUNDING);
    if g != 0.0 && g != 1.0 {
        return Err(BankError::invalid_parameter(
            param::G,
            format!("must be 0 (grounded) or 1 (ungrounded), got {g}"),
        ));
    }
    Ok(g)
}

fn as_count(name: &str, value: f64) -> Result<u32> {
    if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64 {
        return Err(BankError::invalid_parameter(
            name,
            format!("must be a positive integer, got {value}"),
        ));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_div_guards_zero() {
        assert!(safe_div(1.0, 0.0, "Cg").is_err());
        assert!(safe_div(1.0, 1e-15, "Cg").is_err());
        assert_eq!(safe_div(6.0, 2.0, "Cg").unwrap(), 3.0);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let params: ParameterSet = [("S", 4.0), ("Pt", 11.0), ("Pa", 6.0), ("P", 3.0)]
            .into_iter()
            .collect();
        let a = compute(Topology::DoubleStarInternalFuses, &params).unwrap();
        let b = compute(Topology::DoubleStarInternalFuses, &params).unwrap();
        // Bit-identical, not merely close
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_topologies_route_to_distinct_formulas() {
        // Valid for both the internal-fuse double star and the H-bridge:
        // the double star ignores St, the H-bridge requires it.
        let params: ParameterSet = [
            ("S", 7.0),
            ("St", 3.0),
            ("Pt", 9.0),
            ("Pa", 4.0),
            ("P", 2.0),
            ("N", 16.0),
            ("Su", 3.0),
            ("G", 1.0),
            ("F", 1.0),
        ]
        .into_iter()
        .collect();

        for topology in [
            Topology::DoubleStarInternalFuses,
            Topology::HBridgeInternalFuses,
        ] {
            assert!(
                crate::validate(topology, &params).is_valid(),
                "expected overlap set to validate for {topology}"
            );
        }

        let star = compute(Topology::DoubleStarInternalFuses, &params).unwrap();
        let bridge = compute(Topology::HBridgeInternalFuses, &params).unwrap();
        assert_ne!(star, bridge);

        // The bridge arm amplifies a single failed element relative to the
        // double star's neutral tie.
        assert!(bridge.neutral_current > star.neutral_current);
    }

    #[test]
    fn test_sweep_orders_failed_counts() {
        let params: ParameterSet = [
            ("S", 4.0),
            ("Pt", 11.0),
            ("Pa", 6.0),
            ("P", 3.0),
            ("N", 14.0),
            ("Su", 3.0),
        ]
        .into_iter()
        .collect();
        let rows = sweep(Topology::DoubleStarInternalFuses, &params).unwrap();
        assert_eq!(rows.len(), 14);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.failed, i as u32);
        }
        // Balanced point has no unbalance
        assert_eq!(rows[0].quantities.neutral_current, 0.0);
    }
}
