//! Core types for bank representation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BankError, Result};

/// Parameter names recognized by the engine.
///
/// Each topology defines its own required subset; see [`crate::validate`].
pub mod param {
    /// Parallel units in the affected (left) branch / group count.
    pub const PA: &str = "Pa";
    /// Capacitor units per internal-fuse parallel group.
    pub const P: &str = "P";
    /// Total parallel units per phase.
    pub const PT: &str = "Pt";
    /// Series groups per phase.
    pub const S: &str = "S";
    /// Series groups below the bridge tie (H-bridge only).
    pub const ST: &str = "St";
    /// Failed elements (internal fuses) or failed units (external fuses).
    pub const F: &str = "F";
    /// Grounding flag: 0 = grounded, 1 = ungrounded.
    pub const G: &str = "G";
    /// Series elements per capacitor unit.
    pub const N: &str = "N";
    /// Series element groups per capacitor unit.
    pub const SU: &str = "Su";
    /// Grounding-transformer reactance in per-unit (single-star only).
    pub const XG: &str = "Xg";
}

/// A capacitor bank arrangement, selected once per analysis session.
///
/// The variant determines which parameters are required or forbidden and
/// which unbalance formula applies. The set is closed: an unrecognized key
/// at the string boundary is a fatal [`BankError::UnknownTopology`], never
/// a failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Double star, fuses inside the capacitor cans (IEEE Table 7).
    DoubleStarInternalFuses,
    /// Double star, fuses external to the cans (IEEE Table 3).
    DoubleStarExternalFuses,
    /// H-bridge with internal fuses (IEEE Table 8).
    HBridgeInternalFuses,
    /// Single star grounded through a grounding transformer, internal fuses.
    SingleStarInternalFuses,
}

impl Topology {
    /// All supported topologies, in display order.
    pub const ALL: [Topology; 4] = [
        Topology::DoubleStarInternalFuses,
        Topology::DoubleStarExternalFuses,
        Topology::HBridgeInternalFuses,
        Topology::SingleStarInternalFuses,
    ];

    /// The stable string key used at the front-end boundary.
    pub fn key(&self) -> &'static str {
        match self {
            Topology::DoubleStarInternalFuses => "double_star_internal_fuses",
            Topology::DoubleStarExternalFuses => "double_star_external_fuses",
            Topology::HBridgeInternalFuses => "h_bridge_internal_fuses",
            Topology::SingleStarInternalFuses => "single_star_internal_fuses",
        }
    }

    /// Resolve a string key to a topology.
    pub fn from_key(key: &str) -> Result<Topology> {
        Topology::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| BankError::unknown_topology(key))
    }

    /// Human-readable label for reports and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Topology::DoubleStarInternalFuses => "Double star, internal fuses",
            Topology::DoubleStarExternalFuses => "Double star, external fuses",
            Topology::HBridgeInternalFuses => "H-bridge, internal fuses",
            Topology::SingleStarInternalFuses => "Single star, internal fuses",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A named set of electrical/geometrical parameters supplied by the caller.
///
/// Keys are parameter names from [`param`]; ordering is stable so that
/// validation diagnostics come out in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet(BTreeMap<String, f64>);

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value, replacing any previous value.
    pub fn set(&mut self, name: &str, value: f64) -> &mut Self {
        self.0.insert(name.to_string(), value);
        self
    }

    /// Look up a parameter value.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Look up a parameter, falling back to a default when absent.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Check whether a parameter is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate over (name, value) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of parameters present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
