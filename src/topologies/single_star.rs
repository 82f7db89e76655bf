//! Single star with internal fuses, grounded through a grounding transformer.
//!
//! One star group per phase: `Pa` and `Pt` are fixed at 1 and are constants
//! of the variant, not inputs. There is no second star group to balance
//! against, so the neutral shift is computed against the grounding
//! transformer path by nodal (Millman) analysis: the neutral displacement is
//! the affected phase's susceptance deviation divided by the total
//! susceptance seen from the neutral, including the grounding admittance,
//! and the neutral current is the displacement driven through that
//! admittance. Structurally different from the double-star models, not a
//! degenerate case of them.

use crate::bank::{
    check_failed_count, forbid, optional_count, param, require_count, ParameterSet,
    ValidationResult,
};
use crate::error::{BankError, Result};

use super::{
    count, count_or, failed_count, safe_div, NeutralQuantities, SweepPoint,
    DEFAULT_GROUNDING_REACTANCE_PU, DEFAULT_GROUPS_PER_UNIT,
};

/// Grounding-transformer model for the single-star bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleStar {
    /// Series groups per phase.
    pub series_groups: u32,
    /// Series elements per element group.
    pub elements_per_unit: u32,
    /// Series element groups per unit.
    pub groups_per_unit: u32,
    /// Failed elements in the affected group.
    pub failed: u32,
    /// Grounding-transformer reactance in per-unit.
    pub grounding_reactance: f64,
}

impl SingleStar {
    /// One parallel unit per phase, by construction.
    pub const UNITS_PER_PHASE: u32 = 1;
    /// The single unit is always the affected one.
    pub const UNITS_AFFECTED: u32 = 1;
}

/// Validate user input for this topology.
///
/// Only `S` and the grounding-transformer reactance `Xg` are user-settable.
/// `Pa` and `Pt` are fixed at 1: supplying either at any other value is a
/// validation error, and the grouping parameters `P`/`St` do not exist here.
pub(crate) fn validate(params: &ParameterSet) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let _ = require_count(params, param::S, &mut result);

    for name in [param::PA, param::PT] {
        if let Some(value) = params.get(name) {
            if value != 1.0 {
                result.error(format!(
                    "parameter '{name}' is fixed at 1 for the single-star arrangement, got {value}"
                ));
            }
        }
    }
    forbid(
        params,
        param::P,
        "a single star has no internal parallel groups to size",
        &mut result,
    );
    forbid(
        params,
        param::ST,
        "a single star has no bridge tie",
        &mut result,
    );

    if let Some(xg) = params.get(param::XG) {
        if !xg.is_finite() || xg <= 0.0 {
            result.error(format!(
                "parameter 'Xg' must be a positive grounding reactance, got {xg}"
            ));
        }
    }

    let n = optional_count(params, param::N, &mut result);
    let _ = optional_count(params, param::SU, &mut result);
    check_failed_count(params, n, param::N, &mut result);

    result
}

impl SingleStar {
    /// Build the model from a validated parameter set.
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        use crate::bank::Topology::SingleStarInternalFuses as T;
        for name in [param::PA, param::PT] {
            if let Some(value) = params.get(name) {
                if value != 1.0 {
                    return Err(BankError::invalid_parameter(
                        name,
                        format!("fixed at 1 for the single-star arrangement, got {value}"),
                    ));
                }
            }
        }
        let grounding_reactance = params.get_or(param::XG, DEFAULT_GROUNDING_REACTANCE_PU);
        if !grounding_reactance.is_finite() || grounding_reactance <= 0.0 {
            return Err(BankError::invalid_parameter(
                param::XG,
                format!("must be a positive grounding reactance, got {grounding_reactance}"),
            ));
        }
        let model = Self {
            series_groups: count(params, param::S, T)?,
            elements_per_unit: count_or(params, param::N, 1)?,
            groups_per_unit: count_or(params, param::SU, DEFAULT_GROUPS_PER_UNIT)?,
            failed: 0,
            grounding_reactance,
        };
        let failed = failed_count(params, model.elements_per_unit, param::N)?;
        Ok(Self { failed, ..model })
    }

    /// Neutral quantities at the configured failed-element count.
    pub fn quantities(&self) -> Result<NeutralQuantities> {
        self.quantities_at(self.failed)
    }

    /// Neutral quantities with `failed` elements gone in the affected group.
    pub fn quantities_at(&self, failed: u32) -> Result<NeutralQuantities> {
        let s = self.series_groups as f64;
        let (n, su, f) = (
            self.elements_per_unit as f64,
            self.groups_per_unit as f64,
            failed as f64,
        );

        // Single unit per phase: the unit equivalent is the group equivalent
        let ci = safe_div(n - f, n, "Ci")?;
        let cu = safe_div(su * ci, ci * (su - 1.0) + 1.0, "Cu")?;
        let cg = cu;
        let cs = safe_div(s * cg, cg * (s - 1.0) + 1.0, "Cs")?;
        let cp = cs;

        // Millman over the three phases and the grounding admittance
        let kg = safe_div(1.0, self.grounding_reactance, "1/Xg")?;
        let vn = safe_div(1.0 - cp, 2.0 + cp + kg, "Vn")?;
        let i_gt = vn * kg;

        let vln = 1.0 + vn;
        let vcu = safe_div(vln * cs, cg, "Vcu")?;
        let iu = vcu * cu;

        NeutralQuantities {
            neutral_current: i_gt,
            neutral_voltage: vn,
            unit_voltage: vcu,
            unit_current: iu,
        }
        .into_magnitudes()
    }

    /// Sweep failed elements over `0..N`.
    pub fn sweep(&self) -> Result<Vec<SweepPoint>> {
        (0..self.elements_per_unit)
            .map(|failed| {
                Ok(SweepPoint {
                    failed,
                    quantities: self.quantities_at(failed)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_only_s_is_required() {
        let params: ParameterSet = [("S", 4.0)].into_iter().collect();
        assert!(validate(&params).is_valid());
    }

    #[test]
    fn test_fixed_branch_counts_reject_overrides() {
        for (name, value) in [("Pa", 2.0), ("Pt", 3.0), ("Pa", 0.0)] {
            let mut params: ParameterSet = [("S", 4.0)].into_iter().collect();
            params.set(name, value);
            let result = validate(&params);
            assert!(!result.is_valid(), "{name}={value} should be rejected");
            assert!(result.errors[0].contains("fixed at 1"));
        }
    }

    #[test]
    fn test_fixed_values_themselves_pass() {
        let params: ParameterSet = [("S", 4.0), ("Pa", 1.0), ("Pt", 1.0)]
            .into_iter()
            .collect();
        assert!(validate(&params).is_valid());

        let q = SingleStar::from_params(&params).unwrap().quantities().unwrap();
        assert!(q.neutral_current.is_finite() && q.neutral_current >= 0.0);
        assert!(q.neutral_voltage.is_finite() && q.neutral_voltage >= 0.0);
    }

    #[test]
    fn test_grouping_parameters_are_forbidden() {
        let mut params: ParameterSet = [("S", 4.0)].into_iter().collect();
        params.set("P", 2.0);
        assert!(!validate(&params).is_valid());

        let mut params: ParameterSet = [("S", 4.0)].into_iter().collect();
        params.set("St", 2.0);
        assert!(!validate(&params).is_valid());
    }

    #[test]
    fn test_grounding_transformer_path() {
        let params: ParameterSet = [
            ("S", 4.0),
            ("N", 8.0),
            ("Su", 1.0),
            ("Xg", 2.0),
            ("F", 2.0),
        ]
        .into_iter()
        .collect();
        let q = SingleStar::from_params(&params).unwrap().quantities().unwrap();
        assert_relative_eq!(q.neutral_voltage, 2.2471910112359533e-2, max_relative = 1e-9);
        assert_relative_eq!(q.neutral_current, 1.1235955056179766e-2, max_relative = 1e-9);
        assert_relative_eq!(q.unit_voltage, 1.258426966292135, max_relative = 1e-9);
        assert_relative_eq!(q.unit_current, 0.9438202247191012, max_relative = 1e-9);
        // The transformer carries exactly the displacement over Xg
        assert_relative_eq!(q.neutral_current, q.neutral_voltage / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_balanced_star_rests_at_ground() {
        let params: ParameterSet = [("S", 4.0), ("Xg", 0.5)].into_iter().collect();
        let q = SingleStar::from_params(&params).unwrap().quantities().unwrap();
        assert_eq!(q.neutral_current, 0.0);
        assert_eq!(q.neutral_voltage, 0.0);
        assert_relative_eq!(q.unit_voltage, 1.0);
    }

    #[test]
    fn test_nonpositive_grounding_reactance_is_rejected() {
        let mut params: ParameterSet = [("S", 4.0)].into_iter().collect();
        params.set("Xg", 0.0);
        assert!(!validate(&params).is_valid());
        assert!(SingleStar::from_params(&params).is_err());
    }
}
