//! Double star with internal fuses (IEEE C37.99 Table 7).
//!
//! Internal fuses isolate single failed elements inside a unit, so the model
//! starts at the element group: `N` series elements per group, `Su` groups
//! per unit, `P` units per fused parallel group, `Pa` units in the affected
//! star branch, `Pt` units per phase, `S` series groups per phase. The
//! neutral quantities follow from the equivalent phase capacitance of the
//! branch carrying the failures.

use crate::bank::{
    check_failed_count, check_grounding_flag, optional_count, param, require_count, ParameterSet,
    ValidationResult,
};
use crate::error::Result;

use super::{
    count, count_or, failed_count, grounding_flag, safe_div, NeutralQuantities, SweepPoint,
    DEFAULT_GROUPS_PER_UNIT,
};

/// Table 7 model for the internal-fuse double star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleStarInternal {
    /// Series groups per phase.
    pub series_groups: u32,
    /// Total parallel units per phase.
    pub units_per_phase: u32,
    /// Parallel units in the affected branch.
    pub units_affected: u32,
    /// Units per internal-fuse parallel group.
    pub units_per_group: u32,
    /// Series elements per element group.
    pub elements_per_unit: u32,
    /// Series element groups per unit.
    pub groups_per_unit: u32,
    /// Failed elements in the affected group.
    pub failed: u32,
    /// 0.0 = grounded, 1.0 = ungrounded.
    pub grounding: f64,
}

/// Validate user input for this topology.
///
/// Requires `Pa`, `P`, `Pt`, `S`, all positive integers, with `Pa` an exact
/// multiple of `P` (the internal-fuse grouping assumption) and at least one
/// unit left in the right star branch.
pub(crate) fn validate(params: &ParameterSet) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let pa = require_count(params, param::PA, &mut result);
    let p = require_count(params, param::P, &mut result);
    let pt = require_count(params, param::PT, &mut result);
    let _ = require_count(params, param::S, &mut result);

    if let (Some(pa), Some(p)) = (pa, p) {
        if pa % p != 0 {
            result.error(format!(
                "Pa must be an integer multiple of P: Pa/P = {pa}/{p} = {}",
                pa as f64 / p as f64
            ));
        }
    }
    if let (Some(pa), Some(pt)) = (pa, pt) {
        if pa > pt {
            result.error(format!("Pa ({pa}) must not exceed Pt ({pt})"));
        } else if pt - pa < 1 {
            result.error(format!(
                "the right star branch would keep Pt-Pa = {} units (< 1)",
                pt - pa
            ));
        }
    }

    let n = optional_count(params, param::N, &mut result);
    let _ = optional_count(params, param::SU, &mut result);
    check_failed_count(params, n, param::N, &mut result);
    check_grounding_flag(params, &mut result);

    result
}

impl DoubleStarInternal {
    /// Build the model from a validated parameter set.
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        use crate::bank::Topology::DoubleStarInternalFuses as T;
        let model = Self {
            series_groups: count(params, param::S, T)?,
            units_per_phase: count(params, param::PT, T)?,
            units_affected: count(params, param::PA, T)?,
            units_per_group: count(params, param::P, T)?,
            elements_per_unit: count_or(params, param::N, 1)?,
            groups_per_unit: count_or(params, param::SU, DEFAULT_GROUPS_PER_UNIT)?,
            failed: 0,
            grounding: grounding_flag(params)?,
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
        let (s, pt, pa, p) = (
            self.series_groups as f64,
            self.units_per_phase as f64,
            self.units_affected as f64,
            self.units_per_group as f64,
        );
        let (n, su, f, g) = (
            self.elements_per_unit as f64,
            self.groups_per_unit as f64,
            failed as f64,
            self.grounding,
        );

        // Element group -> unit -> fused group -> string -> phase ladder
        let ci = safe_div(n - f, n, "Ci")?;
        let cu = safe_div(su * ci, ci * (su - 1.0) + 1.0, "Cu")?;
        let cg = safe_div(p - 1.0 + cu, p, "Cg")?;
        let cs = safe_div(s * cg, cg * (s - 1.0) + 1.0, "Cs")?;
        let cp = safe_div(cs * p + (pt - p), pt, "Cp")?;

        let vng = g * (safe_div(3.0, 2.0 + cp, "Vng")? - 1.0);
        let vln = 1.0 + vng;
        let vcu = safe_div(vln * cs, cg, "Vcu")?;
        let iu = vcu * cu;

        let iph = cp * vln;
        let ig = (1.0 - g) * (1.0 - iph);
        let i_tie = safe_div(3.0 * vng * g * (pt - pa), pt, "In")?;

        NeutralQuantities {
            neutral_current: if g == 0.0 { ig } else { i_tie },
            neutral_voltage: vng,
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

    fn table7_params() -> ParameterSet {
        [
            ("S", 4.0),
            ("Pt", 11.0),
            ("Pa", 6.0),
            ("P", 3.0),
            ("N", 14.0),
            ("Su", 3.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_validation_accepts_even_grouping() {
        let params: ParameterSet = [("S", 4.0), ("Pt", 11.0), ("Pa", 6.0), ("P", 2.0)]
            .into_iter()
            .collect();
        assert!(validate(&params).is_valid());
    }

    #[test]
    fn test_validation_rejects_uneven_grouping() {
        // Pa/P = 6/4 = 1.5 is not an integer group count
        let params: ParameterSet = [("S", 4.0), ("Pt", 11.0), ("Pa", 6.0), ("P", 4.0)]
            .into_iter()
            .collect();
        let result = validate(&params);
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("6/4"));
        assert!(result.errors[0].contains("1.5"));
    }

    #[test]
    fn test_validation_names_each_missing_parameter() {
        let result = validate(&ParameterSet::new());
        assert!(!result.is_valid());
        for name in ["Pa", "P", "Pt", "S"] {
            assert!(
                result.errors.iter().any(|e| e.contains(name)),
                "no diagnostic names '{name}'"
            );
        }
    }

    #[test]
    fn test_validation_keeps_right_branch_populated() {
        let params: ParameterSet = [("S", 4.0), ("Pt", 6.0), ("Pa", 6.0), ("P", 3.0)]
            .into_iter()
            .collect();
        let result = validate(&params);
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("Pt-Pa"));
    }

    #[test]
    fn test_balanced_bank_has_no_unbalance() {
        let model = DoubleStarInternal::from_params(&table7_params()).unwrap();
        let q = model.quantities().unwrap();
        assert_eq!(q.neutral_current, 0.0);
        assert_eq!(q.neutral_voltage, 0.0);
        assert_relative_eq!(q.unit_voltage, 1.0);
        assert_relative_eq!(q.unit_current, 1.0);
    }

    #[test]
    fn test_table7_single_failed_element_ungrounded() {
        let mut params = table7_params();
        params.set("F", 1.0).set("G", 1.0);
        let q = DoubleStarInternal::from_params(&params)
            .unwrap()
            .quantities()
            .unwrap();
        assert_relative_eq!(q.neutral_current, 2.5993830797488293e-4, max_relative = 1e-9);
        assert_relative_eq!(q.neutral_voltage, 1.9062142584824748e-4, max_relative = 1e-9);
        assert_relative_eq!(q.unit_voltage, 1.0064811284788409, max_relative = 1e-9);
        assert_relative_eq!(q.unit_current, 0.9813191002668699, max_relative = 1e-9);
    }

    #[test]
    fn test_table7_grounded_routes_to_ground_current() {
        let mut params = table7_params();
        params.set("F", 1.0).set("G", 0.0);
        let q = DoubleStarInternal::from_params(&params)
            .unwrap()
            .quantities()
            .unwrap();
        // Grounded: no neutral displacement, unbalance shows in the ground path
        assert_eq!(q.neutral_voltage, 0.0);
        assert_relative_eq!(q.neutral_current, 5.717552887364308e-4, max_relative = 1e-9);
        assert_relative_eq!(q.unit_voltage, 1.0062893081761006, max_relative = 1e-9);
    }

    #[test]
    fn test_failed_count_requires_element_model() {
        // F > 0 without N cannot be sized
        let mut params = table7_params();
        params.set("F", 1.0);
        let mut bare: ParameterSet = [("S", 4.0), ("Pt", 11.0), ("Pa", 6.0), ("P", 3.0)]
            .into_iter()
            .collect();
        bare.set("F", 1.0);
        assert!(DoubleStarInternal::from_params(&bare).is_err());
        assert!(DoubleStarInternal::from_params(&params).is_ok());
    }
}
