//! H-bridge with internal fuses (IEEE C37.99 Table 8).
//!
//! The bridge tie splits each phase at `St` of `S` series groups and carries
//! the bridge-arm current `Ih`. The arm ratio amplifies small capacitance
//! deviations, so a single failed element produces a larger observable
//! current than in a double star of comparable size; the balanced case
//! cancels exactly (`Vh = St/S`).

use crate::bank::{
    check_failed_count, check_grounding_flag, optional_count, param, require_count, ParameterSet,
    ValidationResult,
};
use crate::error::{BankError, Result};

use super::{
    count, count_or, failed_count, grounding_flag, safe_div, NeutralQuantities, SweepPoint,
    DEFAULT_GROUPS_PER_UNIT,
};

/// Table 8 model for the internal-fuse H-bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HBridge {
    /// Series groups per phase.
    pub series_groups: u32,
    /// Series groups below the bridge tie.
    pub series_below_tie: u32,
    /// Total parallel units per phase.
    pub units_per_phase: u32,
    /// Parallel units in the affected arm.
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
/// Bridge-arm structural checks, distinct from the double-star rules: the
/// tie must sit strictly inside the series string (`1 <= St <= S-1`), the
/// affected arm strictly inside the phase (`1 <= Pa <= Pt-1`), and the
/// grouping must fill both arms (`Pa >= P`, `Pt >= 2*P`).
pub(crate) fn validate(params: &ParameterSet) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let pt = require_count(params, param::PT, &mut result);
    let pa = require_count(params, param::PA, &mut result);
    let p = require_count(params, param::P, &mut result);
    let s = require_count(params, param::S, &mut result);
    let st = require_count(params, param::ST, &mut result);

    if let Some(s) = s {
        if s < 2 {
            result.error(format!("S must be >= 2 to place a bridge tie, got {s}"));
        }
        if let Some(st) = st {
            if st < 1 || st > s - 1 {
                result.error(format!("St must satisfy 1 <= St <= S-1, got St={st}, S={s}"));
            }
        }
    }
    if let (Some(pa), Some(pt)) = (pa, pt) {
        if pa >= pt {
            result.error(format!("Pa must satisfy 1 <= Pa <= Pt-1, got Pa={pa}, Pt={pt}"));
        }
    }
    if let (Some(pa), Some(p)) = (pa, p) {
        if pa < p {
            result.error(format!("Pa ({pa}) must be at least the group size P ({p})"));
        } else if pa == p {
            result.warning("Pa == P: the affected arm collapses to a single group".to_string());
        }
    }
    if let (Some(pt), Some(p)) = (pt, p) {
        if pt < 2 * p {
            result.error(format!("Pt ({pt}) must be at least 2*P ({})", 2 * p));
        } else if (pt / p) % 2 != 0 {
            result.warning(format!(
                "Pt/P = {} is odd: the arms split asymmetrically",
                pt / p
            ));
        }
    }

    let n = optional_count(params, param::N, &mut result);
    let _ = optional_count(params, param::SU, &mut result);
    check_failed_count(params, n, param::N, &mut result);
    check_grounding_flag(params, &mut result);

    result
}

impl HBridge {
    /// Build the model from a validated parameter set.
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        use crate::bank::Topology::HBridgeInternalFuses as T;
        let series_groups = count(params, param::S, T)?;
        let series_below_tie = count(params, param::ST, T)?;
        if series_below_tie >= series_groups {
            return Err(BankError::invalid_parameter(
                param::ST,
                format!("must be smaller than S ({series_groups}), got {series_below_tie}"),
            ));
        }
        let model = Self {
            series_groups,
            series_below_tie,
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
        let (s, st, pt, pa, p) = (
            self.series_groups as f64,
            self.series_below_tie as f64,
            self.units_per_phase as f64,
            self.units_affected as f64,
            self.units_per_group as f64,
        );
        let (f, g) = (failed as f64, self.grounding);

        // Balanced reference for the line-voltage shift
        let cp0 = self.phase_capacitance(0.0)?;
        let (cu, chn, cp) = self.ladder(f)?;

        let vln = 1.0 + g * (safe_div(3.0, 2.0 + safe_div(cp, cp0, "Cp/Cp0")?, "Vln")? - 1.0);
        let vh = safe_div(cp, chn, "Vh")?;

        // Arm-ratio amplification: any departure of Vh from St/S drives Ih
        let ih = -vln
            * (st / s - vh)
            * (safe_div(1.0, s - st, "1/(S-St)")? + safe_div(1.0, st, "1/St")?)
            * safe_div(s * (pt - pa), pt, "S(Pt-Pa)/Pt")?;

        let vcu = safe_div(
            vln * vh * p * s,
            p + (st - 1.0) * (cu + p - 1.0),
            "Vcu",
        )?;
        let iu = vcu * cu;

        NeutralQuantities {
            neutral_current: ih,
            neutral_voltage: vln - 1.0,
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

    /// Element group -> unit -> bridge section -> phase equivalents.
    fn ladder(&self, f: f64) -> Result<(f64, f64, f64)> {
        let (s, st, pt, p) = (
            self.series_groups as f64,
            self.series_below_tie as f64,
            self.units_per_phase as f64,
            self.units_per_group as f64,
        );
        let (n, su) = (self.elements_per_unit as f64, self.groups_per_unit as f64);

        let cu = safe_div(su * (n - f), (n - f) * (su - 1.0) + n, "Cu")?;
        let chn = safe_div((cu + p - 1.0) * p, (cu + p - 1.0) * (st - 1.0) + p, "Chn")?
            + safe_div(pt - p, st, "(Pt-P)/St")?;
        let cp = safe_div(chn * pt, chn * (s - st) + pt, "Cp")?;
        Ok((cu, chn, cp))
    }

    fn phase_capacitance(&self, f: f64) -> Result<f64> {
        self.ladder(f).map(|(_, _, cp)| cp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table8_params() -> ParameterSet {
        [
            ("S", 7.0),
            ("St", 3.0),
            ("Pt", 9.0),
            ("Pa", 5.0),
            ("P", 2.0),
            ("N", 16.0),
            ("Su", 3.0),
            ("G", 0.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_validation_accepts_reference_bridge() {
        let result = validate(&table8_params());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_tie_must_sit_inside_the_string() {
        for st in [7.0, 9.0] {
            let mut params = table8_params();
            params.set("St", st);
            let result = validate(&params);
            assert!(!result.is_valid(), "St={st} should be rejected");
            assert!(result.errors[0].contains("St"));
        }
    }

    #[test]
    fn test_arm_grouping_checks() {
        let mut params = table8_params();
        params.set("Pa", 1.0); // Pa < P
        assert!(!validate(&params).is_valid());

        let mut params = table8_params();
        params.set("P", 5.0); // Pt < 2*P
        assert!(!validate(&params).is_valid());
    }

    #[test]
    fn test_collapsed_arm_is_a_warning_not_an_error() {
        let mut params = table8_params();
        params.set("Pa", 2.0); // Pa == P
        let result = validate(&params);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("Pa == P")));
    }

    #[test]
    fn test_balanced_bridge_cancels() {
        let q = HBridge::from_params(&table8_params())
            .unwrap()
            .quantities()
            .unwrap();
        // Vh = St/S exactly at f = 0, so the arm current cancels
        assert!(q.neutral_current < 1e-12);
        assert_relative_eq!(q.unit_voltage, 1.0, max_relative = 1e-12);
        assert_relative_eq!(q.unit_current, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_table8_single_failed_element() {
        let mut params = table8_params();
        params.set("F", 1.0);
        let q = HBridge::from_params(&params).unwrap().quantities().unwrap();
        assert_relative_eq!(q.neutral_current, 3.60624911453728e-4, max_relative = 1e-9);
        assert_relative_eq!(q.unit_voltage, 1.007766315057378, max_relative = 1e-9);
        assert_relative_eq!(q.unit_current, 0.9858583516865653, max_relative = 1e-9);
        // Grounded bridge: the line-to-neutral voltage does not shift
        assert_eq!(q.neutral_voltage, 0.0);
    }

    #[test]
    fn test_table8_ungrounded_shifts_line_voltage() {
        let mut params = table8_params();
        params.set("F", 1.0).set("G", 1.0);
        let q = HBridge::from_params(&params).unwrap().quantities().unwrap();
        assert_relative_eq!(q.neutral_current, 3.6066671819050684e-4, max_relative = 1e-9);
        assert_relative_eq!(q.neutral_voltage, 1.1592858799e-4, max_relative = 1e-6);
        assert_relative_eq!(q.unit_voltage, 1.0078831439833065, max_relative = 1e-9);
    }

    #[test]
    fn test_one_failed_element_strictly_increases_arm_current() {
        let balanced = HBridge::from_params(&table8_params())
            .unwrap()
            .quantities()
            .unwrap();
        let mut params = table8_params();
        params.set("F", 1.0);
        let unbalanced = HBridge::from_params(&params).unwrap().quantities().unwrap();
        assert!(unbalanced.neutral_current > balanced.neutral_current);

        // And the trend continues with further failures
        params.set("F", 2.0);
        let worse = HBridge::from_params(&params).unwrap().quantities().unwrap();
        assert!(worse.neutral_current > unbalanced.neutral_current);
        assert_relative_eq!(
            worse.neutral_current,
            7.604769276732936e-4,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_equal_series_split_is_a_contract_error() {
        // S == St bypassing validation must fail the compute call, not NaN
        let mut params = table8_params();
        params.set("St", 7.0);
        assert!(HBridge::from_params(&params).is_err());
    }
}
