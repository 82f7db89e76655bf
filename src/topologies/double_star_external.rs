//! Double star with external fuses (IEEE C37.99 Table 3).
//!
//! An external fuse removes the whole unit, so the model is coarser than the
//! internal-fuse ladder: failures are counted in whole units out of the `Pa`
//! parallel units of the affected branch, and there is no element-group or
//! fused-group level. `P` does not exist in this arrangement; supplying it
//! is a validation error, not a silently ignored value.

use crate::bank::{
    check_failed_count, check_grounding_flag, forbid, param, require_count, ParameterSet,
    ValidationResult,
};
use crate::error::Result;

use super::{
    count, failed_count, grounding_flag, safe_div, NeutralQuantities, SweepPoint, MIN_DENOMINATOR,
};

/// Table 3 model for the external-fuse double star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleStarExternal {
    /// Series groups per phase.
    pub series_groups: u32,
    /// Total parallel units per phase.
    pub units_per_phase: u32,
    /// Parallel units in the affected branch.
    pub units_affected: u32,
    /// Failed (fuse-removed) units in the affected branch.
    pub failed: u32,
    /// 0.0 = grounded, 1.0 = ungrounded.
    pub grounding: f64,
}

/// Validate user input for this topology.
///
/// Requires `Pa`, `Pt`, `S`; rejects `P`, `N`, and `Su` outright since
/// external fuses remove the grouping concept those parameters encode.
pub(crate) fn validate(params: &ParameterSet) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let pa = require_count(params, param::PA, &mut result);
    let pt = require_count(params, param::PT, &mut result);
    let _ = require_count(params, param::S, &mut result);

    forbid(
        params,
        param::P,
        "external fuses have no internal parallel groups",
        &mut result,
    );
    forbid(
        params,
        param::N,
        "external fuses remove whole units, not elements",
        &mut result,
    );
    forbid(
        params,
        param::SU,
        "external fuses remove whole units, not element groups",
        &mut result,
    );

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

    check_failed_count(params, pa, param::PA, &mut result);
    check_grounding_flag(params, &mut result);

    result
}

impl DoubleStarExternal {
    /// Build the model from a validated parameter set.
    pub fn from_params(params: &ParameterSet) -> Result<Self> {
        use crate::bank::Topology::DoubleStarExternalFuses as T;
        let units_affected = count(params, param::PA, T)?;
        Ok(Self {
            series_groups: count(params, param::S, T)?,
            units_per_phase: count(params, param::PT, T)?,
            units_affected,
            failed: failed_count(params, units_affected, param::PA)?,
            grounding: grounding_flag(params)?,
        })
    }

    /// Neutral quantities at the configured failed-unit count.
    pub fn quantities(&self) -> Result<NeutralQuantities> {
        self.quantities_at(self.failed)
    }

    /// Neutral quantities with `failed` units removed from the affected branch.
    pub fn quantities_at(&self, failed: u32) -> Result<NeutralQuantities> {
        let (s, pt, pa) = (
            self.series_groups as f64,
            self.units_per_phase as f64,
            self.units_affected as f64,
        );
        let (n, g) = (failed as f64, self.grounding);

        // Group-level model: the affected group simply loses n of Pa units
        let cg = safe_div(pa - n, pa, "Cg")?;
        let cs = safe_div(s * cg, cg * (s - 1.0) + 1.0, "Cs")?;
        let cp = safe_div(cs * pa + (pt - pa), pt, "Cp")?;

        let vng = g * (safe_div(3.0, 2.0 + cp, "Vng")? - 1.0);
        let vln = 1.0 + vng;
        // With every unit in the group gone, the string voltage lands on
        // the remaining series groups
        let vcu = if cg.abs() < MIN_DENOMINATOR {
            vln * s
        } else {
            safe_div(vln * cs, cg, "Vcu")?
        };
        // Remaining units are healthy: per-unit capacitance stays 1.0
        let iu = vcu;

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

    /// Sweep failed units over `0..Pa`.
    pub fn sweep(&self) -> Result<Vec<SweepPoint>> {
        (0..self.units_affected)
            .map(|failed| {
                Ok(SweepPoint {
                    failed,
                    quantities: self.quantities_at(failed)?,
                })
            })
            .collect()
    }
}
