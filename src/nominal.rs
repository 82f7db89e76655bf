//! Bank ratings and per-unit to SI conversion.
//!
//! The engine works in per-unit throughout; reporting collaborators usually
//! want amperes and volts. [`BankRatings`] captures the three-phase
//! nameplate of the bank, [`BankRatings::base_quantities`] derives the base
//! values for a star-connected bank, and
//! [`NeutralQuantities::to_si`](crate::NeutralQuantities::to_si) scales an
//! engine result onto those bases.

use serde::Serialize;

use crate::error::{BankError, Result};
use crate::topologies::NeutralQuantities;
use crate::SQRT_3;

/// Three-phase nameplate ratings of a capacitor bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BankRatings {
    /// Line-to-line voltage in volts.
    pub line_voltage: f64,
    /// Three-phase reactive power in VAr.
    pub reactive_power: f64,
    /// System frequency in Hz.
    pub frequency: f64,
}

/// Base quantities for a star-connected three-phase bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseQuantities {
    /// Phase (line-to-neutral) voltage in volts.
    pub phase_voltage: f64,
    /// Rated bank line current in amperes.
    pub bank_current: f64,
    /// Equivalent phase capacitance in farads.
    pub phase_capacitance: f64,
    /// Capacitance of one unit in farads.
    pub unit_capacitance: f64,
    /// Rated voltage across one unit in volts.
    pub unit_voltage: f64,
    /// Rated current through one unit in amperes.
    pub unit_current: f64,
}

/// An engine result scaled to SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeutralQuantitiesSi {
    /// Neutral-path current in amperes.
    pub neutral_current: f64,
    /// Neutral displacement voltage in volts.
    pub neutral_voltage: f64,
    /// Voltage across the worst-stressed unit in volts.
    pub unit_voltage: f64,
    /// Current through the worst-stressed unit in amperes.
    pub unit_current: f64,
}

impl BankRatings {
    /// Derive the per-unit bases for a bank of `series_groups` series groups
    /// and `units_per_phase` parallel units per phase.
    pub fn base_quantities(
        &self,
        series_groups: u32,
        units_per_phase: u32,
    ) -> Result<BaseQuantities> {
        for (name, value) in [
            ("line_voltage", self.line_voltage),
            ("reactive_power", self.reactive_power),
            ("frequency", self.frequency),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BankError::invalid_parameter(
                    name,
                    format!("must be positive, got {value}"),
                ));
            }
        }
        if series_groups == 0 || units_per_phase == 0 {
            return Err(BankError::invalid_parameter(
                "series_groups/units_per_phase",
                "must be positive counts",
            ));
        }
        let s = series_groups as f64;
        let pt = units_per_phase as f64;

        let phase_voltage = self.line_voltage / SQRT_3;
        let bank_current = self.reactive_power / (SQRT_3 * self.line_voltage);
        let phase_capacitance = (self.reactive_power / 3.0)
            / (2.0 * std::f64::consts::PI * self.frequency * phase_voltage * phase_voltage);

        Ok(BaseQuantities {
            phase_voltage,
            bank_current,
            phase_capacitance,
            unit_capacitance: phase_capacitance * s / pt,
            unit_voltage: phase_voltage / s,
            unit_current: bank_current / pt,
        })
    }
}

impl NeutralQuantities {
    /// Scale this per-unit result onto SI bases.
    pub fn to_si(&self, base: &BaseQuantities) -> NeutralQuantitiesSi {
        NeutralQuantitiesSi {
            neutral_current: self.neutral_current * base.bank_current,
            neutral_voltage: self.neutral_voltage * base.phase_voltage,
            unit_voltage: self.unit_voltage * base.unit_voltage,
            unit_current: self.unit_current * base.unit_current,
        }
    }
}
