//! # Capbank Core
//!
//! A steady-state unbalance engine for shunt capacitor banks per
//! IEEE Std C37.99-2012.
//!
//! This library provides:
//! - Topology-specific validation of bank parameter sets
//! - Neutral current (In) and neutral voltage (Vn) calculation for
//!   double-star, H-bridge, and single-star arrangements
//! - Failed-element sweeps producing the full per-unit unbalance table
//! - Conversion of per-unit results to SI quantities from bank ratings
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`bank`] - Topology and parameter-set representation, validation
//! - [`topologies`] - Per-topology unbalance formulas and dispatch
//! - [`nominal`] - Bank ratings and per-unit to SI conversion
//!
//! ## Usage
//!
//! ```
//! use capbank_core::{compute, validate, ParameterSet, Topology};
//!
//! let mut params = ParameterSet::new();
//! params.set("S", 4.0);
//! params.set("Pt", 11.0);
//! params.set("Pa", 6.0);
//! params.set("P", 3.0);
//!
//! let topology = Topology::DoubleStarInternalFuses;
//! let verdict = validate(topology, &params);
//! assert!(verdict.is_valid());
//!
//! let quantities = compute(topology, &params).unwrap();
//! assert!(quantities.neutral_current.is_finite());
//! ```
//!
//! ## Calculation method
//!
//! Each topology implements the closed-form per-unit ladder from the
//! corresponding IEEE C37.99 unbalance table: the affected element group's
//! capacitance is propagated through unit, group, string, and phase
//! equivalents, and the neutral shift follows from the resulting phase
//! susceptance imbalance. Grounded banks report the ground-path current,
//! ungrounded banks the neutral tie current, the H-bridge the bridge-arm
//! current, and the single-star bank the grounding-transformer current.
//!
//! All operations are pure functions of (Topology, ParameterSet): no shared
//! state, no caching, safe to call concurrently.

pub mod bank;
pub mod error;
pub mod nominal;
pub mod topologies;

// Re-export main types for convenience
pub use bank::{validate, ParameterSet, Topology, ValidationResult};
pub use error::{BankError, Result};
pub use nominal::{BankRatings, BaseQuantities, NeutralQuantitiesSi};
pub use topologies::{compute, sweep, NeutralQuantities, SweepPoint};

/// Square root of three, used throughout line/phase voltage conversions.
pub const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Default system frequency in Hz.
pub const DEFAULT_FREQUENCY_HZ: f64 = 60.0;
