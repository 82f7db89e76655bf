//! Error types for the capacitor-bank unbalance engine.
//!
//! This module provides a unified error type [`BankError`] for the
//! programming-contract tier: unrecognized topology keys and parameter sets
//! that reach the calculator in a state validation would have rejected.
//! Expected input problems are never errors; they surface as a failed
//! [`crate::ValidationResult`].

use thiserror::Error;

/// Result type alias using [`BankError`].
pub type Result<T> = std::result::Result<T, BankError>;

/// Unified error type for all engine operations.
#[derive(Error, Debug)]
pub enum BankError {
    // ============ Topology Resolution Errors ============
    /// Unrecognized topology key
    #[error("Unknown topology '{key}' (expected one of: double_star_internal_fuses, double_star_external_fuses, h_bridge_internal_fuses, single_star_internal_fuses)")]
    UnknownTopology { key: String },

    // ============ Calculator Precondition Errors ============
    /// A required parameter was absent when the calculator ran
    #[error("Missing parameter '{name}' - parameter set was not validated for {topology}")]
    MissingParameter { name: String, topology: String },

    /// A parameter value violates a calculator precondition
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    // ============ Numerical Errors ============
    /// A formula denominator collapsed to zero
    #[error("Zero denominator in {expression} - inconsistent parameter combination")]
    DivisionByZero { expression: String },

    /// A computed quantity was not finite
    #[error("Non-finite result for {quantity} - inconsistent parameter combination")]
    NonFiniteResult { quantity: String },
}

impl BankError {
    /// Create an unknown-topology error
    pub fn unknown_topology(key: impl Into<String>) -> Self {
        Self::UnknownTopology { key: key.into() }
    }

    /// Create a missing-parameter error
    pub fn missing_parameter(name: impl Into<String>, topology: impl Into<String>) -> Self {
        Self::MissingParameter {
            name: name.into(),
            topology: topology.into(),
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a division-by-zero error
    pub fn division_by_zero(expression: impl Into<String>) -> Self {
        Self::DivisionByZero {
            expression: expression.into(),
        }
    }
}
