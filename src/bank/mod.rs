//! Bank topology and parameter representation, plus validation.
//!
//! This module provides the input side of the engine: the closed set of
//! supported bank arrangements ([`Topology`]), the named parameter map
//! supplied by the front end ([`ParameterSet`]), and the per-topology
//! validation rules ([`validate`]).

mod types;
mod validate;

pub use types::{param, ParameterSet, Topology};
pub use validate::{validate, ValidationResult};

pub(crate) use validate::{
    check_failed_count, check_grounding_flag, forbid, optional_count, require_count,
};
