//! The error model for the crate.
//!
//! Only two kinds of failure can ever propagate out of a public entry point:
//! invalid construction (`Input`) and arithmetic that could not maintain its
//! scale guarantees (`Precision`). A third kind, `Guard`, is raised only when
//! a caller opts in to `throw_on_guard_limit` and a search guard is tripped;
//! otherwise guard state travels out-of-band via a `GuardReport`.
//!
//! A fourth conceptual kind, "infeasible", is deliberately not a variant
//! here: the core treats the absence of a viable path as an empty result,
//! never as an error. Callers that want "infeasible" semantics can derive it
//! themselves from an empty `results` vector.

use crate::guard::GuardReport;
use thiserror::Error;

/// The crate's single fallible-result error type.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Raised eagerly at construction boundaries: negative amounts, empty
    /// currencies, `min > max` bounds, malformed numeric strings, hop or
    /// guard limits below 1, tolerance windows outside `[0, 1)`, currency
    /// mismatches, and non-contiguous path hops.
    #[error("invalid input: {0}")]
    Input(String),

    /// Raised from the arithmetic layer when a scale guarantee cannot be
    /// honored: division by zero, a requested scale beyond `MAX_SCALE`, or a
    /// result that cannot be represented at the working precision.
    #[error("precision error: {0}")]
    Precision(String),

    /// Raised only when `throw_on_guard_limit` is set and a configured
    /// guard limit (expansions, visited states, or wall clock) was reached
    /// during search. Carries the report that would otherwise have been
    /// returned alongside partial results.
    #[error("guard limit reached during search: {0:?}")]
    Guard(GuardReport),
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;
