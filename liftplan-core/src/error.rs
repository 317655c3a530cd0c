//! Validation errors raised when a plan is written.
//!
//! Reads never fail with these: degenerate plans resolve to empty values.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("rotation must name at least one variant")]
    EmptyRotation,

    #[error("rotation key '{key}' is not a variant of split {split_id}")]
    UnknownRotationKey { split_id: String, key: String },

    #[error("split not found: {0}")]
    SplitNotFound(String),

    #[error("split '{0}' needs at least one variant")]
    NoVariants(String),

    #[error("variant key '{0}' is used twice in the same split")]
    DuplicateVariantKey(String),

    #[error("invalid variant key '{0}' (expected a short ASCII name like \"A\")")]
    InvalidVariantKey(String),
}
