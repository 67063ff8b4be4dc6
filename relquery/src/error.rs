use crate::value::ValueType;
use thiserror::Error;

/// Raised when an exact conversion would lose information; always names the
/// column so callers can surface a precise diagnostic.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("conversion of column '{column}' from {from:?} to {to:?} would lose information")]
pub struct ConversionError {
    pub column: String,
    pub from: ValueType,
    pub to: ValueType,
}

/// Filter reduction or normal-form conversion exceeded its complexity budget.
/// Callers may catch this and fall back to the unreduced filter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("filter exceeded complexity budget after {steps} steps")]
pub struct FilterError {
    pub steps: u64,
}
