//! Public error taxonomy for this crate: one `thiserror`-derived enum per
//! subsystem, each with a catch-all `Failure` variant wrapping an
//! `error_stack::Report<InternalError>` chain, mirroring
//! `core/src/error/mod.rs`'s public/internal split.

pub mod internal;

pub(crate) use internal::AnyhowWrapper;

use error_stack::Report;
use thiserror::Error;

/// Marker context for errors that cross a public function boundary; the
/// real error chain lives in the `Report` itself.
#[derive(Debug, Error)]
#[error("internal error")]
pub struct InternalError;

/// Errors raised by `row` (Column/RowInfo/RowState) and `codec` operations.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("column '{column}' is not set")]
    NotSet { column: String },

    #[error("duplicate column '{0}' in row info")]
    DuplicateColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error(transparent)]
    Conversion(#[from] relquery::ConversionError),

    #[error("codec error on column '{column}': {reason}")]
    Codec { column: String, reason: String },

    #[error("{0:?}")]
    Failure(Report<InternalError>),
}

impl RowError {
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Failure(report) => Some(format!("{report:?}")),
            _ => None,
        }
    }
}

/// Errors raised by the planner (index selection, range extraction,
/// mapping/projection composition).
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("attempted write through an unmodifiable view")]
    UnmodifiableView,

    #[error("projection cannot be inverted for this load")]
    ViewConstraint,

    #[error("no index covers the requested columns")]
    NoViableIndex,

    #[error(transparent)]
    Filter(#[from] relquery::FilterError),

    #[error(transparent)]
    Row(#[from] RowError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("{0:?}")]
    Failure(Report<InternalError>),
}

impl PlanError {
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Failure(report) => Some(format!("{report:?}")),
            _ => None,
        }
    }
}

/// Errors raised by predicate-lock acquisition/release.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("predicate lock acquisition timed out")]
    Timeout,

    #[error("deadlock avoided: row lock released to re-acquire in predicate-lock order")]
    Retry,

    #[error("row changed between acquire and validate, transaction must retry")]
    Stale,
}

/// Errors raised by the storage-engine boundary (§4.10).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("index or bucket closed")]
    Closed,

    #[error("key not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(#[from] internal::BackendError),

    #[error("{0:?}")]
    Failure(Report<InternalError>),
}

impl From<anyhow::Error> for StorageError {
    fn from(err: anyhow::Error) -> Self { StorageError::Failure(Report::new(AnyhowWrapper::from(err)).change_context(InternalError)) }
}

impl StorageError {
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Failure(report) => Some(format!("{report:?}")),
            _ => None,
        }
    }
}
