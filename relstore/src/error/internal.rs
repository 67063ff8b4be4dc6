//! Internal error types: not exposed at public API boundaries, they exist
//! to give `error_stack::Report` chains a typed bottom before a public enum
//! wraps them in a `Failure` variant.

use thiserror::Error;

/// Wrapper so `anyhow::Error` (used by the storage engine trait, per the
/// teacher's own `StorageEngine::bucket` signature) can be folded into an
/// `error_stack::Report` chain.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AnyhowWrapper(String);

impl From<anyhow::Error> for AnyhowWrapper {
    fn from(err: anyhow::Error) -> Self { AnyhowWrapper(format!("{err:#}")) }
}

#[derive(Debug, Error)]
#[error("backend error: {0}")]
pub struct BackendError(pub String);
