//! Filter algebra, value model, and query-spec types for a relational
//! query/storage core built atop an ordered key/value store.
//!
//! This crate owns the symbolic side of query compilation: a boolean
//! predicate tree over column names (`filter`), the closed value type system
//! used for arguments and embedded constants (`value`), and the small spec
//! struct an external parser (or a programmatic builder) hands to the
//! planner (`query_spec`). It does not parse text and does not touch bytes
//! on disk — see `relstore` for codecs, range extraction and execution.

pub mod collation;
pub mod error;
pub mod filter;
pub mod query_spec;
pub mod value;

pub use error::{ConversionError, FilterError};
pub use filter::{Filter, Op};
pub use query_spec::{Projection, QuerySpec};
pub use value::{Value, ValueType};
