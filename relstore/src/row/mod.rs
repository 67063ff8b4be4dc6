//! The row model: column metadata, key/value partitioning, and the dirty
//! state tracked while a row is held open for update.

pub mod column;
pub mod row_info;
pub mod row_state;

pub use column::{AutoRange, Column, Direction, NullsOrder};
pub use row_info::RowInfo;
pub use row_state::{ColumnState, RowState};
