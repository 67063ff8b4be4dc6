//! Row/column model, codecs, range extraction, query planning, scan and
//! update concurrency, triggers, aggregation and mapping over an embedded
//! ordered key/value store. See `relquery` for the filter algebra and
//! value model this crate plans and executes against.

pub mod aggregate;
pub mod codec;
pub mod collation;
pub mod error;
pub mod mapping;
pub mod plan;
pub mod range;
pub mod row;
pub mod row_codec;
pub mod scan;
pub mod storage;
pub mod trigger;
pub mod util;

pub use codec::{codec_for, ColumnCodec};
pub use error::{LockError, PlanError, RowError, StorageError};
pub use plan::{choose_index, execute_query, lock_policy, ChosenIndex, IndexCandidate, LockPolicy, TransactionMode};
pub use range::Range;
pub use row::{Column, RowInfo, RowState};
pub use row_codec::{decode_row, encode_row};
pub use scan::{
    AutoCommitUpdater, AutoUnlockScanner, BasicScanner, BasicUpdater, JoinedUpdater, NonRepeatableUpdater, PredicateLockTable, RowLockTable,
    TxnResetScanner, UpgradableUpdater, WrappedUpdater,
};
pub use storage::{StorageBucket, StorageEngine};
