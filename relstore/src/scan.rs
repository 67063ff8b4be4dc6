//! Predicate locks and the row-lock/predicate-lock deadlock-avoidance
//! protocol (spec §4.5, §5's "locking discipline on writes"). No existing
//! teacher file models predicate locks directly (`ankurah-ankurah` is a
//! CRDT sync engine, not a transactional store), so this is grounded on
//! the teacher's general RAII-guard style (`Drop`-released handles, as
//! seen throughout `core/src/reactor.rs`'s subscription guards) generalized
//! to the spec's own described protocol rather than copied from one file.

use crate::aggregate::RowValues;
use crate::error::{LockError, PlanError};
use crate::range::{bound_to_storage, Range};
use crate::row::{Column, RowInfo};
use crate::storage::StorageBucket;
use futures::StreamExt;
use relquery::{Filter, Value};
use std::collections::HashMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Evaluate `filter` against a row's columns, resolving `ColumnToArg`
/// through `args` and `ColumnToColumn` by comparing two resolved values.
/// Used to decide whether an inserted row satisfies a held predicate lock.
pub fn evaluate_filter(filter: &Filter, row: &dyn Fn(&str) -> Option<Value>, args: &[Value]) -> bool {
    use relquery::Op;
    fn compare(op: Op, lhs: &Value, rhs: &Value) -> bool {
        use crate::collation::Collatable;
        use std::cmp::Ordering;
        let ord = lhs.compare(rhs);
        match op {
            Op::Eq => lhs == rhs,
            Op::Ne => lhs != rhs,
            Op::Ge => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::In | Op::NotIn => false,
        }
    }
    match filter {
        Filter::True => true,
        Filter::False => false,
        Filter::ColumnToConstant { column, op, constant } => row(column).map(|v| compare(*op, &v, constant)).unwrap_or(false),
        Filter::ColumnToArg { column, op, arg } => match (row(column), args.get(*arg as usize)) {
            (Some(v), Some(a)) => compare(*op, &v, a),
            _ => false,
        },
        Filter::ColumnToColumn { a, op, b } => match (row(a), row(b)) {
            (Some(va), Some(vb)) => compare(*op, &va, &vb),
            _ => false,
        },
        Filter::In { column, arg } => match (row(column), args.get(*arg as usize)) {
            (Some(v), Some(Value::Array(items))) => items.contains(&v),
            _ => false,
        },
        Filter::AndGroup(children) => children.iter().all(|c| evaluate_filter(c, row, args)),
        Filter::OrGroup(children) => children.iter().any(|c| evaluate_filter(c, row, args)),
    }
}

struct HeldPredicate {
    id: u64,
    predicate: Filter,
    args: Vec<Value>,
}

/// A registry of predicate locks held by in-flight scanners. Insert/replace
/// checks every held predicate against the row being written; a match
/// blocks until the owning scanner's transaction exits.
pub struct PredicateLockTable {
    held: Mutex<Vec<HeldPredicate>>,
    notify: Notify,
    next_id: AtomicU64,
}

impl Default for PredicateLockTable {
    fn default() -> Self { Self::new() }
}

impl PredicateLockTable {
    pub fn new() -> Self { PredicateLockTable { held: Mutex::new(Vec::new()), notify: Notify::new(), next_id: AtomicU64::new(1) } }

    /// Register `predicate` as held for the lifetime of the returned guard.
    /// This never blocks: a scanner declares its own predicate unconditionally,
    /// it is writers against matching rows that block (see `open_acquire`).
    pub fn hold(self: &Arc<Self>, predicate: Filter, args: Vec<Value>) -> PredicateLockGuard {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.held.lock().unwrap().push(HeldPredicate { id, predicate, args });
        PredicateLockGuard { table: self.clone(), id }
    }

    /// A guard matching nothing — installed for joined secondary scans with
    /// no explicit transaction, to block concurrent index drops without
    /// actually constraining inserts (spec §4.5).
    pub fn hold_guard(self: &Arc<Self>) -> PredicateLockGuard { self.hold(Filter::False, Vec::new()) }

    fn blocking_predicate(&self, row: &dyn Fn(&str) -> Option<Value>) -> bool {
        self.held.lock().unwrap().iter().any(|h| evaluate_filter(&h.predicate, row, &h.args))
    }

    /// Block until no held predicate matches `row`, per `openAcquire` (spec
    /// §4.5): called before taking the exclusive row lock on insert/replace.
    pub async fn open_acquire(&self, row: &dyn Fn(&str) -> Option<Value>) {
        loop {
            if !self.blocking_predicate(row) {
                return;
            }
            self.notify.notified().await;
        }
    }

    /// Non-blocking version used by the deadlock-avoidance protocol: `Err`
    /// means some held predicate currently matches.
    pub fn try_open_acquire(&self, row: &dyn Fn(&str) -> Option<Value>) -> Result<(), LockError> {
        if self.blocking_predicate(row) {
            Err(LockError::Retry)
        } else {
            Ok(())
        }
    }

    fn release(&self, id: u64) {
        self.held.lock().unwrap().retain(|h| h.id != id);
        self.notify.notify_waiters();
    }
}

pub struct PredicateLockGuard {
    table: Arc<PredicateLockTable>,
    id: u64,
}

impl Drop for PredicateLockGuard {
    fn drop(&mut self) { self.table.release(self.id); }
}

/// Per-key exclusive row locks, keyed on the encoded primary key bytes.
#[derive(Default)]
pub struct RowLockTable {
    locks: Mutex<HashMap<Vec<u8>, Arc<tokio::sync::Mutex<()>>>>,
}

impl RowLockTable {
    pub fn new() -> Self { RowLockTable::default() }

    fn entry(&self, key: &[u8]) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().unwrap().entry(key.to_vec()).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))).clone()
    }

    pub async fn lock(&self, key: &[u8]) -> RowLockGuard { RowLockGuard { _guard: self.entry(key).lock_owned().await } }

    pub fn try_lock(&self, key: &[u8]) -> Result<RowLockGuard, LockError> {
        self.entry(key).try_lock_owned().map(|g| RowLockGuard { _guard: g }).map_err(|_| LockError::Retry)
    }
}

pub struct RowLockGuard {
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

/// The deadlock-mitigation protocol from spec §4.5: a writer already
/// holding `row_guard` tries to add a predicate lock (reverse acquisition
/// order from a reader's predicate-then-row order). If that would block,
/// release the row lock, take the predicate lock the slow way, then
/// re-acquire and re-check the row; `still_matches` tells the caller
/// whether the row bytes it originally read are still current.
pub async fn acquire_predicate_after_row<'a>(
    predicates: &'a Arc<PredicateLockTable>,
    rows: &'a RowLockTable,
    key: &[u8],
    row_guard: RowLockGuard,
    predicate: Filter,
    args: Vec<Value>,
    row: &dyn Fn(&str) -> Option<Value>,
    still_matches: impl FnOnce() -> bool,
) -> Result<(RowLockGuard, PredicateLockGuard), LockError> {
    if predicates.try_open_acquire(row).is_ok() {
        let guard = predicates.hold(predicate, args);
        return Ok((row_guard, guard));
    }
    drop(row_guard);
    predicates.open_acquire(row).await;
    let guard = predicates.hold(predicate, args);
    let reacquired = rows.lock(key).await;
    if !still_matches() {
        return Err(LockError::Stale);
    }
    Ok((reacquired, guard))
}

fn bound_as_slice(b: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match b {
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// The §2/§4.6 pipeline's `rangeScanner → filterEvaluator` stages: walk
/// every `Range`'s storage bounds, decode each row via `row_codec`, and
/// drop rows that fail the range's own residual filter or its join filter
/// over other columns. Scoped to a single key column per `bound_to_storage`.
async fn run_range_scan(
    bucket: &Arc<dyn StorageBucket>,
    row_info: &RowInfo,
    key_column: &Column,
    ranges: &[Range],
    args: &[Value],
) -> Result<Vec<RowValues>, PlanError> {
    let mut rows = Vec::new();
    for range in ranges {
        let (low, high, reverse) = bound_to_storage(key_column, range);
        let stream = bucket.range(bound_as_slice(&low), bound_as_slice(&high), reverse).await?;
        tokio::pin!(stream);
        while let Some((key_bytes, value_bytes)) = stream.next().await {
            let decoded = crate::row_codec::decode_row(row_info, &key_bytes, &value_bytes)?;
            let get = |c: &str| decoded.get(c).cloned();
            if !evaluate_filter(&range.filter, &get, args) || !evaluate_filter(&range.join_filter, &get, args) {
                continue;
            }
            rows.push(decoded);
        }
    }
    tracing::debug!(matched = rows.len(), ranges = ranges.len(), "range scan complete");
    Ok(rows)
}

/// `RepeatableRead`/default scanner (spec §4.5): the predicate lock is
/// held for the caller's transaction span, released only when the scanner
/// itself is dropped, so a concurrent writer blocks until the whole
/// transaction ends.
pub struct BasicScanner {
    pub rows: Vec<RowValues>,
    _guard: PredicateLockGuard,
}

impl BasicScanner {
    #[tracing::instrument(skip_all, fields(ranges = ranges.len()))]
    pub async fn open(
        predicates: &Arc<PredicateLockTable>,
        bucket: &Arc<dyn StorageBucket>,
        row_info: &RowInfo,
        key_column: &Column,
        ranges: &[Range],
        args: &[Value],
        predicate: Filter,
    ) -> Result<Self, PlanError> {
        let guard = predicates.hold(predicate, args.to_vec());
        let rows = run_range_scan(bucket, row_info, key_column, ranges, args).await?;
        Ok(BasicScanner { rows, _guard: guard })
    }
}

/// `ReadCommitted`/`ReadUncommitted` scanner (spec §4.5): the predicate
/// lock exists only long enough to materialize the row set, then releases
/// immediately — a concurrent writer only blocks while this scan is
/// actually running, not for the rest of the caller's transaction.
pub struct AutoUnlockScanner {
    pub rows: Vec<RowValues>,
}

impl AutoUnlockScanner {
    #[tracing::instrument(skip_all, fields(ranges = ranges.len()))]
    pub async fn open(
        predicates: &Arc<PredicateLockTable>,
        bucket: &Arc<dyn StorageBucket>,
        row_info: &RowInfo,
        key_column: &Column,
        ranges: &[Range],
        args: &[Value],
        predicate: Filter,
    ) -> Result<Self, PlanError> {
        let guard = predicates.hold(predicate, args.to_vec());
        let rows = run_range_scan(bucket, row_info, key_column, ranges, args).await?;
        drop(guard);
        tracing::debug!("predicate lock released immediately after materializing scan");
        Ok(AutoUnlockScanner { rows })
    }
}

/// `Unspecified`-mode scanner (spec §4.5): no caller-managed transaction
/// exists at all, so this statement is its own auto-committed transaction
/// — structurally identical to `AutoUnlockScanner`'s release timing, but
/// for a statement that was never part of a longer-lived transaction in
/// the first place rather than one that chose to release early.
pub struct TxnResetScanner {
    pub rows: Vec<RowValues>,
}

impl TxnResetScanner {
    #[tracing::instrument(skip_all, fields(ranges = ranges.len()))]
    pub async fn open(
        predicates: &Arc<PredicateLockTable>,
        bucket: &Arc<dyn StorageBucket>,
        row_info: &RowInfo,
        key_column: &Column,
        ranges: &[Range],
        args: &[Value],
    ) -> Result<Self, PlanError> {
        let guard = predicates.hold_guard();
        let rows = run_range_scan(bucket, row_info, key_column, ranges, args).await?;
        drop(guard);
        Ok(TxnResetScanner { rows })
    }
}

/// `UpgradableRead`'s updater (spec §4.5): row lock and predicate lock are
/// both acquired up front, in predicate-then-row order, so no later
/// upgrade step can deadlock against a scanner.
pub struct BasicUpdater;

impl BasicUpdater {
    pub async fn apply(
        rows: &RowLockTable,
        predicates: &Arc<PredicateLockTable>,
        key: &[u8],
        predicate: Filter,
        args: Vec<Value>,
        row: &dyn Fn(&str) -> Option<Value>,
    ) -> (RowLockGuard, PredicateLockGuard) {
        predicates.open_acquire(row).await;
        let pred_guard = predicates.hold(predicate, args);
        let row_guard = rows.lock(key).await;
        (row_guard, pred_guard)
    }
}

/// `RepeatableRead`'s updater (spec §4.5): the row lock is already held
/// from the scan that produced this row; adding the predicate lock now
/// would acquire in the opposite order from a reader's predicate-then-row
/// discipline, so it goes through `acquire_predicate_after_row`'s
/// release/retry/re-validate protocol instead of taking both locks blind.
pub struct UpgradableUpdater;

impl UpgradableUpdater {
    #[allow(clippy::too_many_arguments)]
    pub async fn apply<'a>(
        predicates: &'a Arc<PredicateLockTable>,
        rows: &'a RowLockTable,
        key: &[u8],
        row_guard: RowLockGuard,
        predicate: Filter,
        args: Vec<Value>,
        row: &dyn Fn(&str) -> Option<Value>,
        still_matches: impl FnOnce() -> bool,
    ) -> Result<(RowLockGuard, PredicateLockGuard), LockError> {
        acquire_predicate_after_row(predicates, rows, key, row_guard, predicate, args, row, still_matches).await
    }
}

/// `ReadUncommitted`/`ReadCommitted`'s updater (spec §4.5): only the row
/// lock is taken; no predicate lock means a concurrent scanner's snapshot
/// can go stale the instant this returns — the "non-repeatable read" the
/// isolation level is named for.
pub struct NonRepeatableUpdater;

impl NonRepeatableUpdater {
    pub async fn apply(rows: &RowLockTable, key: &[u8]) -> RowLockGuard { rows.lock(key).await }
}

/// `Unspecified`-mode updater (spec §4.5): every statement is its own
/// transaction, so the row lock here spans only this call.
pub struct AutoCommitUpdater;

impl AutoCommitUpdater {
    pub async fn apply(rows: &RowLockTable, key: &[u8]) -> RowLockGuard { rows.lock(key).await }
}

/// A joined secondary-index write's updater (spec §4.5): locks the
/// secondary key before the primary key, always in that order, so two
/// concurrent joined updates can't deadlock against each other by taking
/// the two row locks in opposite order.
pub struct JoinedUpdater;

impl JoinedUpdater {
    pub async fn apply(rows: &RowLockTable, secondary_key: &[u8], primary_key: &[u8]) -> (RowLockGuard, RowLockGuard) {
        let secondary_guard = rows.lock(secondary_key).await;
        let primary_guard = rows.lock(primary_key).await;
        (secondary_guard, primary_guard)
    }
}

/// A mapped table's updater (spec §4.8): renumbers target-side arguments
/// back to source-side values through the mapping's inverse functions
/// before delegating the actual write to the source table's own updater.
pub struct WrappedUpdater;

impl WrappedUpdater {
    pub fn prepare_args(mapping: &crate::mapping::MappedTable, arg_columns: &HashMap<u32, String>, args: &[Value]) -> Option<Vec<Value>> {
        mapping.prepare_args(arg_columns, args)
    }
}
