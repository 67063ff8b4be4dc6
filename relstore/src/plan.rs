//! Query planning: index selection and the lock-mode policy table (spec
//! §4.5/§4.6). Grounded on `indexing/key_spec.rs`'s `KeySpec::matches`
//! prefix/inverse matching, generalized from a single index-vs-index check
//! into scoring several candidate indexes against a filter and an
//! `orderBy` list so the planner can pick the best without a cost model —
//! selection here stays rule-based, per the spec's explicit non-goal of a
//! cost-based optimizer.

use crate::aggregate::RowValues;
use crate::collation::Collatable;
use crate::range::multi_range_extract;
use crate::row::{Column, Direction, RowInfo};
use crate::scan::{AutoUnlockScanner, BasicScanner, PredicateLockTable, TxnResetScanner};
use crate::storage::StorageBucket;
use relquery::{Filter, Op, Projection, QuerySpec, Value};
use std::sync::Arc;

/// A candidate the table can scan: its key columns in index order, and
/// which columns a scan against it returns without a join back to the
/// primary (the primary's candidate returns everything; a secondary
/// returns only its own key+value columns).
#[derive(Debug, Clone)]
pub struct IndexCandidate {
    pub name: String,
    pub row_info: RowInfo,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMatch {
    Direct,
    Inverse,
}

/// How well a candidate's key order lines up with the filter's equality
/// terms and the query's `orderBy`. Higher `eq_prefix` wins; ties break on
/// `range_close` then `order_covered` then `covers_projection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct IndexScore {
    eq_prefix: usize,
    range_close: bool,
    order_covered: bool,
    covers_projection: bool,
}

fn column_has_eq(filter: &Filter, column: &str) -> bool {
    matches!(filter, Filter::AndGroup(children) if children.iter().any(|c| column_has_eq(c, column)))
        || matches!(filter, Filter::ColumnToConstant { column: c, op: Op::Eq, .. } | Filter::ColumnToArg { column: c, op: Op::Eq, .. } if c == column)
}

fn column_has_range_term(filter: &Filter, column: &str) -> bool {
    fn term_matches(f: &Filter, column: &str) -> bool {
        matches!(f,
            Filter::ColumnToConstant { column: c, op, .. } | Filter::ColumnToArg { column: c, op, .. }
                if c == column && matches!(op, Op::Ge | Op::Gt | Op::Le | Op::Lt))
    }
    match filter {
        Filter::AndGroup(children) => children.iter().any(|c| term_matches(c, column)),
        other => term_matches(other, column),
    }
}

fn score_candidate(candidate: &IndexCandidate, filter: &Filter, order_by: &[relquery::query_spec::OrderTerm], projection: Option<&Projection>) -> IndexScore {
    let key = candidate.row_info.key_columns();
    let mut eq_prefix = 0;
    while eq_prefix < key.len() && column_has_eq(filter, &key[eq_prefix].name) {
        eq_prefix += 1;
    }
    let range_close = eq_prefix < key.len() && column_has_range_term(filter, &key[eq_prefix].name);

    let order_covered = {
        let remaining = &key[eq_prefix..];
        remaining.len() >= order_by.len()
            && order_by.iter().zip(remaining.iter()).all(|(term, col)| term.column == col.name && term.descending == col.direction.is_desc())
    };

    let covers_projection = match projection {
        None => candidate.is_primary,
        Some(p) => p.sources().iter().all(|s| candidate.row_info.column(s).is_some()),
    };

    IndexScore { eq_prefix, range_close, order_covered, covers_projection }
}

#[derive(Debug, Clone)]
pub struct ChosenIndex {
    pub name: String,
    pub needs_join: bool,
    pub needs_sort: bool,
}

pub fn choose_index(candidates: &[IndexCandidate], query: &QuerySpec) -> Result<ChosenIndex, crate::error::PlanError> {
    let mut best: Option<(&IndexCandidate, IndexScore)> = None;
    for candidate in candidates {
        let score = score_candidate(candidate, &query.filter, &query.order_by, query.projection.as_ref());
        if best.map(|(_, b)| score > b).unwrap_or(true) {
            best = Some((candidate, score));
        }
    }
    let (candidate, score) = best.ok_or(crate::error::PlanError::NoViableIndex)?;
    Ok(ChosenIndex {
        name: candidate.name.clone(),
        needs_join: !score.covers_projection,
        needs_sort: !score.order_covered && !query.order_by.is_empty(),
    })
}

/// Direction-aware prefix match between a query's desired key order and a
/// candidate's actual key order, mirroring `KeySpec::matches`: every column
/// must agree on name, and directions must be either all-equal (`Direct`)
/// or all-flipped (`Inverse`).
pub fn key_order_matches(query_key: &[Column], index_key: &[Column]) -> Option<IndexMatch> {
    if query_key.len() > index_key.len() {
        return None;
    }
    let mut direct = true;
    let mut inverse = true;
    for (q, i) in query_key.iter().zip(index_key.iter()) {
        if q.name != i.name {
            return None;
        }
        if q.direction != i.direction {
            direct = false;
        }
        if q.direction == i.direction {
            inverse = false;
        }
    }
    if direct {
        Some(IndexMatch::Direct)
    } else if inverse {
        Some(IndexMatch::Inverse)
    } else {
        None
    }
}

/// The transaction mode a caller scans or updates under (spec §4.5's table
/// header). `Unspecified` is the "no transaction passed" row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    Unspecified,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    UpgradableRead,
    Unsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerKind {
    Basic,
    AutoUnlock,
    TxnReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterKind {
    Basic,
    Upgradable,
    NonRepeatable,
    AutoCommit,
    Joined,
    Wrapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub scanner: ScannerKind,
    pub updater: UpdaterKind,
    pub predicate_lock: bool,
}

/// The table in spec §4.5, verbatim.
pub fn lock_policy(mode: TransactionMode) -> LockPolicy {
    match mode {
        TransactionMode::Unspecified => LockPolicy { scanner: ScannerKind::TxnReset, updater: UpdaterKind::AutoCommit, predicate_lock: false },
        TransactionMode::ReadUncommitted => LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::NonRepeatable, predicate_lock: false },
        TransactionMode::ReadCommitted => LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::NonRepeatable, predicate_lock: true },
        TransactionMode::RepeatableRead => LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::Upgradable, predicate_lock: true },
        TransactionMode::UpgradableRead => LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::Basic, predicate_lock: true },
        TransactionMode::Unsafe => LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::Basic, predicate_lock: false },
    }
}

/// Joined secondary scans with `Unspecified` mode add a guard predicate
/// lock and upgrade to `RepeatableRead` across the validate-then-join
/// window (spec §4.5 and the resolved open question in DESIGN.md).
pub fn joined_secondary_mode(mode: TransactionMode) -> TransactionMode {
    if mode == TransactionMode::Unspecified {
        TransactionMode::RepeatableRead
    } else {
        mode
    }
}

/// Ties index selection, range extraction, locked scanning, projection and
/// sort together into the §2/§4.6 pipeline:
/// `rangeScanner -> filterEvaluator -> [join] -> [projection] -> [sort] -> [aggregate/map]`.
/// The bracketed join/aggregate stages are a caller's job once it has the
/// already-decoded, already-sorted row set this returns — this function
/// owns the parts of the pipeline that are identical for every caller.
#[tracing::instrument(skip_all)]
pub async fn execute_query(
    candidates: &[IndexCandidate],
    query: &QuerySpec,
    args: &[Value],
    mode: TransactionMode,
    bucket: &Arc<dyn StorageBucket>,
    predicates: &Arc<PredicateLockTable>,
) -> Result<Vec<RowValues>, crate::error::PlanError> {
    let chosen = choose_index(candidates, query)?;
    let candidate = candidates.iter().find(|c| c.name == chosen.name).ok_or(crate::error::PlanError::NoViableIndex)?;
    let key_column = candidate.row_info.key_columns().first().ok_or(crate::error::PlanError::NoViableIndex)?;
    let reverse = query.order_by.first().map(|t| t.descending).unwrap_or(false);
    let ranges = multi_range_extract(&query.filter, &key_column.name, args, true, reverse)?;
    tracing::debug!(index = %chosen.name, ranges = ranges.len(), needs_join = chosen.needs_join, needs_sort = chosen.needs_sort, "planned scan");
    if chosen.needs_join {
        tracing::debug!(index = %chosen.name, "scan result needs a join back to the primary for full row/projection coverage");
    }

    let policy = lock_policy(mode);
    let mut rows = match policy.scanner {
        ScannerKind::Basic => BasicScanner::open(predicates, bucket, &candidate.row_info, key_column, &ranges, args, query.filter.clone()).await?.rows,
        ScannerKind::AutoUnlock => AutoUnlockScanner::open(predicates, bucket, &candidate.row_info, key_column, &ranges, args, query.filter.clone()).await?.rows,
        ScannerKind::TxnReset => TxnResetScanner::open(predicates, bucket, &candidate.row_info, key_column, &ranges, args).await?.rows,
    };

    if let Some(projection) = &query.projection {
        rows = rows
            .into_iter()
            .map(|row| projection.columns().map(|c| (c.name.clone(), row.get(&c.source).cloned().unwrap_or(Value::Bool(false)))).collect())
            .collect();
    }

    if chosen.needs_sort {
        rows.sort_by(|a, b| {
            for term in &query.order_by {
                let cmp = match (a.get(&term.column), b.get(&term.column)) {
                    (Some(x), Some(y)) => x.compare(y),
                    _ => std::cmp::Ordering::Equal,
                };
                let cmp = if term.descending { cmp.reverse() } else { cmp };
                if cmp != std::cmp::Ordering::Equal {
                    return cmp;
                }
            }
            std::cmp::Ordering::Equal
        });
    }

    tracing::debug!(rows = rows.len(), "pipeline complete");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relquery::Filter as F;

    fn candidate(name: &str, key_names: &[&str], is_primary: bool) -> IndexCandidate {
        let key = key_names.iter().map(|n| Column::new(*n, relquery::ValueType::I32)).collect();
        IndexCandidate { name: name.to_string(), row_info: RowInfo::new(key, vec![]).unwrap(), is_primary }
    }

    #[test]
    fn picks_index_whose_key_prefix_has_more_equality_terms() {
        let primary = candidate("primary", &["id"], true);
        let secondary = candidate("by_age", &["age", "id"], false);
        let filter = F::column_to_constant("age", Op::Eq, relquery::Value::I32(30));
        let query = QuerySpec::new(filter);
        let chosen = choose_index(&[primary, secondary], &query).unwrap();
        assert_eq!(chosen.name, "by_age");
    }

    #[test]
    fn no_candidates_is_a_plan_error() {
        let query = QuerySpec::new(Filter::True);
        assert!(matches!(choose_index(&[], &query), Err(crate::error::PlanError::NoViableIndex)));
    }

    #[test]
    fn key_order_matches_detects_full_inversion() {
        let query_key = vec![Column::desc("a", relquery::ValueType::I32)];
        let index_key = vec![Column::asc("a", relquery::ValueType::I32)];
        assert_eq!(key_order_matches(&query_key, &index_key), Some(IndexMatch::Inverse));
    }

    #[test]
    fn lock_policy_matches_spec_table() {
        assert_eq!(
            lock_policy(TransactionMode::ReadCommitted),
            LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::NonRepeatable, predicate_lock: true }
        );
        assert_eq!(
            lock_policy(TransactionMode::RepeatableRead),
            LockPolicy { scanner: ScannerKind::Basic, updater: UpdaterKind::Upgradable, predicate_lock: true }
        );
        assert_eq!(
            lock_policy(TransactionMode::Unspecified),
            LockPolicy { scanner: ScannerKind::TxnReset, updater: UpdaterKind::AutoCommit, predicate_lock: false }
        );
    }

    #[test]
    fn joined_secondary_upgrades_unspecified_to_repeatable_read() {
        assert_eq!(joined_secondary_mode(TransactionMode::Unspecified), TransactionMode::RepeatableRead);
        assert_eq!(joined_secondary_mode(TransactionMode::ReadCommitted), TransactionMode::ReadCommitted);
    }

    #[tokio::test]
    async fn execute_query_scans_filters_projects_and_sorts() {
        use crate::storage::{MemEngine, StorageEngine};
        use relquery::query_spec::OrderTerm;
        use relquery::{Projection, Value, ValueType};

        let row_info = RowInfo::new(vec![Column::new("id", ValueType::I32)], vec![Column::new("name", ValueType::String)]).unwrap();
        let engine = MemEngine::new();
        let bucket = engine.bucket("people").await.unwrap();
        for (id, name) in [(1, "grace"), (2, "ada"), (3, "alan")] {
            let mut values = RowValues::new();
            values.insert("id".to_string(), Value::I32(id));
            values.insert("name".to_string(), Value::String(name.into()));
            let (key, value) = crate::row_codec::encode_row(&row_info, &values).unwrap();
            bucket.put(&key, &value).await.unwrap();
        }

        let candidates = [IndexCandidate { name: "primary".to_string(), row_info, is_primary: true }];
        let query = QuerySpec::new(F::column_to_constant("id", Op::Ge, Value::I32(2)))
            .with_projection(Projection::new().with("person", "name"))
            .with_order_by(vec![OrderTerm::desc("id")]);
        let predicates = Arc::new(PredicateLockTable::new());

        let rows = execute_query(&candidates, &query, &[], TransactionMode::Unspecified, &bucket, &predicates).await.unwrap();
        let names: Vec<&Value> = rows.iter().map(|r| &r["person"]).collect();
        assert_eq!(names, vec![&Value::String("alan".into()), &Value::String("ada".into())]);
    }
}
