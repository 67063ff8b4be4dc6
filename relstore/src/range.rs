//! Range extraction: turning a filter's single-column comparison terms into
//! concrete scan bounds. Grounded on `core/src/indexing/key_spec.rs`'s
//! `KeySpec::matches` (which decides whether a set of filter columns lines
//! up with an index's key order) and `indexing/encoding.rs`'s ascending/
//! descending byte encoding, which is what makes a `Range`'s bounds usable
//! directly as storage-engine scan keys once encoded by `codec`.

use crate::collation::{invert_bytes, Collatable};
use crate::row::Column;
use relquery::collation::RangeBound;
use relquery::{Filter, Op, Value};
use std::cmp::Ordering;
use std::ops::Bound;

/// The portion of a filter a single index column can satisfy as a
/// contiguous scan, plus whatever couldn't be folded into the bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub low: RangeBound<Value>,
    pub high: RangeBound<Value>,
    /// Leftover predicate over `column` the bounds don't capture (e.g. `!=`,
    /// which narrows a range but isn't itself a bound) — must still be
    /// applied to each row the scan yields.
    pub filter: Filter,
    /// Predicate over other columns, carried along so a scan can apply it
    /// without a second pass once the row is materialized.
    pub join_filter: Filter,
}

impl Range {
    pub fn unbounded() -> Range {
        Range { low: RangeBound::Unbounded, high: RangeBound::Unbounded, filter: Filter::True, join_filter: Filter::True }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self.low, RangeBound::Unbounded) && matches!(self.high, RangeBound::Unbounded) && self.filter == Filter::True
    }

    /// A range whose low and high bound are the same included value —
    /// a single-key point lookup rather than a scan.
    pub fn is_point(&self) -> bool {
        matches!((&self.low, &self.high), (RangeBound::Included(a), RangeBound::Included(b)) if a == b)
    }

    fn tighten_low(&mut self, candidate: RangeBound<Value>) { self.low = tighter_low(self.low.clone(), candidate); }
    fn tighten_high(&mut self, candidate: RangeBound<Value>) { self.high = tighter_high(self.high.clone(), candidate); }
}

fn bound_value(b: &RangeBound<Value>) -> Option<&Value> {
    match b {
        RangeBound::Included(v) | RangeBound::Excluded(v) => Some(v),
        RangeBound::Unbounded => None,
    }
}

fn tighter_low(current: RangeBound<Value>, candidate: RangeBound<Value>) -> RangeBound<Value> {
    match (&current, bound_value(&candidate)) {
        (RangeBound::Unbounded, _) => candidate,
        (_, None) => current,
        (_, Some(cv)) => {
            let curv = bound_value(&current).unwrap();
            match cv.compare(curv) {
                Ordering::Greater => candidate,
                Ordering::Equal if matches!(candidate, RangeBound::Excluded(_)) => candidate,
                _ => current,
            }
        }
    }
}

fn tighter_high(current: RangeBound<Value>, candidate: RangeBound<Value>) -> RangeBound<Value> {
    match (&current, bound_value(&candidate)) {
        (RangeBound::Unbounded, _) => candidate,
        (_, None) => current,
        (_, Some(cv)) => {
            let curv = bound_value(&current).unwrap();
            match cv.compare(curv) {
                Ordering::Less => candidate,
                Ordering::Equal if matches!(candidate, RangeBound::Excluded(_)) => candidate,
                _ => current,
            }
        }
    }
}

/// Split a (conjunctive) filter's top-level terms into those that
/// constrain `column` alone and everything else. Nested `OrGroup`s are left
/// in the "everything else" bucket since a single range can't represent a
/// disjunction; callers needing per-clause ranges should call `dnf()` first
/// and extract once per clause.
pub fn split_remainders(filter: &Filter, column: &str) -> (Vec<Filter>, Filter) {
    let mut own = Vec::new();
    let mut rest = Vec::new();
    match filter {
        Filter::AndGroup(children) => {
            for child in children {
                match child {
                    Filter::ColumnToConstant { column: c, .. } if c == column => own.push(child.clone()),
                    Filter::ColumnToArg { column: c, .. } if c == column => own.push(child.clone()),
                    other => rest.push(other.clone()),
                }
            }
        }
        Filter::ColumnToConstant { column: c, .. } if c == column => own.push(filter.clone()),
        Filter::ColumnToArg { column: c, .. } if c == column => own.push(filter.clone()),
        other => rest.push(other.clone()),
    }
    (own, Filter::and_many(rest))
}

/// Resolve a single-column term to its (op, value) pair: a constant carries
/// its value directly, an arg term looks its value up positionally in
/// `args` (the same resolution `scan::evaluate_filter` does at row-eval
/// time) — `None` if the term can't close a bound (an out-of-range arg, or
/// a term shape that isn't a single comparison at all).
fn resolve_term(term: &Filter, args: &[Value]) -> Option<(Op, Value)> {
    match term {
        Filter::ColumnToConstant { op, constant, .. } => Some((*op, constant.clone())),
        Filter::ColumnToArg { op, arg, .. } => args.get(*arg as usize).map(|v| (*op, v.clone())),
        _ => None,
    }
}

/// Extract the tightest `Range` a single filter (already reduced to a
/// single conjunctive clause — see `multi_range_extract` for disjunctions)
/// places on `column`. `args` resolves any `ColumnToArg` terms against
/// `column`, the predominant term shape for argument-driven queries.
pub fn extract(filter: &Filter, column: &str, args: &[Value]) -> Range {
    let (own_terms, rest) = split_remainders(filter, column);
    let mut range = Range::unbounded();
    let mut residual = Vec::new();
    for term in &own_terms {
        let Some((op, value)) = resolve_term(term, args) else {
            residual.push(term.clone());
            continue;
        };
        match op {
            Op::Eq => {
                range.tighten_low(RangeBound::Included(value.clone()));
                range.tighten_high(RangeBound::Included(value));
            }
            Op::Ge => range.tighten_low(RangeBound::Included(value)),
            Op::Gt => range.tighten_low(RangeBound::Excluded(value)),
            Op::Le => range.tighten_high(RangeBound::Included(value)),
            Op::Lt => range.tighten_high(RangeBound::Excluded(value)),
            Op::Ne | Op::In | Op::NotIn => residual.push(term.clone()),
        }
    }
    range.filter = Filter::and_many(residual);
    range.join_filter = rest;
    range
}

/// Extract one `Range` per DNF clause of `filter`, so a disjunction becomes
/// several scans instead of one unbounded one. When `disjoint` is set,
/// clauses whose bounds are identical are merged (deduped) rather than
/// scanned twice. `reverse` flips the clause order, matching a descending
/// index traversal.
pub fn multi_range_extract(filter: &Filter, column: &str, args: &[Value], disjoint: bool, reverse: bool) -> Result<Vec<Range>, relquery::FilterError> {
    let dnf = filter.dnf()?;
    let clauses = match dnf {
        Filter::OrGroup(children) => children,
        other => vec![other],
    };
    let mut ranges: Vec<Range> = clauses.iter().map(|c| extract(c, column, args)).collect();
    if disjoint {
        let mut deduped: Vec<Range> = Vec::new();
        for r in ranges {
            if !deduped.iter().any(|existing| existing == &r) {
                deduped.push(r);
            }
        }
        ranges = deduped;
    }
    if reverse {
        ranges.reverse();
    }
    Ok(ranges)
}

fn encode_bound(bound: &RangeBound<Value>, descending: bool) -> Bound<Vec<u8>> {
    let encode = |v: &Value| if descending { invert_bytes(&v.to_bytes()) } else { v.to_bytes() };
    match bound {
        RangeBound::Unbounded => Bound::Unbounded,
        RangeBound::Included(v) => Bound::Included(encode(v)),
        RangeBound::Excluded(v) => Bound::Excluded(encode(v)),
    }
}

/// Translate a `Range`'s value-space bounds into the byte bounds a
/// `StorageBucket::range` scan needs, plus whether the scan must run in
/// reverse to still come out in ascending value order. `column`'s encoding
/// (via `codec_for`) inverts bytes for a descending column, which also
/// inverts which byte bound is "low" — a value-space low bound becomes the
/// storage-space high bound and vice versa, and an ascending value walk
/// becomes a descending byte walk.
///
/// Scoped to a single key column (this crate's current scan path indexes
/// on a row's first key column only); a composite key would need each
/// later column's bound folded into the same byte range instead of encoded
/// independently.
pub fn bound_to_storage(column: &Column, range: &Range) -> (Bound<Vec<u8>>, Bound<Vec<u8>>, bool) {
    let descending = column.direction.is_desc();
    if descending {
        (encode_bound(&range.high, true), encode_bound(&range.low, true), true)
    } else {
        (encode_bound(&range.low, false), encode_bound(&range.high, false), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relquery::Filter as F;

    #[test]
    fn ge_and_lt_tighten_to_half_open_interval() {
        let f = F::column_to_constant("age", Op::Ge, Value::I32(18)).and(&F::column_to_constant("age", Op::Lt, Value::I32(65)));
        let range = extract(&f, "age", &[]);
        assert_eq!(range.low, RangeBound::Included(Value::I32(18)));
        assert_eq!(range.high, RangeBound::Excluded(Value::I32(65)));
        assert_eq!(range.filter, Filter::True);
    }

    #[test]
    fn eq_collapses_to_point_range() {
        let f = F::column_to_constant("id", Op::Eq, Value::I32(7));
        let range = extract(&f, "id", &[]);
        assert!(range.is_point());
    }

    #[test]
    fn ne_is_kept_as_residual_filter_not_a_bound() {
        let f = F::column_to_constant("age", Op::Ge, Value::I32(18)).and(&F::column_to_constant("age", Op::Ne, Value::I32(30)));
        let range = extract(&f, "age", &[]);
        assert_eq!(range.low, RangeBound::Included(Value::I32(18)));
        assert_eq!(range.high, RangeBound::Unbounded);
        assert_eq!(range.filter, F::column_to_constant("age", Op::Ne, Value::I32(30)));
    }

    #[test]
    fn terms_on_other_columns_land_in_join_filter() {
        let f = F::column_to_constant("age", Op::Ge, Value::I32(18)).and(&F::column_to_constant("name", Op::Eq, Value::String("a".into())));
        let range = extract(&f, "age", &[]);
        assert_eq!(range.join_filter, F::column_to_constant("name", Op::Eq, Value::String("a".into())));
    }

    #[test]
    fn disjunction_produces_one_range_per_clause() {
        let f = F::column_to_constant("age", Op::Eq, Value::I32(1)).or(&F::column_to_constant("age", Op::Eq, Value::I32(2)));
        let ranges = multi_range_extract(&f, "age", &[], false, false).unwrap();
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| r.is_point()));
    }

    #[test]
    fn reverse_flips_clause_order() {
        let f = F::column_to_constant("age", Op::Eq, Value::I32(1)).or(&F::column_to_constant("age", Op::Eq, Value::I32(2)));
        let forward = multi_range_extract(&f, "age", &[], false, false).unwrap();
        let reversed = multi_range_extract(&f, "age", &[], false, true).unwrap();
        assert_eq!(forward[0], reversed[1]);
        assert_eq!(forward[1], reversed[0]);
    }

    #[test]
    fn column_to_arg_closes_a_range_like_a_constant() {
        // a == ?1 && (b > ?2 || b < ?3) style query: the `a` clause is the
        // predominant argument-driven term shape and must close a range.
        let f = F::column_to_arg("age", Op::Ge, 0).and(&F::column_to_arg("age", Op::Lt, 1));
        let args = [Value::I32(18), Value::I32(65)];
        let range = extract(&f, "age", &args);
        assert_eq!(range.low, RangeBound::Included(Value::I32(18)));
        assert_eq!(range.high, RangeBound::Excluded(Value::I32(65)));
        assert_eq!(range.filter, Filter::True);
    }

    #[test]
    fn column_to_arg_eq_collapses_to_point_range() {
        let f = F::column_to_arg("id", Op::Eq, 0);
        let range = extract(&f, "id", &[Value::I32(7)]);
        assert!(range.is_point());
    }

    #[test]
    fn unresolved_arg_index_falls_back_to_residual_filter() {
        let f = F::column_to_arg("age", Op::Ge, 3);
        let range = extract(&f, "age", &[Value::I32(18)]);
        assert_eq!(range.low, RangeBound::Unbounded);
        assert_eq!(range.filter, f);
    }

    #[test]
    fn multi_range_extract_resolves_args_per_clause() {
        let f = F::column_to_arg("age", Op::Eq, 0).or(&F::column_to_arg("age", Op::Eq, 1));
        let ranges = multi_range_extract(&f, "age", &[Value::I32(1), Value::I32(2)], false, false).unwrap();
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| r.is_point()));
    }

    #[test]
    fn bound_to_storage_keeps_order_for_ascending_column() {
        let column = Column::asc("age", relquery::ValueType::I32);
        let range = extract(&F::column_to_constant("age", Op::Ge, Value::I32(18)).and(&F::column_to_constant("age", Op::Lt, Value::I32(65))), "age", &[]);
        let (low, high, reverse) = bound_to_storage(&column, &range);
        assert_eq!(low, Bound::Included(Value::I32(18).to_bytes()));
        assert_eq!(high, Bound::Excluded(Value::I32(65).to_bytes()));
        assert!(!reverse);
    }

    #[test]
    fn bound_to_storage_swaps_and_reverses_for_descending_column() {
        let column = Column::desc("age", relquery::ValueType::I32);
        let range = extract(&F::column_to_constant("age", Op::Ge, Value::I32(18)).and(&F::column_to_constant("age", Op::Lt, Value::I32(65))), "age", &[]);
        let (low, high, reverse) = bound_to_storage(&column, &range);
        // descending bytes invert order, so the value-space low (18) becomes
        // the storage-space high bound and vice versa.
        assert_eq!(low, Bound::Excluded(invert_bytes(&Value::I32(65).to_bytes())));
        assert_eq!(high, Bound::Included(invert_bytes(&Value::I32(18).to_bytes())));
        assert!(reverse);
    }
}
