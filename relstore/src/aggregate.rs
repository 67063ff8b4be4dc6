//! Grouping and `distinct` (spec §4.7). No teacher file models a
//! group-by scanner directly; grounded on the general "peekable iterator,
//! group while the key compares equal" shape, generalized to this crate's
//! own row representation and combined with `row::RowInfo` to decide
//! whether `distinct` needs a synthesized key at all.

use relquery::Value;
use std::collections::HashMap;

/// An owned, materialized row: column name to value. Scanners further up
/// the pipeline decode rows into this shape before grouping/mapping.
pub type RowValues = HashMap<String, Value>;

/// Accumulates one group of source rows into a single target row.
pub trait Aggregator {
    fn accumulate(&mut self, row: &RowValues);
    fn finish(self: Box<Self>) -> RowValues;
}

/// Groups contiguous rows from `source` whose `key_of` projection compares
/// equal, feeding each group to a fresh aggregator from `factory`. Callers
/// are responsible for ordering `source` by the grouping key first — this
/// type does not sort, it only detects where one group ends and the next
/// begins (spec §4.7: "groups contiguous source rows").
pub struct AggregatedScanner<I, K, F>
where
    I: Iterator<Item = RowValues>,
    K: Fn(&RowValues) -> Vec<Value>,
    F: Fn() -> Box<dyn Aggregator>,
{
    source: std::iter::Peekable<I>,
    key_of: K,
    factory: F,
}

impl<I, K, F> AggregatedScanner<I, K, F>
where
    I: Iterator<Item = RowValues>,
    K: Fn(&RowValues) -> Vec<Value>,
    F: Fn() -> Box<dyn Aggregator>,
{
    pub fn new(source: I, key_of: K, factory: F) -> Self { AggregatedScanner { source: source.peekable(), key_of, factory } }
}

impl<I, K, F> Iterator for AggregatedScanner<I, K, F>
where
    I: Iterator<Item = RowValues>,
    K: Fn(&RowValues) -> Vec<Value>,
    F: Fn() -> Box<dyn Aggregator>,
{
    type Item = RowValues;

    fn next(&mut self) -> Option<RowValues> {
        let first = self.source.next()?;
        let key = (self.key_of)(&first);
        let mut agg = (self.factory)();
        agg.accumulate(&first);
        while let Some(peek) = self.source.peek() {
            if (self.key_of)(peek) != key {
                break;
            }
            let row = self.source.next().unwrap();
            agg.accumulate(&row);
        }
        Some(agg.finish())
    }
}

/// The identity aggregator `distinct` uses: keep the first row of each
/// group, discard the rest.
#[derive(Default)]
pub struct FirstRow(Option<RowValues>);

impl Aggregator for FirstRow {
    fn accumulate(&mut self, row: &RowValues) {
        if self.0.is_none() {
            self.0 = Some(row.clone());
        }
    }

    fn finish(self: Box<Self>) -> RowValues { self.0.expect("AggregatedScanner only finishes a group that accumulated at least one row") }
}

/// Whether `distinct` needs to run a grouping scan at all. A no-op when
/// the source already carries a primary key, since every row is already
/// unique by construction (spec §4.7).
pub fn distinct_is_noop(source_has_primary_key: bool) -> bool { source_has_primary_key }

/// `distinct` over `source`, grouping on `key_columns` in source order.
pub fn distinct(source: impl Iterator<Item = RowValues>, key_columns: Vec<String>) -> impl Iterator<Item = RowValues> {
    AggregatedScanner::new(
        source,
        move |row: &RowValues| key_columns.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Bool(false))).collect(),
        || Box::new(FirstRow::default()) as Box<dyn Aggregator>,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> RowValues { pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect() }

    struct Sum(i64);
    impl Aggregator for Sum {
        fn accumulate(&mut self, row: &RowValues) {
            if let Some(Value::I32(n)) = row.get("amount") {
                self.0 += *n as i64;
            }
        }
        fn finish(self: Box<Self>) -> RowValues { row(&[("total", Value::I64(self.0))]) }
    }

    #[test]
    fn aggregated_scanner_groups_contiguous_rows_by_key() {
        let rows = vec![
            row(&[("group", Value::I32(1)), ("amount", Value::I32(10))]),
            row(&[("group", Value::I32(1)), ("amount", Value::I32(5))]),
            row(&[("group", Value::I32(2)), ("amount", Value::I32(3))]),
        ];
        let scanner = AggregatedScanner::new(rows.into_iter(), |r| vec![r["group"].clone()], || Box::new(Sum(0)) as Box<dyn Aggregator>);
        let out: Vec<RowValues> = scanner.collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["total"], Value::I64(15));
        assert_eq!(out[1]["total"], Value::I64(3));
    }

    #[test]
    fn distinct_keeps_first_row_of_each_group() {
        let rows = vec![
            row(&[("k", Value::I32(1)), ("v", Value::I32(100))]),
            row(&[("k", Value::I32(1)), ("v", Value::I32(200))]),
            row(&[("k", Value::I32(2)), ("v", Value::I32(300))]),
        ];
        let out: Vec<RowValues> = distinct(rows.into_iter(), vec!["k".to_string()]).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["v"], Value::I32(100));
    }

    #[test]
    fn distinct_is_noop_when_source_has_primary_key() {
        assert!(distinct_is_noop(true));
        assert!(!distinct_is_noop(false));
    }
}
