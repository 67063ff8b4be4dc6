//! Mapped-table inverse discovery, filter/sort pushdown, and argument
//! renumbering (spec §4.8). No teacher file maintains a mapper's inverse
//! functions directly; grounded on the general registry shape already
//! used for this crate's codec dispatch (`codec::codec_for`) — a name
//! keyed lookup table of small function objects, generalized here to
//! (column, inverse fn, untransformed flag) triples.

use relquery::query_spec::OrderTerm;
use relquery::{Filter, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// One target-column's inverse: a function from the target value back to
/// the source value it was derived from, plus whether that function is
/// the identity (safe for filter/sort pushdown without reevaluation).
#[derive(Clone)]
pub struct Inverse {
    pub untransformed: bool,
    apply: Arc<dyn Fn(&Value) -> Value + Send + Sync>,
}

impl Inverse {
    pub fn identity() -> Self { Inverse { untransformed: true, apply: Arc::new(|v: &Value| v.clone()) } }

    pub fn transform(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self { Inverse { untransformed: false, apply: Arc::new(f) } }

    pub fn apply(&self, target_value: &Value) -> Value { (self.apply)(target_value) }
}

/// Which write path a cached inverse mapper serves (spec §4.8: "three
/// inverse mappers are cached per table").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InverseMapperKind {
    /// load/delete: only primary-key columns need an inverse.
    PkOnly,
    /// store/insert/replace: every column needs an inverse.
    Full,
    /// update: only columns actually marked dirty need one.
    Update,
}

/// A mapped table's discovered `target_to_sourceName` inverse functions,
/// keyed by target column name.
#[derive(Default, Clone)]
pub struct MappedTable {
    inverses: HashMap<String, Inverse>,
}

impl MappedTable {
    pub fn new() -> Self { MappedTable::default() }

    pub fn register(&mut self, target_column: impl Into<String>, inverse: Inverse) { self.inverses.insert(target_column.into(), inverse); }

    pub fn inverse(&self, target_column: &str) -> Option<&Inverse> { self.inverses.get(target_column) }

    fn is_untransformed(&self, column: &str) -> bool { self.inverses.get(column).map(|i| i.untransformed).unwrap_or(false) }

    /// True when every column `filter` references has an untransformed
    /// inverse (or, for `ColumnToColumn`, both sides do), so pushing the
    /// filter to the source preserves its meaning exactly.
    pub fn can_push_filter(&self, filter: &Filter) -> bool { filter.columns().iter().all(|c| self.is_untransformed(c)) }

    /// Checks `kind`'s required column set against the registered inverses,
    /// returning the inverse mapper for that write path only if complete.
    pub fn mapper_for(&self, kind: InverseMapperKind, columns: &[String], dirty: &[String]) -> Option<&MappedTable> {
        let required: Vec<&String> = match kind {
            InverseMapperKind::PkOnly | InverseMapperKind::Full => columns.iter().collect(),
            InverseMapperKind::Update => dirty.iter().collect(),
        };
        if required.iter().all(|c| self.inverses.contains_key(c.as_str())) {
            Some(self)
        } else {
            None
        }
    }

    /// Renumber a target-side argument list into source-side values by
    /// applying each argument's column's inverse function, for the
    /// positional arguments named in `arg_columns` (index -> target
    /// column the argument was compared against). Returns `None` if any
    /// referenced column has no registered inverse.
    pub fn prepare_args(&self, arg_columns: &HashMap<u32, String>, args: &[Value]) -> Option<Vec<Value>> {
        args.iter()
            .enumerate()
            .map(|(i, v)| match arg_columns.get(&(i as u32)) {
                Some(column) => self.inverse(column).map(|inv| inv.apply(v)),
                None => Some(v.clone()),
            })
            .collect()
    }

    /// True when the whole `orderBy` can be pushed to the source: every
    /// term's column has an untransformed inverse, and the mapper itself
    /// does not filter rows out (a filtering mapper can change how many
    /// rows land in each position, invalidating a source-side sort).
    pub fn can_push_sort(&self, order_by: &[OrderTerm], mapper_filters: bool) -> bool {
        !mapper_filters && order_by.iter().all(|t| self.is_untransformed(&t.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relquery::Op;

    #[test]
    fn filter_pushes_down_only_when_every_column_has_untransformed_inverse() {
        let mut table = MappedTable::new();
        table.register("a", Inverse::identity());
        table.register("b", Inverse::transform(|v| v.clone()));

        let pushable = Filter::column_to_constant("a", Op::Eq, Value::I32(1));
        assert!(table.can_push_filter(&pushable));

        let not_pushable = Filter::column_to_constant("b", Op::Eq, Value::I32(1));
        assert!(!table.can_push_filter(&not_pushable));
    }

    #[test]
    fn mapper_for_pk_only_requires_just_key_columns() {
        let mut table = MappedTable::new();
        table.register("id", Inverse::identity());
        let columns = vec!["id".to_string(), "name".to_string()];
        assert!(table.mapper_for(InverseMapperKind::PkOnly, &["id".to_string()], &[]).is_some());
        assert!(table.mapper_for(InverseMapperKind::Full, &columns, &[]).is_none());
    }

    #[test]
    fn prepare_args_applies_inverse_to_referenced_argument() {
        let mut table = MappedTable::new();
        table.register("celsius", Inverse::transform(|v| match v {
            Value::F64(f) => Value::F64((f - 32.0) * 5.0 / 9.0),
            other => other.clone(),
        }));
        let arg_columns = HashMap::from([(0u32, "celsius".to_string())]);
        let args = vec![Value::F64(212.0)];
        let prepared = table.prepare_args(&arg_columns, &args).unwrap();
        assert_eq!(prepared[0], Value::F64(100.0));
    }

    #[test]
    fn sort_pushdown_requires_untransformed_inverse_and_non_filtering_mapper() {
        let mut table = MappedTable::new();
        table.register("a", Inverse::identity());
        let order = vec![OrderTerm::asc("a")];
        assert!(table.can_push_sort(&order, false));
        assert!(!table.can_push_sort(&order, true));
    }
}
