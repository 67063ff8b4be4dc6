//! The small, parser-agnostic struct the planner consumes. A textual query
//! language compiles down to this; this crate only owns the struct and a
//! handful of builders, not the grammar.

use crate::filter::Filter;

/// One entry of a `Projection`: the name the column carries in the output
/// row and the column it is read from. `name == source` for a plain,
/// unaliased projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    pub name: String,
    pub source: String,
}

/// Insertion-ordered `name -> source column` mapping. Order is preserved
/// because it determines output row layout; `QuerySpec::projection` being
/// `None` means "every column, in table order" rather than an empty
/// projection, which would mean "no columns".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection(Vec<ProjectedColumn>);

impl Projection {
    pub fn new() -> Self { Projection(Vec::new()) }

    /// Projection where each requested name is also its own source column.
    pub fn of(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut p = Projection::new();
        for n in names {
            let n = n.into();
            p.push(n.clone(), n);
        }
        p
    }

    pub fn push(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.0.push(ProjectedColumn { name: name.into(), source: source.into() });
    }

    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.push(name, source);
        self
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn columns(&self) -> impl Iterator<Item = &ProjectedColumn> { self.0.iter() }
    pub fn names(&self) -> Vec<&str> { self.0.iter().map(|c| c.name.as_str()).collect() }
    pub fn sources(&self) -> Vec<&str> { self.0.iter().map(|c| c.source.as_str()).collect() }
    pub fn contains(&self, name: &str) -> bool { self.0.iter().any(|c| c.name == name) }

    /// Whether every source column this projection reads from is reachable
    /// (a scan over some index can supply it without a join to primary).
    pub fn is_covered_by(&self, available: impl Fn(&str) -> bool) -> bool { self.0.iter().all(|c| available(c.source.as_str())) }
}

/// One `orderBy` term; `+g`/`-g` in the query-language notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: String,
    pub descending: bool,
}

impl OrderTerm {
    pub fn asc(column: impl Into<String>) -> Self { OrderTerm { column: column.into(), descending: false } }
    pub fn desc(column: impl Into<String>) -> Self { OrderTerm { column: column.into(), descending: true } }
}

/// `(projection?, orderBy?, filter)` — the parsed, not-yet-planned query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub projection: Option<Projection>,
    pub order_by: Vec<OrderTerm>,
    pub filter: Filter,
}

impl QuerySpec {
    pub fn new(filter: Filter) -> Self { QuerySpec { projection: None, order_by: Vec::new(), filter } }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderTerm>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Column names the filter, projection sources and order-by terms
    /// together reference — the full set a planner must be able to resolve.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut out = self.filter.columns();
        if let Some(p) = &self.projection {
            out.extend(p.sources().into_iter().map(String::from));
        }
        out.extend(self.order_by.iter().map(|t| t.column.clone()));
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Op;

    #[test]
    fn projection_of_is_identity_mapping() {
        let p = Projection::of(["a", "b"]);
        assert_eq!(p.names(), vec!["a", "b"]);
        assert_eq!(p.sources(), vec!["a", "b"]);
    }

    #[test]
    fn projection_none_means_all_columns() {
        let spec = QuerySpec::new(Filter::True);
        assert!(spec.projection.is_none());
    }

    #[test]
    fn is_covered_by_checks_every_source() {
        let p = Projection::new().with("out_a", "a").with("out_b", "b");
        assert!(p.is_covered_by(|c| c == "a" || c == "b"));
        assert!(!p.is_covered_by(|c| c == "a"));
    }

    #[test]
    fn referenced_columns_union_filter_projection_and_order() {
        let filter = Filter::column_to_arg("x", Op::Eq, 1);
        let spec = QuerySpec::new(filter)
            .with_projection(Projection::new().with("y_out", "y"))
            .with_order_by(vec![OrderTerm::asc("z")]);
        assert_eq!(spec.referenced_columns(), vec!["x", "y", "z"]);
    }
}
