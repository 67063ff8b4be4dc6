//! Symbolic boolean predicate tree over column names, with normal-form
//! conversion, reduction, matching and argument manipulation.
//!
//! Grounded in `core/src/selection/filter.rs`'s predicate-evaluation shape;
//! the enum itself is authored directly from the spec's variant list since
//! the teacher snapshot's own `ankql::ast` was internally inconsistent
//! across the two styles present in the retrieved pack.

mod normal_form;
mod op;
mod reduce;

pub use op::Op;

use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    True,
    False,
    ColumnToArg { column: String, op: Op, arg: u32 },
    ColumnToColumn { a: String, op: Op, b: String },
    ColumnToConstant { column: String, op: Op, constant: Value },
    In { column: String, arg: u32 },
    AndGroup(Vec<Filter>),
    OrGroup(Vec<Filter>),
}

impl Filter {
    pub fn column_to_arg(column: impl Into<String>, op: Op, arg: u32) -> Filter {
        Filter::ColumnToArg { column: column.into(), op, arg }
    }

    pub fn column_to_column(a: impl Into<String>, op: Op, b: impl Into<String>) -> Filter {
        Filter::ColumnToColumn { a: a.into(), op, b: b.into() }
    }

    pub fn column_to_constant(column: impl Into<String>, op: Op, constant: Value) -> Filter {
        Filter::ColumnToConstant { column: column.into(), op, constant }
    }

    pub fn in_arg(column: impl Into<String>, arg: u32) -> Filter { Filter::In { column: column.into(), arg } }

    /// Complementation: `not(not(f)) == f` structurally (after flattening).
    ///
    /// `In` has no `Op` field of its own (it is always membership), so its
    /// negation is represented as `ColumnToArg` with `Op::NotIn`; flipping
    /// that back folds it into `In` again, keeping `not` an involution.
    pub fn not(&self) -> Filter {
        match self {
            Filter::True => Filter::False,
            Filter::False => Filter::True,
            Filter::ColumnToArg { column, op, arg } => {
                let flipped = op.flip();
                if flipped == Op::In {
                    Filter::In { column: column.clone(), arg: *arg }
                } else {
                    Filter::ColumnToArg { column: column.clone(), op: flipped, arg: *arg }
                }
            }
            Filter::ColumnToColumn { a, op, b } => Filter::ColumnToColumn { a: a.clone(), op: op.flip(), b: b.clone() },
            Filter::ColumnToConstant { column, op, constant } => {
                Filter::ColumnToConstant { column: column.clone(), op: op.flip(), constant: constant.clone() }
            }
            Filter::In { column, arg } => Filter::ColumnToArg { column: column.clone(), op: Op::NotIn, arg: *arg },
            Filter::AndGroup(children) => Filter::or_many(children.iter().map(Filter::not).collect()),
            Filter::OrGroup(children) => Filter::and_many(children.iter().map(Filter::not).collect()),
        }
    }

    /// Flattening conjunction: groups never nest a direct `AndGroup` child;
    /// an empty conjunction is `True`.
    pub fn and(&self, other: &Filter) -> Filter { Filter::and_many(vec![self.clone(), other.clone()]) }

    /// Flattening disjunction: groups never nest a direct `OrGroup` child;
    /// an empty disjunction is `False`.
    pub fn or(&self, other: &Filter) -> Filter { Filter::or_many(vec![self.clone(), other.clone()]) }

    pub fn and_many(terms: Vec<Filter>) -> Filter {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Filter::True => {}
                Filter::False => return Filter::False,
                Filter::AndGroup(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        dedupe(&mut flat);
        match flat.len() {
            0 => Filter::True,
            1 => flat.into_iter().next().unwrap(),
            _ => Filter::AndGroup(flat),
        }
    }

    pub fn or_many(terms: Vec<Filter>) -> Filter {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Filter::False => {}
                Filter::True => return Filter::True,
                Filter::OrGroup(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        dedupe(&mut flat);
        match flat.len() {
            0 => Filter::False,
            1 => flat.into_iter().next().unwrap(),
            _ => Filter::OrGroup(flat),
        }
    }

    /// Canonicalize sub-filter order so structurally-equal-up-to-permutation
    /// filters compare equal.
    pub fn sort(&self) -> Filter {
        match self {
            Filter::AndGroup(children) => {
                let mut sorted: Vec<Filter> = children.iter().map(Filter::sort).collect();
                sorted.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
                Filter::AndGroup(sorted)
            }
            Filter::OrGroup(children) => {
                let mut sorted: Vec<Filter> = children.iter().map(Filter::sort).collect();
                sorted.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
                Filter::OrGroup(sorted)
            }
            other => other.clone(),
        }
    }

    /// `+1` if `self` and `other` are equal modulo sub-order, `-1` if they are
    /// complementary, `0` if undecided.
    pub fn is_match(&self, other: &Filter) -> i32 {
        let a = self.reduce().sort();
        let b = other.reduce().sort();
        if a == b {
            1
        } else if a == b.not().reduce().sort() {
            -1
        } else {
            0
        }
    }

    /// Match `other` against `self` or any of its (possibly nested) sub-filters.
    pub fn is_sub_match(&self, other: &Filter) -> i32 {
        let direct = self.is_match(other);
        if direct != 0 {
            return direct;
        }
        match self {
            Filter::AndGroup(children) | Filter::OrGroup(children) => {
                for c in children {
                    let m = c.is_sub_match(other);
                    if m != 0 {
                        return m;
                    }
                }
                0
            }
            _ => 0,
        }
    }

    /// Drop terms referencing columns outside `keep`; column-to-column terms
    /// require both sides kept when `strict`, either side when not.
    /// Dropped terms are replaced by `undecided` (typically `True` or `False`
    /// depending on whether the caller wants a conservative over- or
    /// under-approximation).
    pub fn retain(&self, keep: &dyn Fn(&str) -> bool, strict: bool, undecided: &Filter) -> Filter {
        match self {
            Filter::True | Filter::False => self.clone(),
            Filter::ColumnToArg { column, .. } | Filter::ColumnToConstant { column, .. } | Filter::In { column, .. } => {
                if keep(column) {
                    self.clone()
                } else {
                    undecided.clone()
                }
            }
            Filter::ColumnToColumn { a, b, .. } => {
                let (ka, kb) = (keep(a), keep(b));
                let keep_term = if strict { ka && kb } else { ka || kb };
                if keep_term {
                    self.clone()
                } else {
                    undecided.clone()
                }
            }
            Filter::AndGroup(children) => Filter::and_many(children.iter().map(|c| c.retain(keep, strict, undecided)).collect()),
            Filter::OrGroup(children) => Filter::or_many(children.iter().map(|c| c.retain(keep, strict, undecided)).collect()),
        }
    }

    /// Renumber positional arguments through `f`.
    pub fn replace_arguments(&self, f: &dyn Fn(u32) -> u32) -> Filter {
        match self {
            Filter::ColumnToArg { column, op, arg } => Filter::ColumnToArg { column: column.clone(), op: *op, arg: f(*arg) },
            Filter::In { column, arg } => Filter::In { column: column.clone(), arg: f(*arg) },
            Filter::AndGroup(children) => Filter::AndGroup(children.iter().map(|c| c.replace_arguments(f)).collect()),
            Filter::OrGroup(children) => Filter::OrGroup(children.iter().map(|c| c.replace_arguments(f)).collect()),
            other => other.clone(),
        }
    }

    /// Convert embedded constants into positional arguments by calling `f`
    /// on each `ColumnToConstant` term; `f` returning `0` means "leave this
    /// term as a constant".
    pub fn constants_to_arguments(&self, f: &mut dyn FnMut(&Filter) -> u32) -> Filter {
        match self {
            Filter::ColumnToConstant { column, op, .. } => {
                let arg = f(self);
                if arg == 0 {
                    self.clone()
                } else {
                    Filter::ColumnToArg { column: column.clone(), op: *op, arg }
                }
            }
            Filter::AndGroup(children) => Filter::AndGroup(children.iter().map(|c| c.constants_to_arguments(f)).collect()),
            Filter::OrGroup(children) => Filter::OrGroup(children.iter().map(|c| c.constants_to_arguments(f)).collect()),
            other => other.clone(),
        }
    }

    /// Every column name referenced anywhere in this filter.
    pub fn columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_columns(&self, out: &mut Vec<String>) {
        match self {
            Filter::True | Filter::False => {}
            Filter::ColumnToArg { column, .. } | Filter::ColumnToConstant { column, .. } | Filter::In { column, .. } => {
                out.push(column.clone())
            }
            Filter::ColumnToColumn { a, b, .. } => {
                out.push(a.clone());
                out.push(b.clone());
            }
            Filter::AndGroup(children) | Filter::OrGroup(children) => {
                for c in children {
                    c.collect_columns(out);
                }
            }
        }
    }
}

fn sort_key(f: &Filter) -> String { format!("{f:?}") }

fn dedupe(terms: &mut Vec<Filter>) {
    let mut seen: Vec<Filter> = Vec::new();
    terms.retain(|t| {
        if seen.contains(t) {
            false
        } else {
            seen.push(t.clone());
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_eq_1() -> Filter { Filter::column_to_arg("a", Op::Eq, 1) }
    fn b_gt_2() -> Filter { Filter::column_to_arg("b", Op::Gt, 2) }

    #[test]
    fn not_is_involution() {
        let f = a_eq_1().and(&b_gt_2());
        assert_eq!(f.not().not(), f);
    }

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        assert_eq!(Filter::and_many(vec![]), Filter::True);
        assert_eq!(Filter::or_many(vec![]), Filter::False);
    }

    #[test]
    fn groups_flatten_same_kind_children() {
        let f = Filter::and_many(vec![a_eq_1(), Filter::and_many(vec![b_gt_2(), a_eq_1()])]);
        match f {
            Filter::AndGroup(children) => assert_eq!(children.len(), 2),
            other => panic!("expected flattened AndGroup, got {other:?}"),
        }
    }

    #[test]
    fn and_with_false_child_collapses() {
        assert_eq!(Filter::and_many(vec![a_eq_1(), Filter::False]), Filter::False);
    }

    #[test]
    fn is_match_detects_self_complement() {
        let f = a_eq_1();
        assert_eq!(f.is_match(&f.not()), -1);
        assert_eq!(f.is_match(&f), 1);
    }

    #[test]
    fn retain_drops_columns_outside_set() {
        let f = a_eq_1().and(&b_gt_2());
        let retained = f.retain(&|c| c == "a", false, &Filter::True);
        assert_eq!(retained, a_eq_1());
    }

    #[test]
    fn retain_column_to_column_strict_requires_both() {
        let f = Filter::column_to_column("a", Op::Eq, "b");
        let retained = f.retain(&|c| c == "a", true, &Filter::True);
        assert_eq!(retained, Filter::True);
        let retained_loose = f.retain(&|c| c == "a", false, &Filter::True);
        assert_eq!(retained_loose, f);
    }

    #[test]
    fn replace_arguments_renumbers() {
        let f = a_eq_1().and(&Filter::in_arg("b", 3));
        let renumbered = f.replace_arguments(&|n| n + 10);
        assert_eq!(renumbered, Filter::column_to_arg("a", Op::Eq, 11).and(&Filter::in_arg("b", 13)));
    }

    #[test]
    fn columns_are_deduped_and_sorted() {
        let f = a_eq_1().and(&Filter::column_to_column("b", Op::Eq, "a"));
        assert_eq!(f.columns(), vec!["a".to_string(), "b".to_string()]);
    }
}
