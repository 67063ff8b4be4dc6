use super::op::{merge_and, merge_or, Merge, Op};
use super::Filter;
use crate::error::FilterError;
use crate::value::Value;

/// Default global complexity budget for filter reduction (spec §5: "~10^7 steps").
pub const DEFAULT_BUDGET: u64 = 10_000_000;

#[derive(Clone, PartialEq)]
enum Rhs {
    Arg(u32),
    Constant(Value),
    Column(String),
}

fn rhs_of(f: &Filter) -> Option<(String, Op, Rhs)> {
    match f {
        Filter::ColumnToArg { column, op, arg } if op.is_comparison() => Some((column.clone(), *op, Rhs::Arg(*arg))),
        Filter::ColumnToConstant { column, op, constant } if op.is_comparison() => {
            Some((column.clone(), *op, Rhs::Constant(constant.clone())))
        }
        Filter::ColumnToColumn { a, op, b } if op.is_comparison() => Some((a.clone(), *op, Rhs::Column(b.clone()))),
        _ => None,
    }
}

fn rhs_key(rhs: &Rhs) -> String {
    // Debug (not Display) so values of different types that render the same
    // text, e.g. `Value::I32(1)` vs `Value::I64(1)`, never fold into one key.
    match rhs {
        Rhs::Arg(n) => format!("arg:{n}"),
        Rhs::Constant(v) => format!("const:{v:?}"),
        Rhs::Column(c) => format!("col:{c}"),
    }
}

fn build_term(column: &str, op: Op, rhs: &Rhs) -> Filter {
    match rhs {
        Rhs::Arg(n) => Filter::ColumnToArg { column: column.to_string(), op, arg: *n },
        Rhs::Constant(v) => Filter::ColumnToConstant { column: column.to_string(), op, constant: v.clone() },
        Rhs::Column(b) => Filter::ColumnToColumn { a: column.to_string(), op, b: b.clone() },
    }
}

impl Filter {
    /// Reduce with the default complexity budget, falling back to the
    /// partially-reduced filter if the budget is exceeded (spec: "surface a
    /// typed complex signal and let the caller fall back to the unreduced
    /// form" — here the fallback is folded into the infallible entry point;
    /// `try_reduce` exposes the typed signal for callers that want it).
    pub fn reduce(&self) -> Filter {
        self.try_reduce(DEFAULT_BUDGET).unwrap_or_else(|err| {
            tracing::debug!(steps = err.steps, "filter reduction exceeded budget, falling back to unreduced form");
            self.clone()
        })
    }

    pub fn try_reduce(&self, budget: u64) -> Result<Filter, FilterError> {
        let mut steps = 0u64;
        reduce_step(self, &mut steps, budget)
    }
}

fn reduce_step(f: &Filter, steps: &mut u64, budget: u64) -> Result<Filter, FilterError> {
    *steps += 1;
    if *steps > budget {
        return Err(FilterError { steps: *steps });
    }
    match f {
        Filter::True | Filter::False | Filter::ColumnToArg { .. } | Filter::ColumnToColumn { .. } | Filter::ColumnToConstant { .. } | Filter::In { .. } => {
            Ok(f.clone())
        }
        Filter::AndGroup(children) => {
            let reduced: Vec<Filter> = children.iter().map(|c| reduce_step(c, steps, budget)).collect::<Result<_, _>>()?;
            reduce_group(reduced, true, steps, budget)
        }
        Filter::OrGroup(children) => {
            let reduced: Vec<Filter> = children.iter().map(|c| reduce_step(c, steps, budget)).collect::<Result<_, _>>()?;
            reduce_group(reduced, false, steps, budget)
        }
    }
}

/// Apply idempotence, complementation, absorption and operator-merge rules
/// to a flattened group of terms until a fixpoint (or the budget runs out).
fn reduce_group(children: Vec<Filter>, is_and: bool, steps: &mut u64, budget: u64) -> Result<Filter, FilterError> {
    let mut terms = if is_and { Filter::and_many(children) } else { Filter::or_many(children) };

    loop {
        *steps += 1;
        if *steps > budget {
            return Err(FilterError { steps: *steps });
        }
        let list = match &terms {
            Filter::AndGroup(c) if is_and => c.clone(),
            Filter::OrGroup(c) if !is_and => c.clone(),
            // Already collapsed to a single term, True, or False by and_many/or_many.
            other => return Ok(other.clone()),
        };

        // A op A' ⇒ True/False (complementation between any two direct children).
        for i in 0..list.len() {
            for j in (i + 1)..list.len() {
                if list[i].is_match(&list[j]) == -1 {
                    return Ok(if is_and { Filter::False } else { Filter::True });
                }
            }
        }

        // A ∨ (A ∧ B) ⇒ A / A ∧ (A ∨ B) ⇒ A: a literal elsewhere in the group
        // absorbs a sibling group that contains it verbatim.
        let mut absorbed = vec![false; list.len()];
        for i in 0..list.len() {
            if absorbed[i] {
                continue;
            }
            let is_opposite_group = match (&list[i], is_and) {
                (Filter::OrGroup(_), true) => true,
                (Filter::AndGroup(_), false) => true,
                _ => false,
            };
            if !is_opposite_group {
                continue;
            }
            for j in 0..list.len() {
                if i == j || absorbed[j] {
                    continue;
                }
                if list[i].is_sub_match(&list[j]) == 1 && !matches!(&list[j], Filter::AndGroup(_) | Filter::OrGroup(_)) {
                    absorbed[i] = true;
                    break;
                }
            }
        }
        let list: Vec<Filter> = list.into_iter().zip(absorbed).filter(|(_, a)| !a).map(|(f, _)| f).collect();

        // A ∨ (¬A ∧ B) ⇒ A ∨ B / A ∧ (¬A ∨ B) ⇒ A ∧ B: a literal elsewhere
        // in the group strips just its own negation out of a sibling
        // opposite-kind group, instead of the whole sibling being discarded.
        let (list, neg_absorbed) = apply_negative_absorption(list, is_and);

        // (A∧B) ∨ (A∧¬B) ⇒ A / (A∨B) ∧ (A∨¬B) ⇒ A: two opposite-kind sibling
        // groups that agree on every term but one complementary pair collapse
        // to their shared remainder.
        let (list, consensus_applied) = apply_consensus(list, is_and);

        // Operator merging on shared (column, rhs): idempotence, complementation,
        // and elimination fall out of the interval-lattice tables in `op.rs`.
        let mut merged: Vec<Filter> = Vec::with_capacity(list.len());
        let mut consumed = vec![false; list.len()];
        let mut changed = false;
        for i in 0..list.len() {
            if consumed[i] {
                continue;
            }
            let Some((col_i, op_i, rhs_i)) = rhs_of(&list[i]) else {
                merged.push(list[i].clone());
                continue;
            };
            let mut cur_op = op_i;
            let mut absorbed_any = false;
            for j in (i + 1)..list.len() {
                if consumed[j] {
                    continue;
                }
                let Some((col_j, op_j, rhs_j)) = rhs_of(&list[j]) else { continue };
                if col_j != col_i || rhs_key(&rhs_j) != rhs_key(&rhs_i) {
                    continue;
                }
                let merge = if is_and { merge_and(cur_op, op_j) } else { merge_or(cur_op, op_j) };
                match merge {
                    // `merge_and` only ever yields `Never` (this pair is
                    // unsatisfiable, annihilating the `and`) and `merge_or`
                    // only ever yields `Always` (this pair spans the whole
                    // domain, annihilating the `or`) — both collapse the
                    // group to its own annihilator: `False` for `and`, `True`
                    // for `or`.
                    Merge::Never | Merge::Always => return Ok(if is_and { Filter::False } else { Filter::True }),
                    Merge::Op(new_op) => {
                        cur_op = new_op;
                        consumed[j] = true;
                        absorbed_any = true;
                        changed = true;
                    }
                    Merge::Keep => {}
                }
            }
            if absorbed_any {
                merged.push(build_term(&col_i, cur_op, &rhs_i));
            } else {
                merged.push(list[i].clone());
            }
        }

        let rebuilt = if is_and { Filter::and_many(merged) } else { Filter::or_many(merged) };
        if !changed && !neg_absorbed && !consensus_applied && rebuilt == terms {
            return Ok(rebuilt);
        }
        terms = rebuilt;
    }
}

/// The children of `term` that would make it the "opposite kind" sibling a
/// group of `is_and` needs for absorption/consensus: an `OrGroup` inside an
/// `AndGroup`, or an `AndGroup` inside an `OrGroup`.
fn opposite_children(term: &Filter, is_and: bool) -> Option<&Vec<Filter>> {
    match (term, is_and) {
        (Filter::OrGroup(c), true) => Some(c),
        (Filter::AndGroup(c), false) => Some(c),
        _ => None,
    }
}

fn apply_negative_absorption(list: Vec<Filter>, is_and: bool) -> (Vec<Filter>, bool) {
    let literals: Vec<&Filter> = list.iter().filter(|f| !matches!(f, Filter::AndGroup(_) | Filter::OrGroup(_))).collect();
    let mut changed = false;
    let mut out = Vec::with_capacity(list.len());
    for item in &list {
        if let Some(children) = opposite_children(item, is_and) {
            if let Some(pos) = children.iter().position(|c| literals.iter().any(|lit| lit.is_match(c) == -1)) {
                let mut remaining = children.clone();
                remaining.remove(pos);
                out.push(if is_and { Filter::or_many(remaining) } else { Filter::and_many(remaining) });
                changed = true;
                continue;
            }
        }
        out.push(item.clone());
    }
    (out, changed)
}

fn sets_equal(a: &[Filter], b: &[Filter]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

fn apply_consensus(list: Vec<Filter>, is_and: bool) -> (Vec<Filter>, bool) {
    let mut out = Vec::with_capacity(list.len());
    let mut used = vec![false; list.len()];
    let mut changed = false;
    for i in 0..list.len() {
        if used[i] {
            continue;
        }
        let Some(children_i) = opposite_children(&list[i], is_and) else {
            out.push(list[i].clone());
            continue;
        };
        let mut collapsed = None;
        for j in (i + 1)..list.len() {
            if used[j] {
                continue;
            }
            let Some(children_j) = opposite_children(&list[j], is_and) else { continue };
            if children_i.is_empty() || children_i.len() != children_j.len() {
                continue;
            }
            let pair = children_i.iter().enumerate().find_map(|(pi, a)| {
                children_j.iter().enumerate().find(|(_, b)| a.is_match(b) == -1).map(|(pj, _)| (pi, pj))
            });
            let Some((pi, pj)) = pair else { continue };
            let remaining_i: Vec<Filter> = children_i.iter().enumerate().filter(|(idx, _)| *idx != pi).map(|(_, f)| f.clone()).collect();
            let remaining_j: Vec<Filter> = children_j.iter().enumerate().filter(|(idx, _)| *idx != pj).map(|(_, f)| f.clone()).collect();
            if sets_equal(&remaining_i, &remaining_j) {
                collapsed = Some((j, if is_and { Filter::or_many(remaining_i) } else { Filter::and_many(remaining_i) }));
                break;
            }
        }
        match collapsed {
            Some((j, common)) => {
                used[j] = true;
                out.push(common);
                changed = true;
            }
            None => out.push(list[i].clone()),
        }
    }
    (out, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Op;

    fn col(name: &str, op: Op, arg: u32) -> Filter { Filter::column_to_arg(name, op, arg) }

    #[test]
    fn idempotent_or_collapses() {
        let f = Filter::or_many(vec![col("a", Op::Eq, 1), col("a", Op::Eq, 1)]);
        assert_eq!(f.reduce(), col("a", Op::Eq, 1));
    }

    #[test]
    fn complementary_and_is_false() {
        let f = col("a", Op::Eq, 1).and(&col("a", Op::Eq, 1).not());
        assert_eq!(f.reduce(), Filter::False);
    }

    #[test]
    fn complementary_or_is_true() {
        let f = col("a", Op::Eq, 1).or(&col("a", Op::Eq, 1).not());
        assert_eq!(f.reduce(), Filter::True);
    }

    #[test]
    fn ne_and_ge_same_rhs_tightens_to_gt() {
        let f = col("a", Op::Ne, 1).and(&col("a", Op::Ge, 1));
        assert_eq!(f.reduce(), col("a", Op::Gt, 1));
    }

    #[test]
    fn absorption_removes_redundant_or_group() {
        let a = col("a", Op::Eq, 1);
        let b = col("b", Op::Eq, 2);
        // a ∨ (a ∧ b) ⇒ a
        let f = Filter::or_many(vec![a.clone(), a.and(&b)]);
        assert_eq!(f.reduce(), a);
    }

    #[test]
    fn negative_absorption_strips_just_the_negated_literal() {
        let a = col("a", Op::Eq, 1);
        let b = col("b", Op::Eq, 2);
        // a ∨ (¬a ∧ b) ⇒ a ∨ b
        let f = Filter::or_many(vec![a.clone(), a.not().and(&b)]);
        assert_eq!(f.reduce(), Filter::or_many(vec![a, b]).reduce());
    }

    #[test]
    fn consensus_collapses_complementary_and_groups() {
        let a = col("a", Op::Eq, 1);
        let b = col("b", Op::Eq, 2);
        // (a∧b) ∨ (a∧¬b) ⇒ a
        let f = Filter::or_many(vec![a.and(&b), a.and(&b.not())]);
        assert_eq!(f.reduce(), a);
    }

    #[test]
    fn reduce_is_idempotent_itself() {
        let f = col("a", Op::Eq, 1).and(&col("b", Op::Gt, 2));
        assert_eq!(f.reduce().reduce(), f.reduce());
    }

    #[test]
    fn double_negation_equals_self() {
        let f = col("a", Op::Eq, 1).and(&col("b", Op::Gt, 2));
        assert_eq!(f.not().not().reduce(), f.reduce());
    }
}
