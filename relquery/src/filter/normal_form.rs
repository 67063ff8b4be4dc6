use super::Filter;
use crate::error::FilterError;

/// Default ceiling on the number of DNF/CNF clauses a conversion may
/// produce before it gives up and returns `FilterError`; distribution over
/// nested `OrGroup`s inside `AndGroup`s is exponential in the worst case
/// (spec §4.3: "cap the clause count and fall back to the unreduced form").
pub const DEFAULT_CLAUSE_LIMIT: usize = 4096;

impl Filter {
    /// Disjunctive normal form: an `OrGroup` of `AndGroup`s of literals
    /// (never nested any deeper), reduced first so redundant clauses don't
    /// inflate the product.
    pub fn dnf(&self) -> Result<Filter, FilterError> { self.dnf_with_limit(DEFAULT_CLAUSE_LIMIT) }

    pub fn dnf_with_limit(&self, limit: usize) -> Result<Filter, FilterError> {
        let reduced = self.reduce();
        let mut steps = 0u64;
        let clauses = to_clauses(&reduced, limit, &mut steps)?;
        let ands: Vec<Filter> = clauses.into_iter().map(Filter::and_many).collect();
        Ok(Filter::or_many(ands).reduce())
    }

    /// Conjunctive normal form, obtained via De Morgan duality: the CNF of
    /// `f` is the negation of the DNF of `not(f)`, distributed back out.
    pub fn cnf(&self) -> Result<Filter, FilterError> { self.cnf_with_limit(DEFAULT_CLAUSE_LIMIT) }

    pub fn cnf_with_limit(&self, limit: usize) -> Result<Filter, FilterError> {
        let dnf_of_negation = self.not().dnf_with_limit(limit)?;
        Ok(dnf_of_negation.not().reduce())
    }
}

/// Distribute `f` (already reduced) into a list of conjunctive clauses,
/// each clause a list of literals. An `AndGroup` containing an `OrGroup`
/// child multiplies out via the cartesian product of that child's own
/// clause sets; `limit` bounds the total clause count across the whole
/// expansion so a pathological filter fails fast instead of allocating
/// an enormous clause list.
fn to_clauses(f: &Filter, limit: usize, steps: &mut u64) -> Result<Vec<Vec<Filter>>, FilterError> {
    *steps += 1;
    if *steps > limit as u64 {
        return Err(FilterError { steps: *steps });
    }
    match f {
        Filter::True => Ok(vec![vec![]]),
        Filter::False => Ok(vec![]),
        Filter::OrGroup(children) => {
            let mut out = Vec::new();
            for c in children {
                out.extend(to_clauses(c, limit, steps)?);
                if out.len() > limit {
                    return Err(FilterError { steps: *steps });
                }
            }
            Ok(out)
        }
        Filter::AndGroup(children) => {
            let mut acc: Vec<Vec<Filter>> = vec![vec![]];
            for c in children {
                let child_clauses = to_clauses(c, limit, steps)?;
                let mut next = Vec::with_capacity(acc.len() * child_clauses.len().max(1));
                for existing in &acc {
                    for clause in &child_clauses {
                        let mut merged = existing.clone();
                        merged.extend(clause.iter().cloned());
                        next.push(merged);
                        if next.len() > limit {
                            return Err(FilterError { steps: *steps });
                        }
                    }
                }
                acc = next;
            }
            Ok(acc)
        }
        literal => Ok(vec![vec![literal.clone()]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Op;

    fn col(name: &str, op: Op, arg: u32) -> Filter { Filter::column_to_arg(name, op, arg) }

    #[test]
    fn dnf_of_and_of_ors_distributes() {
        let a = col("a", Op::Eq, 1);
        let b = col("b", Op::Eq, 2);
        let c = col("c", Op::Eq, 3);
        let d = col("d", Op::Eq, 4);
        // (a ∨ b) ∧ (c ∨ d) → (a∧c) ∨ (a∧d) ∨ (b∧c) ∨ (b∧d)
        let f = a.or(&b).and(&c.or(&d));
        let dnf = f.dnf().unwrap();
        match dnf {
            Filter::OrGroup(clauses) => assert_eq!(clauses.len(), 4),
            other => panic!("expected a 4-clause OrGroup, got {other:?}"),
        }
    }

    #[test]
    fn dnf_already_in_dnf_is_unchanged_in_meaning() {
        let f = col("a", Op::Eq, 1).or(&col("b", Op::Gt, 2));
        let dnf = f.dnf().unwrap();
        assert_eq!(dnf.is_match(&f), 1);
    }

    #[test]
    fn cnf_is_dual_of_dnf_via_double_negation() {
        let a = col("a", Op::Eq, 1);
        let b = col("b", Op::Eq, 2);
        let f = a.and(&b);
        let cnf = f.cnf().unwrap();
        assert_eq!(cnf.is_match(&f), 1);
    }

    #[test]
    fn true_and_false_are_fixpoints() {
        assert_eq!(Filter::True.dnf().unwrap(), Filter::True);
        assert_eq!(Filter::False.dnf().unwrap(), Filter::False);
    }

    #[test]
    fn oversized_distribution_reports_filter_error() {
        let ors: Vec<Filter> = (0..20).map(|i| col(&format!("c{i}"), Op::Eq, i)).collect();
        let ands: Vec<Filter> = (0..20)
            .map(|i| Filter::or_many(ors.iter().map(|f| f.clone()).chain(std::iter::once(col("x", Op::Eq, i))).collect()))
            .collect();
        let f = Filter::and_many(ands);
        assert!(f.dnf_with_limit(64).is_err());
    }
}
