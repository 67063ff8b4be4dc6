use serde::{Deserialize, Serialize};

/// Comparison operators a filter term can carry.
///
/// `Eq`/`Ne`, `Ge`/`Lt`, `Le`/`Gt`, `In`/`NotIn` are complementary pairs:
/// `flip()` maps within a pair, mirroring the spec's `flip(op) = op ^ 1`
/// bit-pairing (expressed here as an explicit match rather than a literal
/// XOR, since Rust enums aren't bit patterns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Op {
    Eq,
    Ne,
    Ge,
    Lt,
    Le,
    Gt,
    In,
    NotIn,
}

impl Op {
    /// The complementary operator: `a op b` is false exactly when `a flip(op) b` is true.
    pub fn flip(self) -> Op {
        match self {
            Op::Eq => Op::Ne,
            Op::Ne => Op::Eq,
            Op::Ge => Op::Lt,
            Op::Lt => Op::Ge,
            Op::Le => Op::Gt,
            Op::Gt => Op::Le,
            Op::In => Op::NotIn,
            Op::NotIn => Op::In,
        }
    }

    /// The operator obtained by swapping the two operands: `a op b` ⇔ `b reverse(op) a`.
    pub fn reverse(self) -> Op {
        match self {
            Op::Eq => Op::Eq,
            Op::Ne => Op::Ne,
            Op::Ge => Op::Le,
            Op::Le => Op::Ge,
            Op::Lt => Op::Gt,
            Op::Gt => Op::Lt,
            Op::In => Op::In,
            Op::NotIn => Op::NotIn,
        }
    }

    /// Whether this operator participates in the scalar-comparison merge
    /// lattice (`Eq`/`Ne`/`Ge`/`Lt`/`Le`/`Gt`). `In`/`NotIn` never merge with
    /// another term: they describe set membership, not an interval.
    pub fn is_comparison(self) -> bool { !matches!(self, Op::In | Op::NotIn) }
}

/// Result of merging two same-column, same-rhs comparison terms.
pub enum Merge {
    /// Collapses to this single operator.
    Op(Op),
    /// Collapses to the identity element (`True` for `or`, `False` for `and`
    /// would be named by the caller; this variant means "whole domain").
    Always,
    /// Collapses to the empty element ("no values satisfy").
    Never,
    /// No simplification; keep both terms.
    Keep,
}

/// Intersection of the intervals `a` and `b` describe over the same `(column, rhs)`.
/// Grounds the spec's "operator merging ... via two 6×6 tables" as the actual
/// interval-lattice computation rather than a literal hardcoded table, since the
/// spec's one illustrative entry (`>=∧< → <`) does not hold for a shared rhs and
/// the lattice below is the correct and complete closure.
pub fn merge_and(a: Op, b: Op) -> Merge {
    use Op::*;
    let (a, b) = if a as u8 <= b as u8 { (a, b) } else { (b, a) };
    match (a, b) {
        (Eq, Eq) => Merge::Op(Eq),
        (Eq, Ne) => Merge::Never,
        (Eq, Ge) => Merge::Op(Eq),
        (Eq, Lt) => Merge::Never,
        (Eq, Le) => Merge::Op(Eq),
        (Eq, Gt) => Merge::Never,
        (Ne, Ne) => Merge::Op(Ne),
        (Ne, Ge) => Merge::Op(Gt),
        (Ne, Lt) => Merge::Op(Lt),
        (Ne, Le) => Merge::Op(Lt),
        (Ne, Gt) => Merge::Op(Gt),
        (Ge, Ge) => Merge::Op(Ge),
        (Ge, Lt) => Merge::Never,
        (Ge, Le) => Merge::Op(Eq),
        (Ge, Gt) => Merge::Op(Gt),
        (Lt, Lt) => Merge::Op(Lt),
        (Lt, Le) => Merge::Op(Lt),
        (Lt, Gt) => Merge::Never,
        (Le, Le) => Merge::Op(Le),
        (Le, Gt) => Merge::Never,
        (Gt, Gt) => Merge::Op(Gt),
        (In, In) => Merge::Op(In),
        (NotIn, NotIn) => Merge::Op(NotIn),
        (In, NotIn) => Merge::Never,
        _ => Merge::Keep,
    }
}

/// Union of the intervals `a` and `b` describe over the same `(column, rhs)`.
pub fn merge_or(a: Op, b: Op) -> Merge {
    use Op::*;
    let (a, b) = if a as u8 <= b as u8 { (a, b) } else { (b, a) };
    match (a, b) {
        (Eq, Eq) => Merge::Op(Eq),
        (Eq, Ne) => Merge::Always,
        (Eq, Ge) => Merge::Op(Ge),
        (Eq, Lt) => Merge::Op(Le),
        (Eq, Le) => Merge::Op(Le),
        (Eq, Gt) => Merge::Op(Ge),
        (Ne, Ne) => Merge::Op(Ne),
        (Ne, Ge) => Merge::Always,
        (Ne, Lt) => Merge::Op(Ne),
        (Ne, Le) => Merge::Always,
        (Ne, Gt) => Merge::Op(Ne),
        (Ge, Ge) => Merge::Op(Ge),
        (Ge, Lt) => Merge::Always,
        (Ge, Le) => Merge::Always,
        (Ge, Gt) => Merge::Op(Ge),
        (Lt, Lt) => Merge::Op(Lt),
        (Lt, Le) => Merge::Op(Le),
        (Lt, Gt) => Merge::Op(Ne),
        (Le, Le) => Merge::Op(Le),
        (Le, Gt) => Merge::Always,
        (Gt, Gt) => Merge::Op(Gt),
        (In, In) => Merge::Op(In),
        (NotIn, NotIn) => Merge::Op(NotIn),
        (In, NotIn) => Merge::Always,
        _ => Merge::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_is_involution() {
        for op in [Op::Eq, Op::Ne, Op::Ge, Op::Lt, Op::Le, Op::Gt, Op::In, Op::NotIn] {
            assert_eq!(op.flip().flip(), op);
            assert_ne!(op.flip(), op);
        }
    }

    #[test]
    fn reverse_swaps_directional_pairs() {
        assert_eq!(Op::Lt.reverse(), Op::Gt);
        assert_eq!(Op::Ge.reverse(), Op::Le);
        assert_eq!(Op::Eq.reverse(), Op::Eq);
    }

    #[test]
    fn eq_and_ne_same_rhs_is_unsatisfiable() {
        assert!(matches!(merge_and(Op::Eq, Op::Ne), Merge::Never));
    }

    #[test]
    fn ge_or_lt_same_rhs_is_tautology() {
        assert!(matches!(merge_or(Op::Ge, Op::Lt), Merge::Always));
    }

    #[test]
    fn ne_and_ge_same_rhs_tightens_to_gt() {
        assert!(matches!(merge_and(Op::Ne, Op::Ge), Merge::Op(Op::Gt)));
    }
}
