//! Column metadata: the unit `RowInfo` and `ColumnCodec` are both built
//! from. Grounded on `core/src/indexing/key_spec.rs`'s `IndexKeyPart`
//! (direction/value-type/nulls) generalized with the nullability and
//! auto-generation fields the spec's `Column` adds on top.

use relquery::ValueType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn is_desc(&self) -> bool { matches!(self, Direction::Desc) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// Inclusive range an automatic-key generator picks an unused value from
/// (spec §4.9's key generator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
    pub direction: Direction,
    pub nulls: NullsOrder,
    pub automatic: bool,
    pub auto_range: Option<AutoRange>,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Column {
            name: name.into(),
            value_type,
            nullable: false,
            direction: Direction::Asc,
            nulls: NullsOrder::Last,
            automatic: false,
            auto_range: None,
        }
    }

    pub fn asc(name: impl Into<String>, value_type: ValueType) -> Self { Column::new(name, value_type) }

    pub fn desc(name: impl Into<String>, value_type: ValueType) -> Self {
        let mut c = Column::new(name, value_type);
        c.direction = Direction::Desc;
        c
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullsOrder::First;
        self
    }

    pub fn automatic(mut self, range: AutoRange) -> Self {
        self.automatic = true;
        self.auto_range = Some(range);
        self
    }

    /// Null header byte pair `(not_null, null)` for this column's direction
    /// and null ordering: spec §4.1, "chosen by `(descending XOR nullLow)`".
    pub fn null_headers(&self) -> (u8, u8) {
        const NOT_NULL_LO: u8 = 0x01;
        const NOT_NULL_HI: u8 = 0xFE;
        const NULL_LO: u8 = 0x00;
        const NULL_HI: u8 = 0xFF;
        let null_low = matches!(self.nulls, NullsOrder::First);
        if self.direction.is_desc() ^ null_low {
            (NOT_NULL_HI, NULL_HI)
        } else {
            (NOT_NULL_LO, NULL_LO)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_header_pair_flips_with_direction_xor_nulls_first() {
        let asc_last = Column::new("a", ValueType::I32);
        let desc_last = Column::desc("a", ValueType::I32);
        let asc_first = Column::new("a", ValueType::I32).nulls_first();
        assert_ne!(asc_last.null_headers(), desc_last.null_headers());
        assert_ne!(asc_last.null_headers(), asc_first.null_headers());
        assert_eq!(desc_last.null_headers(), asc_first.null_headers());
    }

    #[test]
    fn automatic_carries_its_range() {
        let c = Column::new("id", ValueType::I64).automatic(AutoRange { min: 1, max: 1000 });
        assert!(c.automatic);
        assert_eq!(c.auto_range, Some(AutoRange { min: 1, max: 1000 }));
    }
}
