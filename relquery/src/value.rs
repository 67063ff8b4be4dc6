use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::ConversionError;

/// The closed set of column/argument value types this crate understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Bool,
    String,
    BigInteger,
    BigDecimal,
    /// Fixed-length array of a primitive element type.
    Array(Box<ValueType>, usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Bool(bool),
    String(String),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    Array(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (F32(a), F32(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (String(a), String(b)) => a == b,
            (BigInteger(a), BigInteger(b)) => a == b,
            (BigDecimal(a), BigDecimal(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            _ => false,
        }
    }
}

impl ValueType {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Char(_) => ValueType::Char,
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
            Value::BigInteger(_) => ValueType::BigInteger,
            Value::BigDecimal(_) => ValueType::BigDecimal,
            Value::Array(items) => {
                let elem = items.first().map(|v| ValueType::of(v)).unwrap_or(ValueType::I64);
                ValueType::Array(Box::new(elem), items.len())
            }
        }
    }

    /// The value a non-nullable column of this type takes when unset.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::I8 => Value::I8(0),
            ValueType::I16 => Value::I16(0),
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::U8 => Value::U8(0),
            ValueType::U16 => Value::U16(0),
            ValueType::U32 => Value::U32(0),
            ValueType::U64 => Value::U64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
            ValueType::Char => Value::Char('\0'),
            ValueType::Bool => Value::Bool(false),
            ValueType::String => Value::String(std::string::String::new()),
            ValueType::BigInteger => Value::BigInteger(BigInt::from(0)),
            ValueType::BigDecimal => Value::BigDecimal(BigDecimal::from(0)),
            ValueType::Array(elem, len) => Value::Array(vec![elem.default_value(); *len]),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::I8(n) => write!(f, "{n}"),
            Value::I16(n) => write!(f, "{n}"),
            Value::I32(n) => write!(f, "{n}"),
            Value::I64(n) => write!(f, "{n}"),
            Value::U8(n) => write!(f, "{n}"),
            Value::U16(n) => write!(f, "{n}"),
            Value::U32(n) => write!(f, "{n}"),
            Value::U64(n) => write!(f, "{n}"),
            Value::F32(n) => write!(f, "{n}"),
            Value::F64(n) => write!(f, "{n}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::BigInteger(n) => write!(f, "{n}"),
            Value::BigDecimal(n) => write!(f, "{n}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! clamp_to_i64 {
    ($n:expr) => {{
        let n = $n;
        if n > i64::MAX as f64 {
            i64::MAX
        } else if n < i64::MIN as f64 {
            i64::MIN
        } else {
            n as i64
        }
    }};
}

impl Value {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(n) => Some(*n as i64),
            Value::I16(n) => Some(*n as i64),
            Value::I32(n) => Some(*n as i64),
            Value::I64(n) => Some(*n),
            Value::U8(n) => Some(*n as i64),
            Value::U16(n) => Some(*n as i64),
            Value::U32(n) => Some(*n as i64),
            Value::U64(n) => i64::try_from(*n).ok(),
            Value::F32(n) => Some(clamp_to_i64!(*n as f64)),
            Value::F64(n) => Some(clamp_to_i64!(*n)),
            Value::Bool(b) => Some(*b as i64),
            Value::Char(c) => c.to_digit(10).map(|d| d as i64),
            Value::BigInteger(n) => match n.to_i64() {
                Some(v) => Some(v),
                None => Some(if n.sign() == num_bigint::Sign::Minus { i64::MIN } else { i64::MAX }),
            },
            Value::BigDecimal(n) => match n.to_i64() {
                Some(v) => Some(v),
                None => Some(if n < &BigDecimal::from(0) { i64::MIN } else { i64::MAX }),
            },
            Value::String(s) => s.parse::<BigDecimal>().ok().and_then(|d| d.to_i64()),
            _ => None,
        }
    }

    /// Widened form of `as_i64` that never loses precision on `U64` (the one
    /// source type `i64` can't hold in full), used wherever a lossy target's
    /// clamp bound needs comparing against the source's true magnitude.
    fn as_i128(&self) -> Option<i128> {
        match self {
            Value::U64(n) => Some(*n as i128),
            other => other.as_i64().map(|n| n as i128),
        }
    }

    /// Branchless-in-spirit lossy conversion: clamps out-of-range numerics, truncates
    /// floats, maps parse failures to the target type's default. Never fails.
    pub fn convert_lossy(&self, target: &ValueType) -> Value {
        let source = ValueType::of(self);
        if &source == target {
            return self.clone();
        }
        macro_rules! clamp_int {
            ($ty:ty, $variant:ident) => {
                match self.as_i128() {
                    Some(n) => Value::$variant(n.clamp(<$ty>::MIN as i128, <$ty>::MAX as i128) as $ty),
                    None => target.default_value(),
                }
            };
        }
        match target {
            ValueType::I8 => clamp_int!(i8, I8),
            ValueType::I16 => clamp_int!(i16, I16),
            ValueType::I32 => clamp_int!(i32, I32),
            ValueType::I64 => match self.as_i128() {
                Some(n) => Value::I64(n.clamp(i64::MIN as i128, i64::MAX as i128) as i64),
                None => Value::I64(0),
            },
            ValueType::U8 => match self.as_i128() {
                Some(n) => Value::U8(n.clamp(0, u8::MAX as i128) as u8),
                None => Value::U8(0),
            },
            ValueType::U16 => match self.as_i128() {
                Some(n) => Value::U16(n.clamp(0, u16::MAX as i128) as u16),
                None => Value::U16(0),
            },
            ValueType::U32 => match self.as_i128() {
                Some(n) => Value::U32(n.clamp(0, u32::MAX as i128) as u32),
                None => Value::U32(0),
            },
            ValueType::U64 => match self.as_i128() {
                Some(n) => Value::U64(n.clamp(0, u64::MAX as i128) as u64),
                None => Value::U64(0),
            },
            ValueType::F32 => match self.as_i128() {
                Some(n) => Value::F32(n as f32),
                None => match self {
                    Value::F64(n) => Value::F32(*n as f32),
                    _ => Value::F32(0.0),
                },
            },
            ValueType::F64 => match self {
                Value::F32(n) => Value::F64(*n as f64),
                _ => match self.as_i128() {
                    Some(n) => Value::F64(n as f64),
                    None => Value::F64(0.0),
                },
            },
            ValueType::Bool => match self {
                Value::String(s) => Value::Bool(matches!(s.to_lowercase().as_str(), "true" | "1" | "t" | "yes" | "on")),
                Value::Char(c) => Value::Bool(match c {
                    't' | 'T' | '1' => true,
                    'f' | 'F' | '0' => false,
                    other => other.to_digit(10).map(|d| d != 0).unwrap_or(false),
                }),
                _ => match self.as_i128() {
                    Some(n) => Value::Bool(n != 0),
                    None => Value::Bool(false),
                },
            },
            ValueType::Char => match self {
                Value::String(s) => Value::Char(s.chars().next().unwrap_or('\0')),
                Value::Bool(b) => Value::Char(if *b { 't' } else { 'f' }),
                _ => match self.as_i64() {
                    Some(n) => Value::Char(char::from_u32(n as u32).unwrap_or('\0')),
                    None => Value::Char('\0'),
                },
            },
            ValueType::String => Value::String(self.to_string()),
            ValueType::BigInteger => match self {
                Value::BigDecimal(d) => Value::BigInteger(d.to_bigint().unwrap_or_default()),
                Value::String(s) => s.parse::<BigInt>().map(Value::BigInteger).unwrap_or(Value::BigInteger(BigInt::from(0))),
                _ => self.as_i64().map(|n| Value::BigInteger(BigInt::from(n))).unwrap_or(Value::BigInteger(BigInt::from(0))),
            },
            ValueType::BigDecimal => match self {
                Value::String(s) => s.parse::<BigDecimal>().map(Value::BigDecimal).unwrap_or(Value::BigDecimal(BigDecimal::from(0))),
                Value::BigInteger(n) => Value::BigDecimal(BigDecimal::from(n.clone())),
                Value::F64(n) => BigDecimal::try_from(*n).map(Value::BigDecimal).unwrap_or(Value::BigDecimal(BigDecimal::from(0))),
                _ => self.as_i64().map(|n| Value::BigDecimal(BigDecimal::from(n))).unwrap_or(Value::BigDecimal(BigDecimal::from(0))),
            },
            ValueType::Array(elem, len) => match self {
                Value::Array(items) => Value::Array(items.iter().map(|v| v.convert_lossy(elem)).take(*len).collect()),
                Value::String(s) if matches!(**elem, ValueType::Char) => {
                    Value::Array(s.chars().map(Value::Char).collect())
                }
                _ => Value::Array(vec![elem.default_value(); *len]),
            },
        }
    }

    /// Strict conversion: any loss of information is a `ConversionError`.
    pub fn convert_exact(&self, column: &str, target: &ValueType) -> Result<Value, ConversionError> {
        let source = ValueType::of(self);
        if &source == target {
            return Ok(self.clone());
        }
        let lossy = self.convert_lossy(target);
        let round_trips = match (&lossy, &source) {
            (Value::I8(n), _) => self.as_i64() == Some(*n as i64),
            (Value::I16(n), _) => self.as_i64() == Some(*n as i64),
            (Value::I32(n), _) => self.as_i64() == Some(*n as i64),
            (Value::I64(n), _) => self.as_i64() == Some(*n),
            (Value::U8(n), _) => self.as_i64() == Some(*n as i64),
            (Value::U16(n), _) => self.as_i64() == Some(*n as i64),
            (Value::U32(n), _) => self.as_i64() == Some(*n as i64),
            (Value::U64(n), _) => self.as_i64() == Some(*n as i64),
            (Value::Bool(_), Value::String(s)) => matches!(s.to_lowercase().as_str(), "true" | "false" | "1" | "0" | "t" | "f" | "yes" | "no" | "on" | "off"),
            (Value::BigDecimal(_), Value::String(s)) => s.parse::<BigDecimal>().is_ok(),
            (Value::BigInteger(_), Value::String(s)) => s.parse::<BigInt>().is_ok(),
            _ => true,
        };
        if round_trips {
            Ok(lossy)
        } else {
            Err(ConversionError::Lossy { column: column.to_string(), from: source, to: target.clone() })
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        use ValueType::*;
        match (self, other) {
            (I8, I8) | (I16, I16) | (I32, I32) | (I64, I64) | (U8, U8) | (U16, U16) | (U32, U32) | (U64, U64) | (F32, F32)
            | (F64, F64) | (Char, Char) | (Bool, Bool) | (String, String) | (BigInteger, BigInteger) | (BigDecimal, BigDecimal) => true,
            (Array(a, al), Array(b, bl)) => a == b && al == bl,
            _ => false,
        }
    }
}
impl Eq for ValueType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossy_clamps_instead_of_wrapping() {
        assert_eq!(Value::I64(i64::MAX).convert_lossy(&ValueType::I8), Value::I8(127));
        assert_eq!(Value::I64(i64::MIN).convert_lossy(&ValueType::I8), Value::I8(-128));
    }

    #[test]
    fn exact_rejects_loss() {
        assert!(Value::I64(1000).convert_exact("col", &ValueType::I8).is_err());
        assert_eq!(Value::I64(100).convert_exact("col", &ValueType::I8).unwrap(), Value::I8(100));
    }

    #[test]
    fn exact_in_range_boundaries() {
        assert!(Value::I64(127).convert_exact("col", &ValueType::I8).is_ok());
        assert!(Value::I64(-128).convert_exact("col", &ValueType::I8).is_ok());
        assert!(Value::I64(128).convert_exact("col", &ValueType::I8).is_err());
    }

    #[test]
    fn string_to_bool_variants() {
        assert_eq!(Value::String("yes".into()).convert_lossy(&ValueType::Bool), Value::Bool(true));
        assert_eq!(Value::String("off".into()).convert_lossy(&ValueType::Bool), Value::Bool(false));
        assert_eq!(Value::String("maybe".into()).convert_lossy(&ValueType::Bool), Value::Bool(false));
    }

    #[test]
    fn char_array_from_string() {
        let v = Value::String("hi".into()).convert_lossy(&ValueType::Array(Box::new(ValueType::Char), 2));
        assert_eq!(v, Value::Array(vec![Value::Char('h'), Value::Char('i')]));
    }

    #[test]
    fn char_to_bool_accepts_t_f_0_1() {
        assert_eq!(Value::Char('t').convert_lossy(&ValueType::Bool), Value::Bool(true));
        assert_eq!(Value::Char('1').convert_lossy(&ValueType::Bool), Value::Bool(true));
        assert_eq!(Value::Char('f').convert_lossy(&ValueType::Bool), Value::Bool(false));
        assert_eq!(Value::Char('0').convert_lossy(&ValueType::Bool), Value::Bool(false));
    }

    #[test]
    fn char_digit_converts_to_numeric() {
        assert_eq!(Value::Char('5').convert_lossy(&ValueType::I32), Value::I32(5));
        assert_eq!(Value::Char('x').convert_lossy(&ValueType::I32), Value::I32(0));
    }

    #[test]
    fn u64_above_i64_max_clamps_instead_of_defaulting() {
        assert_eq!(Value::U64(u64::MAX).convert_lossy(&ValueType::I8), Value::I8(127));
        assert_eq!(Value::U64(u64::MAX).convert_lossy(&ValueType::I64), Value::I64(i64::MAX));
        assert_eq!(Value::U64(u64::MAX).convert_lossy(&ValueType::F64), Value::F64(u64::MAX as f64));
    }
}
