//! Column codecs: how a single column's typed value turns into row bytes
//! and back. Grounded on `indexing/encoding.rs`'s `encode_component_typed`
//! (fixed-width big-endian ints/floats, `0x00`-escaped variable strings,
//! descending-column byte inversion), generalized into a trait so the row
//! layer can mix fixed-width and variable-width columns in one row without
//! the caller needing a match on value type at every call site.

use crate::collation::{escape_lex, invert_bytes, unescape_lex, Collatable};
use crate::error::RowError;
use relquery::{Value, ValueType};

/// How a column's bytes are laid out within a row.
pub trait ColumnCodec {
    /// Lower bound on `encode_size` — lets a row buffer preallocate.
    fn min_size(&self) -> usize;

    /// Exact encoded length for `value`. Must equal `encode`'s output length.
    fn encode_size(&self, value: &Value) -> usize;

    /// Append `value`'s encoding to `out`.
    fn encode(&self, column: &str, value: &Value, out: &mut Vec<u8>) -> Result<(), RowError>;

    /// Decode one value starting at `bytes[0]`, returning it and the number
    /// of bytes consumed.
    fn decode(&self, column: &str, bytes: &[u8]) -> Result<(Value, usize), RowError>;

    /// Like `decode` but skips reconstructing the `Value` — used when
    /// scanning past a column the caller doesn't need, e.g. projection.
    fn decode_skip(&self, column: &str, bytes: &[u8]) -> Result<usize, RowError> {
        self.decode(column, bytes).map(|(_, n)| n)
    }

    /// Whether this codec's encoding only ever appears as the last
    /// variable-width segment of a row (no length prefix, relies on the
    /// terminator or the end of the buffer).
    fn is_last(&self) -> bool { false }

    /// Whether this codec's byte order preserves value order, making it
    /// usable in a key column / range scan.
    fn is_lex(&self) -> bool { false }
}

fn width_mismatch(column: &str, expected: ValueType, got: &Value) -> RowError {
    RowError::Codec { column: column.to_string(), reason: format!("expected {expected:?}, got {:?}", ValueType::of(got)) }
}

macro_rules! fixed_codec {
    ($name:ident, $variant:ident, $ty:ty, $width:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub descending: bool,
        }

        impl $name {
            pub fn new(descending: bool) -> Self { $name { descending } }
        }

        impl ColumnCodec for $name {
            fn min_size(&self) -> usize { $width }
            fn encode_size(&self, _value: &Value) -> usize { $width }

            fn encode(&self, column: &str, value: &Value, out: &mut Vec<u8>) -> Result<(), RowError> {
                match value {
                    Value::$variant(_) => {
                        let mut bytes = value.to_bytes();
                        if self.descending {
                            bytes = invert_bytes(&bytes);
                        }
                        out.extend_from_slice(&bytes);
                        Ok(())
                    }
                    _ => Err(width_mismatch(column, ValueType::$variant, value)),
                }
            }

            fn decode(&self, column: &str, bytes: &[u8]) -> Result<(Value, usize), RowError> {
                if bytes.len() < $width {
                    return Err(RowError::Codec { column: column.to_string(), reason: "buffer too short".into() });
                }
                let mut raw = bytes[..$width].to_vec();
                if self.descending {
                    raw = invert_bytes(&raw);
                }
                let value = decode_sortable::<$ty>(&raw);
                Ok((value, $width))
            }

            fn is_lex(&self) -> bool { true }
        }
    };
}

// Decode the sortable big-endian encoding `Collatable` produces back into a
// typed value. Inverse of the sign-flip arithmetic in `collation.rs`.
fn decode_sortable<T>(raw: &[u8]) -> Value
where
    T: SortableDecode,
{
    T::decode(raw)
}

trait SortableDecode {
    fn decode(raw: &[u8]) -> Value;
}

impl SortableDecode for i8 {
    fn decode(raw: &[u8]) -> Value { Value::I8((raw[0] ^ 0x80) as i8) }
}
impl SortableDecode for i16 {
    fn decode(raw: &[u8]) -> Value {
        let n = u16::from_be_bytes([raw[0], raw[1]]);
        Value::I16((n ^ 0x8000) as i16)
    }
}
impl SortableDecode for i32 {
    fn decode(raw: &[u8]) -> Value {
        let n = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        Value::I32((n ^ 0x8000_0000) as i32)
    }
}
impl SortableDecode for i64 {
    fn decode(raw: &[u8]) -> Value {
        let n = u64::from_be_bytes(raw.try_into().unwrap());
        Value::I64((n ^ 0x8000_0000_0000_0000) as i64)
    }
}
impl SortableDecode for u8 {
    fn decode(raw: &[u8]) -> Value { Value::U8(raw[0]) }
}
impl SortableDecode for u16 {
    fn decode(raw: &[u8]) -> Value { Value::U16(u16::from_be_bytes([raw[0], raw[1]])) }
}
impl SortableDecode for u32 {
    fn decode(raw: &[u8]) -> Value { Value::U32(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])) }
}
impl SortableDecode for u64 {
    fn decode(raw: &[u8]) -> Value { Value::U64(u64::from_be_bytes(raw.try_into().unwrap())) }
}
impl SortableDecode for f32 {
    fn decode(raw: &[u8]) -> Value {
        let n = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64;
        Value::F32(decode_float_bits(n) as f32)
    }
}
impl SortableDecode for f64 {
    fn decode(raw: &[u8]) -> Value {
        let n = u64::from_be_bytes(raw.try_into().unwrap());
        Value::F64(decode_float_bits(n))
    }
}
impl SortableDecode for bool {
    fn decode(raw: &[u8]) -> Value { Value::Bool(raw[0] != 0) }
}
fn decode_float_bits(bits: u64) -> f64 {
    let restored = if bits & (1 << 63) != 0 { bits ^ (1 << 63) } else { !bits };
    f64::from_bits(restored)
}

fixed_codec!(I8Codec, I8, i8, 1);
fixed_codec!(I16Codec, I16, i16, 2);
fixed_codec!(I32Codec, I32, i32, 4);
fixed_codec!(I64Codec, I64, i64, 8);
fixed_codec!(U8Codec, U8, u8, 1);
fixed_codec!(U16Codec, U16, u16, 2);
fixed_codec!(U32Codec, U32, u32, 4);
fixed_codec!(U64Codec, U64, u64, 8);
fixed_codec!(F32Codec, F32, f32, 4);
fixed_codec!(F64Codec, F64, f64, 8);
fixed_codec!(BoolCodec, Bool, bool, 1);

/// A single UTF-8 scalar value. Self-delimiting (UTF-8's leading byte
/// encodes its own length), so unlike `String` it needs no terminator or
/// length prefix even in the middle of a row.
#[derive(Debug, Clone, Copy)]
pub struct CharCodec {
    pub descending: bool,
}

impl CharCodec {
    pub fn new(descending: bool) -> Self { CharCodec { descending } }

    fn utf8_len(lead: u8) -> usize {
        if lead & 0x80 == 0 {
            1
        } else if lead & 0xE0 == 0xC0 {
            2
        } else if lead & 0xF0 == 0xE0 {
            3
        } else {
            4
        }
    }
}

impl ColumnCodec for CharCodec {
    fn min_size(&self) -> usize { 1 }
    fn encode_size(&self, value: &Value) -> usize {
        match value {
            Value::Char(c) => c.len_utf8(),
            _ => 1,
        }
    }

    fn encode(&self, column: &str, value: &Value, out: &mut Vec<u8>) -> Result<(), RowError> {
        let Value::Char(c) = value else { return Err(width_mismatch(column, ValueType::Char, value)) };
        let mut buf = [0u8; 4];
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        if self.descending {
            out.extend(invert_bytes(bytes));
        } else {
            out.extend_from_slice(bytes);
        }
        Ok(())
    }

    fn decode(&self, column: &str, bytes: &[u8]) -> Result<(Value, usize), RowError> {
        if bytes.is_empty() {
            return Err(RowError::Codec { column: column.to_string(), reason: "empty buffer".into() });
        }
        let lead = if self.descending { 0xFFu8.wrapping_sub(bytes[0]) } else { bytes[0] };
        let len = Self::utf8_len(lead);
        if bytes.len() < len {
            return Err(RowError::Codec { column: column.to_string(), reason: "buffer too short".into() });
        }
        let raw = if self.descending { invert_bytes(&bytes[..len]) } else { bytes[..len].to_vec() };
        let s = std::str::from_utf8(&raw).map_err(|_| RowError::Codec { column: column.to_string(), reason: "invalid utf8".into() })?;
        let c = s.chars().next().ok_or_else(|| RowError::Codec { column: column.to_string(), reason: "empty char".into() })?;
        Ok((Value::Char(c), len))
    }

    fn is_lex(&self) -> bool { true }
}

/// UTF-8 string codec. `Lex` form is ordering-preserving (escaped, `0x00
/// 0x00`-terminated) and may only be used as the row's last variable-width
/// column; `Length` form is length-prefixed so it can appear anywhere but
/// doesn't sort correctly against other rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringForm {
    Lex,
    Length,
}

#[derive(Debug, Clone, Copy)]
pub struct StringCodec {
    pub form: StringForm,
    pub descending: bool,
}

impl StringCodec {
    pub fn lex(descending: bool) -> Self { StringCodec { form: StringForm::Lex, descending } }
    pub fn length_prefixed() -> Self { StringCodec { form: StringForm::Length, descending: false } }
}

impl ColumnCodec for StringCodec {
    fn min_size(&self) -> usize {
        match self.form {
            StringForm::Lex => 2,
            StringForm::Length => 4,
        }
    }

    fn encode_size(&self, value: &Value) -> usize {
        let s = match value {
            Value::String(s) => s,
            _ => return self.min_size(),
        };
        match self.form {
            StringForm::Lex => escape_lex(s.as_bytes()).len(),
            StringForm::Length => 4 + s.len(),
        }
    }

    fn encode(&self, column: &str, value: &Value, out: &mut Vec<u8>) -> Result<(), RowError> {
        let Value::String(s) = value else { return Err(width_mismatch(column, ValueType::String, value)) };
        match self.form {
            StringForm::Lex => {
                let mut bytes = escape_lex(s.as_bytes());
                if self.descending {
                    bytes = invert_bytes(&bytes);
                }
                out.extend_from_slice(&bytes);
            }
            StringForm::Length => {
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    fn decode(&self, column: &str, bytes: &[u8]) -> Result<(Value, usize), RowError> {
        match self.form {
            StringForm::Lex => {
                let raw = if self.descending { invert_bytes(bytes) } else { bytes.to_vec() };
                let (payload, consumed) = unescape_lex(&raw);
                let s = String::from_utf8(payload)
                    .map_err(|_| RowError::Codec { column: column.to_string(), reason: "invalid utf8".into() })?;
                Ok((Value::String(s), consumed))
            }
            StringForm::Length => {
                if bytes.len() < 4 {
                    return Err(RowError::Codec { column: column.to_string(), reason: "buffer too short".into() });
                }
                let len = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
                if bytes.len() < 4 + len {
                    return Err(RowError::Codec { column: column.to_string(), reason: "buffer too short".into() });
                }
                let s = String::from_utf8(bytes[4..4 + len].to_vec())
                    .map_err(|_| RowError::Codec { column: column.to_string(), reason: "invalid utf8".into() })?;
                Ok((Value::String(s), 4 + len))
            }
        }
    }

    fn is_last(&self) -> bool { self.form == StringForm::Lex }
    fn is_lex(&self) -> bool { self.form == StringForm::Lex }
}

/// LEX codec for `BigInteger`/`BigDecimal`, routed through their decimal
/// string representation the same way `collation::Value::to_bytes` does.
#[derive(Debug, Clone, Copy)]
pub struct BigNumberCodec {
    pub is_decimal: bool,
    pub descending: bool,
}

impl BigNumberCodec {
    pub fn integer(descending: bool) -> Self { BigNumberCodec { is_decimal: false, descending } }
    pub fn decimal(descending: bool) -> Self { BigNumberCodec { is_decimal: true, descending } }
}

impl ColumnCodec for BigNumberCodec {
    fn min_size(&self) -> usize { 2 }

    fn encode_size(&self, value: &Value) -> usize { value.to_bytes().len() }

    fn encode(&self, column: &str, value: &Value, out: &mut Vec<u8>) -> Result<(), RowError> {
        let expected = if self.is_decimal { ValueType::BigDecimal } else { ValueType::BigInteger };
        match (value, self.is_decimal) {
            (Value::BigInteger(_), false) | (Value::BigDecimal(_), true) => {
                let mut bytes = value.to_bytes();
                if self.descending {
                    bytes = invert_bytes(&bytes);
                }
                out.extend_from_slice(&bytes);
                Ok(())
            }
            _ => Err(width_mismatch(column, expected, value)),
        }
    }

    fn decode(&self, column: &str, bytes: &[u8]) -> Result<(Value, usize), RowError> {
        let raw = if self.descending { invert_bytes(bytes) } else { bytes.to_vec() };
        let (payload, consumed) = unescape_lex(&raw);
        let text = String::from_utf8(payload).map_err(|_| RowError::Codec { column: column.to_string(), reason: "invalid utf8".into() })?;
        let value = if self.is_decimal {
            Value::BigDecimal(text.parse().map_err(|_| RowError::Codec { column: column.to_string(), reason: "invalid decimal".into() })?)
        } else {
            Value::BigInteger(text.parse().map_err(|_| RowError::Codec { column: column.to_string(), reason: "invalid integer".into() })?)
        };
        Ok((value, consumed))
    }

    fn is_last(&self) -> bool { true }
    fn is_lex(&self) -> bool { true }
}

/// Length-prefixed array of a fixed-width element codec.
pub struct ArrayCodec {
    pub element: Box<dyn ColumnCodec + Send + Sync>,
}

impl ArrayCodec {
    pub fn new(element: Box<dyn ColumnCodec + Send + Sync>) -> Self { ArrayCodec { element } }
}

impl ColumnCodec for ArrayCodec {
    fn min_size(&self) -> usize { 4 }

    fn encode_size(&self, value: &Value) -> usize {
        match value {
            Value::Array(items) => 4 + items.iter().map(|v| self.element.encode_size(v)).sum::<usize>(),
            _ => 4,
        }
    }

    fn encode(&self, column: &str, value: &Value, out: &mut Vec<u8>) -> Result<(), RowError> {
        let Value::Array(items) = value else { return Err(width_mismatch(column, ValueType::Array(Box::new(ValueType::I64), 0), value)) };
        out.extend_from_slice(&(items.len() as u32).to_be_bytes());
        for item in items {
            self.element.encode(column, item, out)?;
        }
        Ok(())
    }

    fn decode(&self, column: &str, bytes: &[u8]) -> Result<(Value, usize), RowError> {
        if bytes.len() < 4 {
            return Err(RowError::Codec { column: column.to_string(), reason: "buffer too short".into() });
        }
        let count = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
        let mut offset = 4;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let (value, consumed) = self.element.decode(column, &bytes[offset..])?;
            offset += consumed;
            items.push(value);
        }
        Ok((Value::Array(items), offset))
    }
}

/// Schema-version pseudo-column prefixed to every encoded row: 1 byte if
/// `version < 128`, otherwise a 4-byte big-endian value with the high bit
/// set, so a reader can tell the two widths apart from the first byte alone.
pub struct SchemaVersionCodec;

impl SchemaVersionCodec {
    pub fn encode(version: u32) -> Vec<u8> {
        if version < 128 {
            vec![version as u8]
        } else {
            let mut bytes = (version | 0x8000_0000).to_be_bytes().to_vec();
            bytes[0] |= 0x80;
            bytes
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<(u32, usize), RowError> {
        match bytes.first() {
            Some(b) if b & 0x80 == 0 => Ok((*b as u32, 1)),
            Some(_) => {
                if bytes.len() < 4 {
                    return Err(RowError::Codec { column: "$schema_version".into(), reason: "buffer too short".into() });
                }
                let n = u32::from_be_bytes(bytes[..4].try_into().unwrap()) & 0x7FFF_FFFF;
                Ok((n, 4))
            }
            None => Err(RowError::Codec { column: "$schema_version".into(), reason: "empty buffer".into() }),
        }
    }
}

/// Wraps any column codec with the column's null-header byte pair (spec
/// §4.1: "a null-header byte, chosen by `(descending XOR nullLow)`,
/// precedes the value"). Kept as a wrapper rather than widening
/// `ColumnCodec` itself to take `Option<&Value>`, since that would touch
/// every existing fixed/variable-width impl including the `fixed_codec!`
/// macro for no benefit to the non-nullable majority of columns.
pub struct NullableCodec {
    inner: Box<dyn ColumnCodec + Send + Sync>,
    not_null: u8,
    null: u8,
}

impl NullableCodec {
    pub fn new(inner: Box<dyn ColumnCodec + Send + Sync>, null_headers: (u8, u8)) -> Self {
        let (not_null, null) = null_headers;
        NullableCodec { inner, not_null, null }
    }

    pub fn encode_option(&self, column: &str, value: Option<&Value>, out: &mut Vec<u8>) -> Result<(), RowError> {
        match value {
            Some(v) => {
                out.push(self.not_null);
                self.inner.encode(column, v, out)
            }
            None => {
                out.push(self.null);
                Ok(())
            }
        }
    }

    pub fn decode_option(&self, column: &str, bytes: &[u8]) -> Result<(Option<Value>, usize), RowError> {
        let header = *bytes.first().ok_or_else(|| RowError::Codec { column: column.to_string(), reason: "empty buffer".into() })?;
        if header == self.null {
            Ok((None, 1))
        } else {
            let (value, consumed) = self.inner.decode(column, &bytes[1..])?;
            Ok((Some(value), 1 + consumed))
        }
    }
}

/// Build the codec the row layer should use for a column of the given type
/// and direction. Variable-width types default to the LEX form so key
/// columns sort correctly; callers building a value-only (non-key) layout
/// should use `StringCodec::length_prefixed` directly instead.
pub fn codec_for(value_type: &ValueType, descending: bool) -> Box<dyn ColumnCodec + Send + Sync> {
    match value_type {
        ValueType::I8 => Box::new(I8Codec::new(descending)),
        ValueType::I16 => Box::new(I16Codec::new(descending)),
        ValueType::I32 => Box::new(I32Codec::new(descending)),
        ValueType::I64 => Box::new(I64Codec::new(descending)),
        ValueType::U8 => Box::new(U8Codec::new(descending)),
        ValueType::U16 => Box::new(U16Codec::new(descending)),
        ValueType::U32 => Box::new(U32Codec::new(descending)),
        ValueType::U64 => Box::new(U64Codec::new(descending)),
        ValueType::F32 => Box::new(F32Codec::new(descending)),
        ValueType::F64 => Box::new(F64Codec::new(descending)),
        ValueType::Bool => Box::new(BoolCodec::new(descending)),
        ValueType::Char => Box::new(CharCodec::new(descending)),
        ValueType::String => Box::new(StringCodec::lex(descending)),
        ValueType::BigInteger => Box::new(BigNumberCodec::integer(descending)),
        ValueType::BigDecimal => Box::new(BigNumberCodec::decimal(descending)),
        ValueType::Array(elem, _) => Box::new(ArrayCodec::new(codec_for(elem, descending))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i32_round_trips_through_ascending_codec() {
        let codec = I32Codec::new(false);
        let mut buf = Vec::new();
        codec.encode("n", &Value::I32(-42), &mut buf).unwrap();
        let (value, consumed) = codec.decode("n", &buf).unwrap();
        assert_eq!(value, Value::I32(-42));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn descending_codec_preserves_value_but_inverts_ordering() {
        let codec = I32Codec::new(true);
        let mut low = Vec::new();
        let mut high = Vec::new();
        codec.encode("n", &Value::I32(1), &mut low).unwrap();
        codec.encode("n", &Value::I32(2), &mut high).unwrap();
        assert!(low > high);
        let (decoded, _) = codec.decode("n", &low).unwrap();
        assert_eq!(decoded, Value::I32(1));
    }

    #[test]
    fn i8_codec_sorts_correctly_across_zero() {
        let codec = I8Codec::new(false);
        let mut neg = Vec::new();
        let mut zero = Vec::new();
        let mut pos = Vec::new();
        codec.encode("n", &Value::I8(-5), &mut neg).unwrap();
        codec.encode("n", &Value::I8(0), &mut zero).unwrap();
        codec.encode("n", &Value::I8(5), &mut pos).unwrap();
        assert!(neg < zero);
        assert!(zero < pos);
    }

    #[test]
    fn char_codec_round_trips_multibyte() {
        let codec = CharCodec::new(false);
        let mut buf = Vec::new();
        codec.encode("c", &Value::Char('π'), &mut buf).unwrap();
        let (value, consumed) = codec.decode("c", &buf).unwrap();
        assert_eq!(value, Value::Char('π'));
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn string_lex_codec_round_trips_and_sorts() {
        let codec = StringCodec::lex(false);
        let mut a = Vec::new();
        let mut b = Vec::new();
        codec.encode("s", &Value::String("abc".into()), &mut a).unwrap();
        codec.encode("s", &Value::String("abd".into()), &mut b).unwrap();
        assert!(a < b);
        let (value, consumed) = codec.decode("s", &a).unwrap();
        assert_eq!(value, Value::String("abc".into()));
        assert_eq!(consumed, a.len());
    }

    #[test]
    fn string_length_prefixed_allows_embedded_nul() {
        let codec = StringCodec::length_prefixed();
        let mut buf = Vec::new();
        codec.encode("s", &Value::String("a\0b".into()), &mut buf).unwrap();
        let (value, consumed) = codec.decode("s", &buf).unwrap();
        assert_eq!(value, Value::String("a\0b".into()));
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn big_integer_codec_round_trips() {
        let codec = BigNumberCodec::integer(false);
        let n = Value::BigInteger("123456789012345678901234567890".parse().unwrap());
        let mut buf = Vec::new();
        codec.encode("n", &n, &mut buf).unwrap();
        let (decoded, _) = codec.decode("n", &buf).unwrap();
        assert_eq!(decoded, n);
    }

    #[test]
    fn array_codec_round_trips_variable_length() {
        let codec = ArrayCodec::new(Box::new(I32Codec::new(false)));
        let value = Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        let mut buf = Vec::new();
        codec.encode("a", &value, &mut buf).unwrap();
        let (decoded, consumed) = codec.decode("a", &buf).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn nullable_codec_round_trips_null_and_value() {
        use crate::row::Column;
        let column = Column::new("age", relquery::ValueType::I32).nullable();
        let codec = NullableCodec::new(codec_for(&column.value_type, false), column.null_headers());

        let mut present = Vec::new();
        codec.encode_option("age", Some(&Value::I32(30)), &mut present).unwrap();
        let (value, consumed) = codec.decode_option("age", &present).unwrap();
        assert_eq!(value, Some(Value::I32(30)));
        assert_eq!(consumed, present.len());

        let mut absent = Vec::new();
        codec.encode_option("age", None, &mut absent).unwrap();
        let (value, consumed) = codec.decode_option("age", &absent).unwrap();
        assert_eq!(value, None);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn nullable_codec_null_header_sorts_against_nulls_order() {
        use crate::row::Column;
        let nulls_last = Column::new("age", relquery::ValueType::I32).nullable();
        let codec = NullableCodec::new(codec_for(&nulls_last.value_type, false), nulls_last.null_headers());
        let mut null_bytes = Vec::new();
        codec.encode_option("age", None, &mut null_bytes).unwrap();
        let mut value_bytes = Vec::new();
        codec.encode_option("age", Some(&Value::I32(i32::MIN)), &mut value_bytes).unwrap();
        assert!(null_bytes > value_bytes, "nulls-last column should sort null after any value");
    }

    #[test]
    fn schema_version_switches_width_at_128() {
        assert_eq!(SchemaVersionCodec::encode(5).len(), 1);
        assert_eq!(SchemaVersionCodec::encode(200).len(), 4);
        let (v, n) = SchemaVersionCodec::decode(&SchemaVersionCodec::encode(5)).unwrap();
        assert_eq!((v, n), (5, 1));
        let (v, n) = SchemaVersionCodec::decode(&SchemaVersionCodec::encode(200)).unwrap();
        assert_eq!((v, n), (200, 4));
    }
}
