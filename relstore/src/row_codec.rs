//! Whole-row encode/decode: walks a `RowInfo`'s key then value columns,
//! dispatching each to `codec_for` (or `NullableCodec` when the column is
//! nullable) to build the key/value byte pair a `StorageBucket` stores, and
//! the inverse to rebuild a `RowValues` map from bytes a scan read back.
//! Grounded on `codec.rs`'s per-column codecs and `row::row_info::RowInfo`'s
//! key/value partition (spec §3, §4.1).

use crate::aggregate::RowValues;
use crate::codec::{codec_for, NullableCodec};
use crate::error::RowError;
use crate::row::{Column, RowInfo};

fn encode_column(column: &Column, values: &RowValues, out: &mut Vec<u8>) -> Result<(), RowError> {
    let codec = codec_for(&column.value_type, column.direction.is_desc());
    if column.nullable {
        let nullable = NullableCodec::new(codec, column.null_headers());
        nullable.encode_option(&column.name, values.get(&column.name), out)
    } else {
        let value = values.get(&column.name).ok_or_else(|| RowError::NotSet { column: column.name.clone() })?;
        codec.encode(&column.name, value, out)
    }
}

fn decode_column(column: &Column, bytes: &[u8], values: &mut RowValues) -> Result<usize, RowError> {
    let codec = codec_for(&column.value_type, column.direction.is_desc());
    if column.nullable {
        let nullable = NullableCodec::new(codec, column.null_headers());
        let (value, consumed) = nullable.decode_option(&column.name, bytes)?;
        // A null column is simply absent from the map -- `RowValues` uses
        // presence/absence as its `Option<Value>` encoding.
        if let Some(v) = value {
            values.insert(column.name.clone(), v);
        }
        Ok(consumed)
    } else {
        let (value, consumed) = codec.decode(&column.name, bytes)?;
        values.insert(column.name.clone(), value);
        Ok(consumed)
    }
}

/// Encode `columns` in order, each pulled out of `values` by name.
pub fn encode_columns(columns: &[Column], values: &RowValues) -> Result<Vec<u8>, RowError> {
    let mut out = Vec::new();
    for column in columns {
        encode_column(column, values, &mut out)?;
    }
    Ok(out)
}

/// Decode `columns` in order from the front of `bytes`, returning the
/// decoded values and the number of bytes consumed.
pub fn decode_columns(columns: &[Column], bytes: &[u8]) -> Result<(RowValues, usize), RowError> {
    let mut values = RowValues::new();
    let mut offset = 0;
    for column in columns {
        offset += decode_column(column, &bytes[offset..], &mut values)?;
    }
    Ok((values, offset))
}

/// Encode a full row into the `(key_bytes, value_bytes)` pair a
/// `StorageBucket::put` call takes.
pub fn encode_row(row_info: &RowInfo, values: &RowValues) -> Result<(Vec<u8>, Vec<u8>), RowError> {
    let key = encode_columns(row_info.key_columns(), values)?;
    let value = encode_columns(row_info.value_columns(), values)?;
    Ok((key, value))
}

/// Decode a full row from a storage key/value byte pair into one
/// `RowValues` map spanning both key and value columns.
pub fn decode_row(row_info: &RowInfo, key_bytes: &[u8], value_bytes: &[u8]) -> Result<RowValues, RowError> {
    let (mut values, _) = decode_columns(row_info.key_columns(), key_bytes)?;
    let (value_values, _) = decode_columns(row_info.value_columns(), value_bytes)?;
    values.extend(value_values);
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relquery::{Value, ValueType};

    fn sample_row_info() -> RowInfo {
        RowInfo::new(
            vec![Column::new("id", ValueType::I32)],
            vec![Column::new("name", ValueType::String), Column::new("nickname", ValueType::String).nullable()],
        )
        .unwrap()
    }

    #[test]
    fn row_round_trips_through_key_and_value_bytes() {
        let row_info = sample_row_info();
        let mut values = RowValues::new();
        values.insert("id".to_string(), Value::I32(7));
        values.insert("name".to_string(), Value::String("ada".into()));
        values.insert("nickname".to_string(), Value::String("ace".into()));

        let (key_bytes, value_bytes) = encode_row(&row_info, &values).unwrap();
        let decoded = decode_row(&row_info, &key_bytes, &value_bytes).unwrap();
        assert_eq!(decoded.get("id"), Some(&Value::I32(7)));
        assert_eq!(decoded.get("name"), Some(&Value::String("ada".into())));
        assert_eq!(decoded.get("nickname"), Some(&Value::String("ace".into())));
    }

    #[test]
    fn nullable_column_round_trips_null_as_absent_key() {
        let row_info = sample_row_info();
        let mut values = RowValues::new();
        values.insert("id".to_string(), Value::I32(1));
        values.insert("name".to_string(), Value::String("grace".into()));
        // "nickname" left unset -- encode_column must treat a missing key as null.

        let (key_bytes, value_bytes) = encode_row(&row_info, &values).unwrap();
        let decoded = decode_row(&row_info, &key_bytes, &value_bytes).unwrap();
        assert_eq!(decoded.get("nickname"), None);
        assert_eq!(decoded.get("name"), Some(&Value::String("grace".into())));
    }

    #[test]
    fn missing_non_nullable_column_is_an_error() {
        let row_info = sample_row_info();
        let mut values = RowValues::new();
        values.insert("id".to_string(), Value::I32(1));
        // "name" is non-nullable and missing.
        assert!(matches!(encode_row(&row_info, &values), Err(RowError::NotSet { .. })));
    }
}
