//! Conversion of typed result values into display strings.
//!
//! Every row coming back from a query is decoded into [`ColumnValue`]s and
//! rendered with exactly one formatting rule per variant. The CSV writer and
//! the terminal table both consume the strings produced here.

mod wire;

pub use wire::DecodeError;

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::{Date, FromSql, Kind, Timestamp, Type};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Timestamp(TimeValue),
    /// Exact NUMERIC text, including `NaN` and `Infinity`.
    Decimal(String),
    Text(String),
}

/// A point in time as the server typed it. TIMESTAMP and DATE carry no zone
/// and are printed without one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeValue {
    Zoned(DateTime<Utc>),
    Naive(NaiveDateTime),
    Date(NaiveDate),
    PosInfinity,
    NegInfinity,
}

impl ColumnValue {
    /// Decodes column `idx` of `row` according to its wire type.
    pub fn from_row(row: &Row, idx: usize) -> Result<ColumnValue> {
        let column = &row.columns()[idx];
        let raw: Option<RawValue<'_>> = row
            .try_get(idx)
            .map_err(|e| Error::database(format!("Could not decode column {}", idx), e))?;

        decode_value(column.type_(), raw.map(|r| r.0)).map_err(|e| Error::Decode {
            column: column.name().to_string(),
            type_name: column.type_().name().to_string(),
            message: e.to_string(),
        })
    }
}

// Borrows the binary value of any column type.
struct RawValue<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawValue<'a> {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, DecodeError> {
        Ok(RawValue(raw))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// Decodes one binary value of type `ty`; `None` is SQL NULL.
///
/// Types without a dedicated variant become [`ColumnValue::Text`] holding the
/// server's text form (json, uuid, interval, arrays, ...), or the bytea hex
/// form when the value is not UTF-8.
pub fn decode_value(ty: &Type, raw: Option<&[u8]>) -> std::result::Result<ColumnValue, DecodeError> {
    let Some(raw) = raw else {
        return Ok(ColumnValue::Null);
    };
    if let Kind::Domain(base) = ty.kind() {
        return decode_value(base, Some(raw));
    }

    let value = match ty {
        t if *t == Type::BOOL => ColumnValue::Bool(bool::from_sql(ty, raw)?),
        t if *t == Type::INT8 => ColumnValue::Int64(i64::from_sql(ty, raw)?),
        t if *t == Type::INT4 => ColumnValue::Int64(i64::from(i32::from_sql(ty, raw)?)),
        t if *t == Type::INT2 => ColumnValue::Int64(i64::from(i16::from_sql(ty, raw)?)),
        t if *t == Type::FLOAT8 => ColumnValue::Float64(f64::from_sql(ty, raw)?),
        t if *t == Type::FLOAT4 => ColumnValue::Float64(f64::from(f32::from_sql(ty, raw)?)),
        t if *t == Type::TIMESTAMPTZ => {
            ColumnValue::Timestamp(match Timestamp::<DateTime<Utc>>::from_sql(ty, raw)? {
                Timestamp::Value(v) => TimeValue::Zoned(v),
                Timestamp::PosInfinity => TimeValue::PosInfinity,
                Timestamp::NegInfinity => TimeValue::NegInfinity,
            })
        }
        t if *t == Type::TIMESTAMP => {
            ColumnValue::Timestamp(match Timestamp::<NaiveDateTime>::from_sql(ty, raw)? {
                Timestamp::Value(v) => TimeValue::Naive(v),
                Timestamp::PosInfinity => TimeValue::PosInfinity,
                Timestamp::NegInfinity => TimeValue::NegInfinity,
            })
        }
        t if *t == Type::DATE => ColumnValue::Timestamp(match Date::<NaiveDate>::from_sql(ty, raw)? {
            Date::Value(v) => TimeValue::Date(v),
            Date::PosInfinity => TimeValue::PosInfinity,
            Date::NegInfinity => TimeValue::NegInfinity,
        }),
        t if *t == Type::NUMERIC => ColumnValue::Decimal(wire::numeric_text(raw)?),
        _ => ColumnValue::Text(text_value(ty, raw)?),
    };

    Ok(value)
}

fn is_text(ty: &Type) -> bool {
    [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty)
}

fn text_value(ty: &Type, raw: &[u8]) -> std::result::Result<String, DecodeError> {
    if let Kind::Array(element) = ty.kind() {
        return wire::array_text(raw, &|bytes: &[u8]| {
            decode_value(element, Some(bytes)).map(|v| v.to_string())
        });
    }

    let text = match ty {
        t if is_text(t) => String::from_sql(ty, raw)?,
        t if *t == Type::JSONB => match raw.split_first() {
            Some((&1, json)) => std::str::from_utf8(json)?.to_string(),
            _ => return Err("unsupported jsonb version".into()),
        },
        t if *t == Type::UUID => wire::uuid_text(raw)?,
        t if *t == Type::INTERVAL => wire::interval_text(raw)?,
        t if *t == Type::OID => u32::from_sql(ty, raw)?.to_string(),
        t if *t == Type::CHAR => match i8::from_sql(ty, raw)? {
            0 => String::new(),
            c => char::from(c as u8).to_string(),
        },
        t if *t == Type::BYTEA => wire::bytea_text(raw),
        _ => match std::str::from_utf8(raw) {
            Ok(s) => s.to_string(),
            Err(_) => wire::bytea_text(raw),
        },
    };

    Ok(text)
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => Ok(()),
            ColumnValue::Bool(v) => write!(f, "{}", v),
            ColumnValue::Int64(v) => write!(f, "{}", v),
            ColumnValue::Float64(v) => f.write_str(&format_float32(*v)),
            ColumnValue::Timestamp(v) => write!(f, "{}", v),
            ColumnValue::Decimal(v) => f.write_str(&format_float32(decimal_to_f64(v))),
            ColumnValue::Text(v) => f.write_str(v),
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Zoned(v) => write!(f, "{}", v),
            TimeValue::Naive(v) => write!(f, "{}", v),
            TimeValue::Date(v) => write!(f, "{}", v),
            TimeValue::PosInfinity => f.write_str("infinity"),
            TimeValue::NegInfinity => f.write_str("-infinity"),
        }
    }
}

fn decimal_to_f64(text: &str) -> f64 {
    match text {
        "NaN" => f64::NAN,
        "Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        digits => digits.parse().unwrap_or(f64::NAN),
    }
}

/// Shortest fixed-notation string that round-trips the value at `f32`
/// precision. Doubles lose their low digits here.
pub fn format_float32(value: f64) -> String {
    let narrowed = value as f32;
    if narrowed.is_nan() {
        "NaN".to_string()
    } else if narrowed == f32::INFINITY {
        "+Inf".to_string()
    } else if narrowed == f32::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        narrowed.to_string()
    }
}

/// One display string per value, in order.
pub fn normalize(values: &[ColumnValue]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Decodes every column of a result row.
pub fn decode_row(row: &Row) -> Result<Vec<ColumnValue>> {
    (0..row.len()).map(|idx| ColumnValue::from_row(row, idx)).collect()
}
