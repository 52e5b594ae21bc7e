use std::{error::Error, fmt, str::FromStr};

use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type as PgType};

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_TIMESTAMP_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];
const OFFSET_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%dT%H:%M%#z",
];

type ToSqlResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// A single scalar bound to a statement placeholder.
///
/// Records only carry integers, floats and strings. The server decides the placeholder type
/// from the target column, so the encoding happens against that type at execution time rather
/// than when the value is built. A value that does not fit its column (a malformed date, an
/// integer too wide for `INT4`) surfaces as a store error there.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn raw_name(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "Int",
            SqlValue::Float(_) => "Float",
            SqlValue::Text(_) => "Text",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Int(value) => write!(f, "{}", value),
            SqlValue::Float(value) => write!(f, "{}", value),
            SqlValue::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

fn is_text_type(ty: &PgType) -> bool {
    matches!(*ty, PgType::TEXT | PgType::VARCHAR | PgType::BPCHAR | PgType::NAME | PgType::UNKNOWN)
}

fn wrong_type(value: &SqlValue, ty: &PgType) -> Box<dyn Error + Sync + Send> {
    format!("can not encode {} value \"{}\" as postgres type {}", value.raw_name(), value, ty).into()
}

/// Naive layouts, then a bare date at midnight.
fn parse_naive_timestamp(value: &str) -> Option<NaiveDateTime> {
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?.and_hms_opt(0, 0, 0))
}

fn parse_offset_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        OFFSET_TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(value, format).ok())
    })
}

/// A `TIMESTAMP` column ignores any offset in the input, as postgres does for text.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, Box<dyn Error + Sync + Send>> {
    parse_naive_timestamp(value)
        .or_else(|| parse_offset_timestamp(value).map(|timestamp| timestamp.naive_local()))
        .ok_or_else(|| format!("\"{}\" is not a valid timestamp", value).into())
}

fn parse_timestamp_tz(value: &str) -> Result<DateTime<Utc>, Box<dyn Error + Sync + Send>> {
    match parse_offset_timestamp(value) {
        Some(timestamp) => Ok(timestamp.with_timezone(&Utc)),
        // naive timestamps in the files are treated as UTC
        None => Ok(parse_timestamp(value)?.and_utc()),
    }
}

fn int_to_sql(value: i64, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
    match *ty {
        PgType::INT8 => value.to_sql(ty, out),
        PgType::INT4 => i32::try_from(value)?.to_sql(ty, out),
        PgType::INT2 => i16::try_from(value)?.to_sql(ty, out),
        PgType::FLOAT8 => (value as f64).to_sql(ty, out),
        PgType::NUMERIC => Decimal::from(value).to_sql(ty, out),
        _ if is_text_type(ty) => value.to_string().to_sql(ty, out),
        _ => Err(wrong_type(&SqlValue::Int(value), ty)),
    }
}

fn float_to_sql(value: f64, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
    match *ty {
        PgType::FLOAT8 => value.to_sql(ty, out),
        PgType::FLOAT4 => (value as f32).to_sql(ty, out),
        PgType::NUMERIC => Decimal::try_from(value)?.to_sql(ty, out),
        _ if is_text_type(ty) => value.to_string().to_sql(ty, out),
        _ => Err(wrong_type(&SqlValue::Float(value), ty)),
    }
}

fn text_to_sql(value: &str, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
    let trimmed = value.trim();
    match *ty {
        PgType::DATE => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)?.to_sql(ty, out),
        PgType::TIMESTAMP => parse_timestamp(trimmed)?.to_sql(ty, out),
        PgType::TIMESTAMPTZ => parse_timestamp_tz(trimmed)?.to_sql(ty, out),
        PgType::INT8 => trimmed.parse::<i64>()?.to_sql(ty, out),
        PgType::INT4 => trimmed.parse::<i32>()?.to_sql(ty, out),
        PgType::INT2 => trimmed.parse::<i16>()?.to_sql(ty, out),
        PgType::FLOAT8 => trimmed.parse::<f64>()?.to_sql(ty, out),
        PgType::FLOAT4 => trimmed.parse::<f32>()?.to_sql(ty, out),
        PgType::NUMERIC => Decimal::from_str(trimmed)?.to_sql(ty, out),
        _ if is_text_type(ty) => value.to_sql(ty, out),
        _ => Err(wrong_type(&SqlValue::Text(value.to_string()), ty)),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &PgType, out: &mut BytesMut) -> ToSqlResult {
        match self {
            SqlValue::Int(value) => int_to_sql(*value, ty, out),
            SqlValue::Float(value) => float_to_sql(*value, ty, out),
            SqlValue::Text(value) => text_to_sql(value, ty, out),
        }
    }

    fn accepts(ty: &PgType) -> bool {
        is_text_type(ty)
            || matches!(
                *ty,
                PgType::INT2
                    | PgType::INT4
                    | PgType::INT8
                    | PgType::FLOAT4
                    | PgType::FLOAT8
                    | PgType::NUMERIC
                    | PgType::DATE
                    | PgType::TIMESTAMP
                    | PgType::TIMESTAMPTZ
            )
    }

    to_sql_checked!();
}
