use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::Type;

use crate::error::{PgHttpError, Result};
use crate::types::SqlValue;

/// Column types decoded as generic numbers.
const NUMERIC: [Type; 5] = [Type::INT2, Type::INT4, Type::OID, Type::FLOAT4, Type::FLOAT8];
const TEMPORAL: [Type; 3] = [Type::TIMESTAMPTZ, Type::DATE, Type::TIMESTAMP];
const JSON: [Type; 2] = [Type::JSON, Type::JSONB];

/// Decodes a raw text cell according to the column's type OID.
///
/// A `NULL` cell is always [`SqlValue::Null`]. Unknown OIDs, `text` and the
/// untyped OID 0 pass the text through unchanged, as do numeric and
/// date/time cells whose text does not parse. Only malformed `bytea`, `int8`
/// and JSON cells are errors.
pub fn decode_value(raw: Option<&str>, type_oid: u32) -> Result<SqlValue> {
    let Some(value) = raw else {
        return Ok(SqlValue::Null);
    };
    let Some(ty) = Type::from_oid(type_oid) else {
        return Ok(SqlValue::Text(value.to_string()));
    };

    if NUMERIC.contains(&ty) {
        Ok(value
            .trim()
            .parse::<f64>()
            .map_or_else(|_| text(value), SqlValue::Number))
    } else if ty == Type::BYTEA {
        let digits = value.get(2..).unwrap_or_default();
        hex::decode(digits)
            .map(SqlValue::Bytes)
            .map_err(|e| decode_error(type_oid, value, e))
    } else if ty == Type::BOOL {
        Ok(SqlValue::Bool(value == "t"))
    } else if ty == Type::INT8 {
        value
            .parse::<i128>()
            .map(SqlValue::BigInt)
            .map_err(|e| decode_error(type_oid, value, e))
    } else if TEMPORAL.contains(&ty) {
        // infinity, -infinity and BC dates stay as text
        Ok(parse_timestamp(value).map_or_else(|| text(value), SqlValue::Timestamp))
    } else if JSON.contains(&ty) {
        serde_json::from_str(value)
            .map(SqlValue::Json)
            .map_err(|e| decode_error(type_oid, value, e))
    } else {
        Ok(SqlValue::Text(value.to_string()))
    }
}

fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

fn decode_error(type_oid: u32, value: &str, reason: impl ToString) -> PgHttpError {
    PgHttpError::Decode {
        type_oid,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Accepts the service's text output for timestamptz, timestamp and date, as
/// well as RFC 3339. Values without an offset are taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(value, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
