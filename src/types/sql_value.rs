use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// A SQL value travelling to or from the service.
///
/// Outbound values are rendered with [`SqlValue::to_param`]; inbound cells are
/// produced by [`decode_value`](crate::types::decode_value).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    /// Generic number; integer columns other than int8 decode into this.
    Number(f64),
    /// Exact integer, used for int8 columns.
    BigInt(i128),
    Bool(bool),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
    Array(Vec<SqlValue>),
}

impl SqlValue {
    /// Renders the value as the raw text parameter the service expects.
    pub fn to_param(&self) -> String {
        match self {
            SqlValue::Null => "null".to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Number(n) => format_number(*n),
            SqlValue::BigInt(i) => i.to_string(),
            SqlValue::Bool(b) => String::from(if *b { "t" } else { "f" }),
            SqlValue::Bytes(bytes) => format!("\\x{}", hex::encode(bytes)),
            SqlValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            SqlValue::Json(json) => json.to_string(),
            SqlValue::Array(items) => {
                let inner: Vec<String> = items.iter().map(SqlValue::to_param).collect();
                format!("{{{}}}", inner.join(","))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            SqlValue::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            SqlValue::Json(json) => Some(json),
            _ => None,
        }
    }
}

/// Shortest decimal form, without a trailing `.0` for whole numbers.
fn format_number(n: f64) -> String {
    if n.is_infinite() {
        return String::from(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 {
        return "0".to_string();
    }
    n.to_string()
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

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Number(f64::from(value))
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, u16, u32, f32, f64);

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(i128::from(value))
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        SqlValue::BigInt(i128::from(value))
    }
}

impl From<i128> for SqlValue {
    fn from(value: i128) -> Self {
        SqlValue::BigInt(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Bytes(value.to_vec())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(value: Vec<T>) -> Self {
        SqlValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}
