//! Bound argument values.
//!
//! Every argument that flows through a builder is a [`Value`]. The enum is closed so
//! encoding to the driver is checked exhaustively; [`Value::Raw`] is the one variant
//! that is rendered into the SQL text instead of being bound.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

use crate::error::{OrmError, OrmResult};

/// A single bound argument or raw SQL literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
    /// Literal SQL emitted in place of a placeholder (e.g. `NOW()`).
    Raw(String),
}

/// Wrap a SQL literal so it is rendered verbatim instead of bound.
///
/// ```ignore
/// oca::qb::insert_into("todos")
///     .columns(&["title", "created_at"])
///     .values([Value::from("Task 1"), oca::raw("NOW()")]);
/// ```
pub fn raw(sql: impl Into<String>) -> Value {
    Value::Raw(sql.into())
}

impl Value {
    /// Serialize any value into a JSON argument.
    pub fn json<T: Serialize>(value: &T) -> OrmResult<Self> {
        serde_json::to_value(value)
            .map(Value::Json)
            .map_err(|e| OrmError::Other(format!("json encode: {e}")))
    }

    /// Whether this is a raw SQL literal.
    pub fn is_raw(&self) -> bool {
        matches!(self, Value::Raw(_))
    }

    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Json(_) => "json",
            Value::Raw(_) => "raw",
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }
}

macro_rules! impl_from_value_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_value_variant! {
    bool => Bool,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Text,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ── Decoding ────────────────────────────────────────────────────────────────

/// Conversion from a decoded [`Value`] into a Rust field type.
pub trait FromValue: Sized {
    /// Convert, or explain why the value does not fit.
    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch<T>(expected: &str, got: &Value) -> Result<T, String> {
    Err(format!("expected {expected}, got {}", got.kind()))
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::I16(v) => Ok(v != 0),
            Value::I32(v) => Ok(v != 0),
            Value::I64(v) => Ok(v != 0),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, String> {
                    match value.as_i64() {
                        Some(v) => <$ty>::try_from(v)
                            .map_err(|_| format!("{v} out of range for {}", stringify!($ty))),
                        None => mismatch(stringify!($ty), &value),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i16, i32, i64);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        value.as_f64().map_or_else(|| mismatch("f64", &value), Ok)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::F32(v) => Ok(v),
            other => other
                .as_f64()
                .map(|v| v as f32)
                .map_or_else(|| mismatch("f32", &other), Ok),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            other => mismatch("text", &other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => mismatch("bytes", &other),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(s) => Uuid::parse_str(&s).map_err(|e| e.to_string()),
            other => mismatch("uuid", &other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Date(d) => Ok(d),
            other => mismatch("date", &other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::TimestampTz(t) => Ok(t.naive_utc()),
            other => mismatch("timestamp", &other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::TimestampTz(t) => Ok(t),
            Value::Timestamp(t) => Ok(t.and_utc()),
            other => mismatch("timestamptz", &other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Null => Ok(serde_json::Value::Null),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
            other => mismatch("json", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A field slot that a decoded column value can be written into.
///
/// Entities hand out `&mut dyn ScanTarget` for their mapped fields; the row scanner
/// feeds each one the value decoded by the row.
pub trait ScanTarget: Send {
    /// Overwrite the slot with `value`.
    fn assign(&mut self, value: Value) -> Result<(), String>;
}

impl<T: FromValue + Send> ScanTarget for T {
    fn assign(&mut self, value: Value) -> Result<(), String> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

// ── Encoding ────────────────────────────────────────────────────────────────

fn int_to_sql(
    v: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql_checked(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql_checked(ty, out),
        Type::FLOAT4 => (v as f32).to_sql_checked(ty, out),
        Type::FLOAT8 => (v as f64).to_sql_checked(ty, out),
        _ => v.to_sql_checked(ty, out),
    }
}

fn float_to_sql(
    v: f64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql_checked(ty, out),
        _ => v.to_sql_checked(ty, out),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>>
    where
        Self: Sized,
    {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::I16(_) | Value::I32(_) | Value::I64(_) => match self.as_i64() {
                Some(v) => int_to_sql(v, ty, out),
                None => Ok(IsNull::Yes),
            },
            Value::F32(v) => float_to_sql(f64::from(*v), ty, out),
            Value::F64(v) => float_to_sql(*v, ty, out),
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) if *ty == Type::TIMESTAMPTZ => {
                v.and_utc().to_sql_checked(ty, out)
            }
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) if *ty == Type::TIMESTAMP => {
                v.naive_utc().to_sql_checked(ty, out)
            }
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Raw(sql) => Err(format!("raw SQL literal '{sql}' cannot be bound").into()),
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}
