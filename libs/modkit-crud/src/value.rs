//! Helpers over `sea_orm::Value`: null and zero detection, identifier
//! extraction, timestamp generation and grouping keys.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::Value;

use crate::fields::{FieldKind, ZeroRule};

/// `true` when the value is SQL `NULL` of any type.
#[must_use]
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
    )
}

/// Zero-value predicate used by the zero-skip patch builder.
///
/// Nullable fields are zero only when `NULL`; plain fields are zero when equal
/// to the default value of their type.
#[must_use]
pub fn is_zero(rule: ZeroRule, value: &Value) -> bool {
    if is_null(value) {
        return true;
    }
    match rule {
        ZeroRule::Unset => false,
        ZeroRule::Default => is_default(value),
    }
}

#[allow(clippy::float_cmp)] // exact comparison against the type default is intended
fn is_default(value: &Value) -> bool {
    match value {
        Value::Bool(Some(b)) => !*b,
        Value::TinyInt(Some(n)) => *n == 0,
        Value::SmallInt(Some(n)) => *n == 0,
        Value::Int(Some(n)) => *n == 0,
        Value::BigInt(Some(n)) => *n == 0,
        Value::TinyUnsigned(Some(n)) => *n == 0,
        Value::SmallUnsigned(Some(n)) => *n == 0,
        Value::Unsigned(Some(n)) => *n == 0,
        Value::BigUnsigned(Some(n)) => *n == 0,
        Value::Float(Some(n)) => *n == 0.0,
        Value::Double(Some(n)) => *n == 0.0,
        Value::String(Some(s)) => s.is_empty(),
        Value::Char(Some(c)) => *c == '\0',
        Value::Bytes(Some(b)) => b.is_empty(),
        Value::Json(Some(j)) => j.is_null(),
        Value::ChronoDate(Some(d)) => {
            let d: &NaiveDate = d;
            *d == NaiveDate::default()
        }
        Value::ChronoTime(Some(t)) => {
            let t: &NaiveTime = t;
            *t == NaiveTime::default()
        }
        Value::ChronoDateTime(Some(dt)) => {
            let dt: &NaiveDateTime = dt;
            *dt == NaiveDateTime::default()
        }
        Value::ChronoDateTimeUtc(Some(dt)) => {
            let dt: &DateTime<Utc> = dt;
            *dt == DateTime::<Utc>::default()
        }
        Value::ChronoDateTimeLocal(Some(dt)) => {
            let dt: &DateTime<Local> = dt;
            dt.timestamp() == 0 && dt.timestamp_subsec_nanos() == 0
        }
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => {
            let dt: &DateTime<FixedOffset> = dt;
            *dt == DateTime::<FixedOffset>::default()
        }
        Value::Uuid(Some(u)) => u.is_nil(),
        Value::Decimal(Some(d)) => {
            let d: &Decimal = d;
            d.is_zero()
        }
        _ => false,
    }
}

/// Extract a positive numeric identifier.
#[must_use]
pub fn as_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::TinyInt(Some(n)) => u64::try_from(*n).ok(),
        Value::SmallInt(Some(n)) => u64::try_from(*n).ok(),
        Value::Int(Some(n)) => u64::try_from(*n).ok(),
        Value::BigInt(Some(n)) => u64::try_from(*n).ok(),
        Value::TinyUnsigned(Some(n)) => Some(u64::from(*n)),
        Value::SmallUnsigned(Some(n)) => Some(u64::from(*n)),
        Value::Unsigned(Some(n)) => Some(u64::from(*n)),
        Value::BigUnsigned(Some(n)) => Some(*n),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

/// `at` encoded for a timestamp field of the given kind; `None` for kinds
/// that are not date-times.
#[must_use]
pub fn timestamp_for(kind: FieldKind, at: DateTime<Utc>) -> Option<Value> {
    match kind {
        FieldKind::DateTimeUtc => Some(at.into()),
        FieldKind::DateTime => Some(at.naive_utc().into()),
        FieldKind::DateTimeWithTimeZone => Some(at.fixed_offset().into()),
        FieldKind::DateTimeLocal => Some(at.with_timezone(&Local).into()),
        _ => None,
    }
}

/// Textual key used to match foreign keys between primary rows and related
/// rows fetched as JSON.
#[must_use]
pub fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::TinyInt(Some(n)) => Some(n.to_string()),
        Value::SmallInt(Some(n)) => Some(n.to_string()),
        Value::Int(Some(n)) => Some(n.to_string()),
        Value::BigInt(Some(n)) => Some(n.to_string()),
        Value::TinyUnsigned(Some(n)) => Some(n.to_string()),
        Value::SmallUnsigned(Some(n)) => Some(n.to_string()),
        Value::Unsigned(Some(n)) => Some(n.to_string()),
        Value::BigUnsigned(Some(n)) => Some(n.to_string()),
        Value::String(Some(s)) => Some(s.as_str().to_owned()),
        Value::Char(Some(c)) => Some(c.to_string()),
        Value::Uuid(Some(u)) => Some(u.to_string()),
        _ => None,
    }
}

/// JSON counterpart of [`key_of`].
#[must_use]
pub fn json_key_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
