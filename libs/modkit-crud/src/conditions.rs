//! Equality condition sets applied as AND-combined filters.

use std::collections::{BTreeMap, HashMap};

use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::{Condition, EntityTrait, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Column name to required value.
///
/// Entries with an empty key or a JSON `null` value are ignored when the
/// filter is built. Array values become `IN (...)` predicates.
///
/// ```ignore
/// let cond = Conditions::new().eq("author_id", 3).eq("published", true);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(BTreeMap<String, JsonValue>);

impl Conditions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(column.into(), value.into());
    }

    /// Entries that survive sanitizing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.0
            .iter()
            .filter(|(k, v)| !k.trim().is_empty() && !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// `true` when nothing survives sanitizing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// AND-combined equality filter over the sanitized entries, columns
    /// qualified with the entity's table.
    #[must_use]
    pub fn to_condition<E: EntityTrait>(&self) -> Condition {
        self.iter()
            .fold(Condition::all(), |cond, (column, value)| {
                cond.add(predicate::<E>(column, value))
            })
    }
}

fn predicate<E: EntityTrait>(column: &str, value: &JsonValue) -> SimpleExpr {
    let col = Expr::col((E::default(), Alias::new(column)));
    match value {
        JsonValue::Array(items) => col.is_in(
            items
                .iter()
                .filter(|v| !v.is_null())
                .map(json_to_value)
                .collect::<Vec<_>>(),
        ),
        other => col.eq(json_to_value(other)),
    }
}

/// Convert a JSON scalar into a bindable store value.
#[must_use]
pub fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::String(None),
        JsonValue::Bool(b) => Value::from(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or_default())
            }
        }
        JsonValue::String(s) => Value::from(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::from(value.clone()),
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<S: std::hash::BuildHasher> From<HashMap<String, JsonValue, S>> for Conditions {
    fn from(map: HashMap<String, JsonValue, S>) -> Self {
        Self(map.into_iter().collect())
    }
}
