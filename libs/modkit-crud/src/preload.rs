//! Eager loading of related rows.
//!
//! Relations are addressed by the variant names of the entity's `Relation`
//! enum. Every requested relation costs one extra `SELECT ... WHERE key IN`
//! over the keys of the primary rows; related rows come back as JSON objects
//! and are attached to a [`Record`] wrapping the primary model.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::Deref;

use sea_orm::sea_query::{Alias, Asterisk, Expr, Query, TableRef};
use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, IdenStatic, Identity, Iterable, ModelTrait,
    RelationTrait, RelationType, Value,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{RepoError, RepoResult, StoreContext};
use crate::fields::CrudEntity;
use crate::value::{json_key_of, key_of};

/// Columns loaded for a related entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection(Vec<String>);

impl Projection {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    /// Public profile of a user-like record: no credentials or secrets.
    #[must_use]
    pub fn user_safe() -> Self {
        Self::new([
            "id",
            "name",
            "email",
            "active",
            "role",
            "company_id",
            "created_at",
            "updated_at",
        ])
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.0
    }
}

/// Per-relation column restrictions, keyed by relation name.
///
/// Relations without an entry load every column.
#[derive(Clone, Debug, Default)]
pub struct RelationProjections(HashMap<String, Projection>);

impl RelationProjections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, relation: impl Into<String>, projection: Projection) -> Self {
        self.insert(relation, projection);
        self
    }

    pub fn insert(&mut self, relation: impl Into<String>, projection: Projection) {
        self.0.insert(relation.into(), projection);
    }

    #[must_use]
    pub fn get(&self, relation: &str) -> Option<&Projection> {
        self.0.get(relation)
    }
}

/// Related rows attached under one relation name.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Related {
    /// Belongs-to or has-one.
    One(Option<JsonValue>),
    /// Has-many.
    Many(Vec<JsonValue>),
}

impl Related {
    #[must_use]
    pub fn as_one(&self) -> Option<&JsonValue> {
        match self {
            Self::One(row) => row.as_ref(),
            Self::Many(_) => None,
        }
    }

    #[must_use]
    pub fn as_many(&self) -> &[JsonValue] {
        match self {
            Self::Many(rows) => rows,
            Self::One(_) => &[],
        }
    }
}

/// A primary model plus whatever relations were preloaded for it.
///
/// Serializes as the model's own fields with one extra key per relation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record<M> {
    #[serde(flatten)]
    pub model: M,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub related: BTreeMap<String, Related>,
}

impl<M> Record<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            related: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn related(&self, relation: &str) -> Option<&Related> {
        self.related.get(relation)
    }
}

impl<M> Deref for Record<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.model
    }
}

/// Resolved eager-load instruction for one relation.
pub struct PreloadPlan<E: EntityTrait> {
    pub name: String,
    /// Key column on the primary entity.
    pub from_column: E::Column,
    pub to_table: TableRef,
    /// Key column on the related table.
    pub to_column: String,
    pub many: bool,
    /// `None` selects every column.
    pub columns: Option<Vec<String>>,
}

impl<E: EntityTrait> fmt::Debug for PreloadPlan<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadPlan")
            .field("name", &self.name)
            .field("from_column", &self.from_column)
            .field("to_table", &self.to_table)
            .field("to_column", &self.to_column)
            .field("many", &self.many)
            .field("columns", &self.columns)
            .finish()
    }
}

/// Resolve preload names against the entity's relations.
///
/// Blank and repeated names are ignored.
///
/// # Errors
/// `Validation` for a name that is not a relation of `E`, or for a relation
/// keyed on more than one column.
pub fn plan<E: CrudEntity>(
    names: &[&str],
    projections: &RelationProjections,
) -> RepoResult<Vec<PreloadPlan<E>>> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .map(|name| plan_one::<E>(name, projections))
        .collect()
}

fn plan_one<E: CrudEntity>(
    name: &str,
    projections: &RelationProjections,
) -> RepoResult<PreloadPlan<E>> {
    let relation = E::Relation::iter()
        .find(|rel| relation_name(rel) == name)
        .ok_or_else(|| {
            RepoError::validation(format!(
                "unknown relation `{name}` on {}",
                E::entity_name()
            ))
        })?;
    let def = relation.def();

    let from = single_column(&def.from_col, name)?;
    let to_column = single_column(&def.to_col, name)?;
    let from_column = E::Column::iter()
        .find(|col| col.as_str() == from)
        .ok_or_else(|| {
            RepoError::validation(format!(
                "relation `{name}` starts from `{from}`, which is not a column of {}",
                E::entity_name()
            ))
        })?;

    let columns = projections.get(name).map(|projection| {
        let mut columns = projection.columns().to_vec();
        if !columns.contains(&to_column) {
            columns.push(to_column.clone());
        }
        columns
    });

    Ok(PreloadPlan {
        name: name.to_owned(),
        from_column,
        to_table: def.to_tbl,
        to_column,
        many: matches!(def.rel_type, RelationType::HasMany),
        columns,
    })
}

#[allow(clippy::use_debug)] // relation variants expose their name only through Debug
fn relation_name<R: fmt::Debug>(relation: &R) -> String {
    format!("{relation:?}")
}

fn single_column(identity: &Identity, relation: &str) -> RepoResult<String> {
    match identity {
        Identity::Unary(col) => Ok(col.to_string()),
        _ => Err(RepoError::validation(format!(
            "relation `{relation}` uses a composite key; preload supports single-column keys only"
        ))),
    }
}

/// Run every plan against `models` and wrap them into records.
///
/// # Errors
/// `Store` when a related-row query fails.
pub async fn attach<E, C>(
    conn: &C,
    plans: &[PreloadPlan<E>],
    models: Vec<E::Model>,
) -> RepoResult<Vec<Record<E::Model>>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut records: Vec<Record<E::Model>> = models.into_iter().map(Record::new).collect();
    if records.is_empty() {
        return Ok(records);
    }

    for plan in plans {
        let rows = fetch_related(conn, plan, &records).await?;
        let mut groups: HashMap<String, Vec<JsonValue>> = HashMap::new();
        for row in rows {
            if let Some(key) = row.get(&plan.to_column).and_then(json_key_of) {
                groups.entry(key).or_default().push(row);
            }
        }

        for record in &mut records {
            let rows = key_of(&record.model.get(plan.from_column))
                .and_then(|key| groups.get(&key))
                .cloned()
                .unwrap_or_default();
            let related = if plan.many {
                Related::Many(rows)
            } else {
                Related::One(rows.into_iter().next())
            };
            record.related.insert(plan.name.clone(), related);
        }
    }
    Ok(records)
}

async fn fetch_related<E, C>(
    conn: &C,
    plan: &PreloadPlan<E>,
    records: &[Record<E::Model>],
) -> RepoResult<Vec<JsonValue>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut seen = HashSet::new();
    let keys: Vec<Value> = records
        .iter()
        .map(|record| record.model.get(plan.from_column))
        .filter(|value| key_of(value).is_some_and(|key| seen.insert(key)))
        .collect();
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let mut select = Query::select();
    select.from(plan.to_table.clone());
    if let Some(columns) = &plan.columns {
        select.columns(columns.iter().map(|c| Alias::new(c.as_str())));
    } else {
        select.column(Asterisk);
    }
    select.and_where(Expr::col(Alias::new(plan.to_column.as_str())).is_in(keys));

    let stmt = conn.get_database_backend().build(&select);
    JsonValue::find_by_statement(stmt)
        .all(conn)
        .await
        .store_ctx("preload")
}
