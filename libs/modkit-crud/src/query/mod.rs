//! Query composition for list-style reads and text search.
//!
//! Everything here is pure: builders return a `Select` plus preload plans and
//! never touch the connection.

pub mod sort;

use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DbBackend, EntityTrait, QueryFilter, QuerySelect, Select, Value,
};

use crate::conditions::Conditions;
use crate::error::{RepoError, RepoResult};
use crate::fields::{CrudEntity, FieldDescriptor};
use crate::preload::{self, PreloadPlan, RelationProjections};

pub use sort::{SortKey, apply_page, apply_sort, page_window, parse_sort};

/// A composed read: the primary select and the relations to attach after it.
pub struct ReadQuery<E: EntityTrait> {
    pub select: Select<E>,
    pub preloads: Vec<PreloadPlan<E>>,
}

/// Hide soft-deleted rows when the entity has a soft-delete column.
#[must_use]
pub fn live<E: CrudEntity>(select: Select<E>) -> Select<E> {
    match E::soft_delete_field() {
        Some(field) => select.filter(field.column.is_null()),
        None => select,
    }
}

/// Filtered, ordered and paginated read over live rows.
///
/// # Errors
/// `Validation` for an unknown preload relation or a non-positive page with a
/// positive limit.
pub fn build_read_query<E: CrudEntity>(
    page: i64,
    limit: i64,
    sort_by: &str,
    conditions: &Conditions,
    preload: &[&str],
    projections: &RelationProjections,
) -> RepoResult<ReadQuery<E>> {
    let preloads = preload::plan::<E>(preload, projections)?;
    let select = live::<E>(E::find()).filter(conditions.to_condition::<E>());
    let select = apply_page(apply_sort::<E>(select, sort_by), page, limit)?;
    Ok(ReadQuery { select, preloads })
}

/// Substring search over every searchable column of live rows, AND-combined
/// with `conditions` and ordered by primary key.
///
/// Returns `None` when the entity has no searchable column; callers treat
/// that as an empty result.
///
/// # Errors
/// `Validation` for an unknown preload relation.
pub fn build_search_query<E: CrudEntity>(
    backend: DbBackend,
    text: &str,
    conditions: &Conditions,
    preload: &[&str],
    projections: &RelationProjections,
) -> RepoResult<Option<ReadQuery<E>>> {
    let preloads = preload::plan::<E>(preload, projections)?;
    let Some(text_match) = search_condition::<E>(backend, text) else {
        return Ok(None);
    };
    let select = live::<E>(E::find())
        .filter(text_match)
        .filter(conditions.to_condition::<E>());
    Ok(Some(ReadQuery {
        select: apply_sort::<E>(select, ""),
        preloads,
    }))
}

/// OR of one `LIKE '%text%'` clause per searchable column.
#[must_use]
pub fn search_condition<E: CrudEntity>(backend: DbBackend, text: &str) -> Option<Condition> {
    let pattern = format!("%{text}%");
    let cast_to = match backend {
        DbBackend::MySql => "CHAR",
        _ => "TEXT",
    };
    let clauses: Vec<SimpleExpr> = E::searchable_fields()
        .map(|field| like_clause(field, &pattern, cast_to))
        .collect();
    if clauses.is_empty() {
        return None;
    }
    Some(
        clauses
            .into_iter()
            .fold(Condition::any(), |cond, clause| cond.add(clause)),
    )
}

fn like_clause<E: CrudEntity>(
    field: &FieldDescriptor<E>,
    pattern: &str,
    cast_to: &str,
) -> SimpleExpr {
    let column = Expr::col((E::default(), field.column));
    if field.kind.is_textual() {
        column.like(pattern)
    } else {
        Expr::expr(Func::cast_as(column, Alias::new(cast_to))).like(pattern)
    }
}

/// Lookup of one live row by identifier for a read-modify-write.
///
/// Backends with row locks get `FOR UPDATE`; SQLite serializes writers on
/// its own.
///
/// # Errors
/// `Validation` when the entity has no identifier field.
pub fn build_lock_query<E: CrudEntity>(backend: DbBackend, id: u64) -> RepoResult<Select<E>> {
    let id_field = E::id_field().ok_or_else(|| {
        RepoError::validation(format!("{} has no identifier field", E::entity_name()))
    })?;
    let select = live::<E>(E::find()).filter(id_field.column.eq(id_value(id)));
    Ok(if backend == DbBackend::Sqlite {
        select
    } else {
        select.lock_exclusive()
    })
}

/// Bind identifiers as signed integers whenever they fit.
#[must_use]
pub fn id_value(id: u64) -> Value {
    i64::try_from(id).map_or_else(|_| Value::from(id), Value::from)
}

/// Live-row count query.
#[must_use]
pub fn build_count_query<E: CrudEntity>() -> Select<E> {
    live::<E>(E::find())
}
