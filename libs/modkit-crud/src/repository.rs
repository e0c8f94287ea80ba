//! The generic repository facade.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use tracing::{debug, warn};

use crate::conditions::Conditions;
use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult, StoreContext};
use crate::fields::{CREATED_AT, CrudEntity, FieldDescriptor, UPDATED_AT};
use crate::merge::{is_empty_patch, merge};
use crate::preload::{self, Projection, Record, RelationProjections, attach};
use crate::query::{
    build_count_query, build_lock_query, build_read_query, build_search_query, id_value,
};
use crate::value::{as_id, timestamp_for};

/// CRUD, pagination and search over one entity type.
///
/// `Patch` carries the fields a caller supplies; for the `SeaORM` backed
/// implementation it is the entity's `ActiveModel`.
#[async_trait]
pub trait CrudRepository: Send + Sync {
    type Model: Send + Sync;
    type Patch: Send + Sync;

    /// Insert a new record and return it as stored.
    ///
    /// # Errors
    /// `Store` on constraint violations or connectivity failures.
    async fn create(&self, entity: Self::Patch) -> RepoResult<Self::Model>;

    /// List live records matching `conditions`.
    ///
    /// `page` is 1-based and only meaningful with a positive `limit`; a
    /// `limit` of zero or less returns every match. An empty `sort_by` orders
    /// by identifier ascending. Nothing matching is an empty list.
    ///
    /// # Errors
    /// `Validation` for a non-positive page with a positive limit or an
    /// unknown preload relation; `Store` for store failures, including a
    /// malformed sort expression.
    async fn read(
        &self,
        page: i64,
        limit: i64,
        sort_by: &str,
        conditions: &Conditions,
        preload: &[&str],
    ) -> RepoResult<Vec<Record<Self::Model>>>;

    /// Fetch one record by identifier, soft-deleted or not.
    ///
    /// # Errors
    /// `NotFound` when no row has `id`.
    async fn read_by_id(&self, id: u64, preload: &[&str]) -> RepoResult<Record<Self::Model>>;

    /// Merge the supplied fields onto the stored record and persist it.
    ///
    /// # Errors
    /// `Validation` when the patch has no non-zero identifier; `NotFound`
    /// when no live row has it.
    async fn update(&self, patch: Self::Patch) -> RepoResult<Self::Model>;

    /// Soft-delete the record.
    ///
    /// # Errors
    /// `Validation` for a zero `id`; `NotFound` when no live row has it.
    async fn delete(&self, id: u64) -> RepoResult<()>;

    /// Live records with `text` contained in any searchable column and
    /// matching `conditions`.
    ///
    /// # Errors
    /// `Validation` for an unknown preload relation; `Store` for store failures.
    async fn search(
        &self,
        text: &str,
        conditions: &Conditions,
        preload: &[&str],
    ) -> RepoResult<Vec<Record<Self::Model>>>;

    /// Number of live records.
    ///
    /// # Errors
    /// `Store` for store failures.
    async fn count(&self) -> RepoResult<u64>;
}

/// [`CrudRepository`] over a shared `SeaORM` connection.
#[derive(Clone)]
pub struct SeaOrmRepository<E: CrudEntity> {
    conn: Arc<DatabaseConnection>,
    projections: RelationProjections,
    config: RepoConfig,
    entity: PhantomData<fn() -> E>,
}

impl<E: CrudEntity> SeaOrmRepository<E> {
    #[must_use]
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self {
            conn,
            projections: RelationProjections::new(),
            config: RepoConfig::default(),
            entity: PhantomData,
        }
    }

    /// Restrict the columns loaded when `relation` is preloaded.
    #[must_use]
    pub fn with_projection(mut self, relation: impl Into<String>, projection: Projection) -> Self {
        self.projections.insert(relation, projection);
        self
    }

    #[must_use]
    pub fn with_projections(mut self, projections: RelationProjections) -> Self {
        self.projections = projections;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RepoConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    fn id_field() -> RepoResult<&'static FieldDescriptor<E>> {
        E::id_field().ok_or_else(|| {
            RepoError::validation(format!("{} has no identifier field", E::entity_name()))
        })
    }

    async fn begin(&self, op: &'static str) -> RepoResult<DatabaseTransaction> {
        let (isolation, access_mode) = self.config.tx.sea_args();
        self.conn
            .begin_with_config(isolation, access_mode)
            .await
            .store_ctx(op)
    }

    /// Load a live row inside `txn`, locking it where the backend allows.
    async fn lock_live(
        txn: &DatabaseTransaction,
        id: u64,
        op: &'static str,
    ) -> RepoResult<E::Model> {
        build_lock_query::<E>(txn.get_database_backend(), id)?
            .one(txn)
            .await
            .store_ctx(op)?
            .ok_or_else(|| RepoError::not_found(&E::entity_name(), id))
    }
}

impl<E> SeaOrmRepository<E>
where
    E: CrudEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send + Sync,
{
    /// [`CrudRepository::update`] inside a caller-owned transaction.
    ///
    /// The lookup and the write both run on `txn`; nothing is committed.
    ///
    /// # Errors
    /// Same as [`CrudRepository::update`].
    pub async fn update_in(
        txn: &DatabaseTransaction,
        patch: E::ActiveModel,
    ) -> RepoResult<E::Model> {
        let id_field = Self::id_field()?;
        let id = patch
            .get(id_field.column)
            .into_value()
            .as_ref()
            .and_then(as_id)
            .ok_or_else(|| {
                RepoError::validation(format!(
                    "{} update requires a non-zero `{}`",
                    E::entity_name(),
                    id_field.name
                ))
            })?;

        let existing = Self::lock_live(txn, id, "update").await?;
        if is_empty_patch::<E>(&patch) {
            debug!(entity = %E::entity_name(), id, "update carried no fields");
            return Ok(existing);
        }

        let mut merged = merge::<E>(existing, &patch);
        if let Some(field) = E::field(UPDATED_AT)
            && !patch.get(field.column).is_set()
        {
            stamp(&mut merged, field, Utc::now());
        }
        let updated = merged.update(txn).await.store_ctx("update")?;
        debug!(entity = %E::entity_name(), id, "updated");
        Ok(updated)
    }

    /// [`CrudRepository::delete`] inside a caller-owned transaction.
    ///
    /// # Errors
    /// Same as [`CrudRepository::delete`].
    pub async fn delete_in(txn: &DatabaseTransaction, id: u64) -> RepoResult<()> {
        if id == 0 {
            return Err(RepoError::validation(format!(
                "{} delete requires a non-zero identifier",
                E::entity_name()
            )));
        }

        let mut row = Self::lock_live(txn, id, "delete").await?.into_active_model();
        if let Some(field) = E::soft_delete_field() {
            let now = Utc::now();
            stamp(&mut row, field, now);
            if let Some(updated_at) = E::field(UPDATED_AT) {
                stamp(&mut row, updated_at, now);
            }
            row.update(txn).await.store_ctx("delete")?;
            debug!(entity = %E::entity_name(), id, "soft-deleted");
        } else {
            warn!(
                entity = %E::entity_name(),
                id,
                "entity has no soft-delete column, removing the row"
            );
            row.delete(txn).await.store_ctx("delete")?;
        }
        Ok(())
    }
}

#[async_trait]
impl<E> CrudRepository for SeaOrmRepository<E>
where
    E: CrudEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send + Sync,
{
    type Model = E::Model;
    type Patch = E::ActiveModel;

    async fn create(&self, mut entity: E::ActiveModel) -> RepoResult<E::Model> {
        let now = Utc::now();
        stamp_if_unset::<E>(&mut entity, CREATED_AT, now);
        stamp_if_unset::<E>(&mut entity, UPDATED_AT, now);

        let model = entity
            .insert(self.conn.as_ref())
            .await
            .store_ctx("create")?;
        debug!(
            entity = %E::entity_name(),
            id = ?Self::id_field().ok().and_then(|f| as_id(&model.get(f.column))),
            "created"
        );
        Ok(model)
    }

    async fn read(
        &self,
        page: i64,
        limit: i64,
        sort_by: &str,
        conditions: &Conditions,
        preload: &[&str],
    ) -> RepoResult<Vec<Record<E::Model>>> {
        let sort_by = if sort_by.trim().is_empty() {
            self.config.default_sort.as_deref().unwrap_or_default()
        } else {
            sort_by
        };
        let query = build_read_query::<E>(
            page,
            limit,
            sort_by,
            conditions,
            preload,
            &self.projections,
        )?;

        let rows = query
            .select
            .all(self.conn.as_ref())
            .await
            .store_ctx("read")?;
        debug!(entity = %E::entity_name(), page, limit, rows = rows.len(), "read");
        attach(self.conn.as_ref(), &query.preloads, rows).await
    }

    async fn read_by_id(&self, id: u64, preload: &[&str]) -> RepoResult<Record<E::Model>> {
        let plans = preload::plan::<E>(preload, &self.projections)?;
        let id_field = Self::id_field()?;

        let model = E::find()
            .filter(id_field.column.eq(id_value(id)))
            .one(self.conn.as_ref())
            .await
            .store_ctx("read_by_id")?
            .ok_or_else(|| RepoError::not_found(&E::entity_name(), id))?;
        debug!(entity = %E::entity_name(), id, "read by id");

        attach(self.conn.as_ref(), &plans, vec![model])
            .await?
            .pop()
            .ok_or_else(|| RepoError::not_found(&E::entity_name(), id))
    }

    async fn update(&self, patch: E::ActiveModel) -> RepoResult<E::Model> {
        let txn = self.begin("update").await?;
        let updated = Self::update_in(&txn, patch).await?;
        txn.commit().await.store_ctx("update")?;
        Ok(updated)
    }

    async fn delete(&self, id: u64) -> RepoResult<()> {
        let txn = self.begin("delete").await?;
        Self::delete_in(&txn, id).await?;
        txn.commit().await.store_ctx("delete")
    }

    async fn search(
        &self,
        text: &str,
        conditions: &Conditions,
        preload: &[&str],
    ) -> RepoResult<Vec<Record<E::Model>>> {
        let Some(query) = build_search_query::<E>(
            self.backend(),
            text,
            conditions,
            preload,
            &self.projections,
        )?
        else {
            debug!(entity = %E::entity_name(), "search skipped, no searchable fields");
            return Ok(Vec::new());
        };

        let rows = query
            .select
            .all(self.conn.as_ref())
            .await
            .store_ctx("search")?;
        debug!(entity = %E::entity_name(), rows = rows.len(), "search");
        attach(self.conn.as_ref(), &query.preloads, rows).await
    }

    async fn count(&self) -> RepoResult<u64> {
        build_count_query::<E>()
            .count(self.conn.as_ref())
            .await
            .store_ctx("count")
    }
}

fn stamp<E: CrudEntity>(
    row: &mut E::ActiveModel,
    field: &FieldDescriptor<E>,
    at: DateTime<Utc>,
) {
    if let Some(value) = timestamp_for(field.kind, at) {
        row.set(field.column, value);
    }
}

fn stamp_if_unset<E: CrudEntity>(row: &mut E::ActiveModel, name: &str, at: DateTime<Utc>) {
    if let Some(field) = E::field(name)
        && !row.get(field.column).is_set()
    {
        stamp(row, field, at);
    }
}
