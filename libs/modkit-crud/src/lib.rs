#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
//! `ModKit` generic CRUD repository.
//!
//! One repository implementation serves any `SeaORM` entity that also derives
//! [`CrudEntity`]: create, list with pagination, ordering and equality
//! filters, lookup by identifier, partial update, soft delete, substring
//! search and counting, plus eager loading of related rows.
//!
//! # Building blocks
//! - [`fields`]: the static per-entity field table produced by
//!   `#[derive(CrudEntity)]` (column names, kinds, search eligibility)
//! - [`query`]: pure builders for list and search queries
//! - [`merge`]: overlaying a partial `ActiveModel` onto a stored row
//! - [`repository`]: the [`CrudRepository`] facade and its `SeaORM` implementation
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use modkit_crud::{Conditions, CrudRepository, Projection, SeaOrmRepository};
//! use sea_orm::ActiveValue::Set;
//!
//! let conn = Arc::new(cfg.database.connect().await?);
//! let posts = SeaOrmRepository::<post::Entity>::new(conn)
//!     .with_projection("Author", Projection::user_safe())
//!     .with_config(cfg.repository.clone());
//!
//! let created = posts
//!     .create(post::ActiveModel { title: Set("hello".into()), ..Default::default() })
//!     .await?;
//! let page = posts
//!     .read(1, 20, "created_at DESC", &Conditions::new().eq("published", true), &["Author"])
//!     .await?;
//! posts.update(post::ActiveModel { id: Set(created.id), views: Set(0), ..Default::default() }).await?;
//! posts.delete(created.id.unsigned_abs()).await?;
//! ```

extern crate self as modkit_crud;

pub mod conditions;
pub mod config;
pub mod error;
pub mod fields;
pub mod merge;
pub mod preload;
pub mod query;
pub mod repository;
pub mod tx_config;
pub mod value;

pub use conditions::Conditions;
pub use config::{CrudConfig, DbConnConfig, PoolCfg, RepoConfig};
pub use error::{RepoError, RepoResult};
pub use fields::{CrudEntity, FieldDescriptor, FieldKind, ZeroRule};
pub use merge::{merge, non_zero_patch};
pub use preload::{Projection, Record, Related, RelationProjections};
pub use repository::{CrudRepository, SeaOrmRepository};
pub use tx_config::{TxAccessMode, TxConfig, TxIsolationLevel};

pub use modkit_crud_macros::CrudEntity;
