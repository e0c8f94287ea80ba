// Proc-macro crate for modkit-crud derives
//
//! # modkit-crud-macros
//!
//! Procedural macros for the `modkit-crud` generic repository.
//!
//! ## `#[derive(CrudEntity)]`
//!
//! Implements `modkit_crud::CrudEntity` for the `Entity` of a `SeaORM` model
//! module. The derive walks the `Model` fields once, at compile time, and emits
//! a static table of `FieldDescriptor`s (column name, kind, zero rule, search
//! eligibility). Nothing is inspected at runtime.
//!
//! ### Example
//!
//! ```ignore
//! use sea_orm::entity::prelude::*;
//! use modkit_crud::CrudEntity;
//!
//! #[derive(Clone, Debug, PartialEq, DeriveEntityModel, CrudEntity)]
//! #[sea_orm(table_name = "posts")]
//! pub struct Model {
//!     #[sea_orm(primary_key)]
//!     pub id: i64,
//!     pub title: String,
//!     #[sea_orm(column_name = "body_text")]
//!     pub body: String,
//!     #[crud(no_search)]
//!     pub slug: String,
//!     pub created_at: DateTimeUtc,
//!     pub updated_at: DateTimeUtc,
//!     pub deleted_at: Option<DateTimeUtc>,
//! }
//! ```
//!
//! ### Column name resolution
//!
//! 1. `#[sea_orm(column_name = "...")]`
//! 2. `#[serde(rename = "...")]`, unless the field is `#[serde(skip)]` or
//!    `#[serde(skip_serializing)]`
//! 3. snake case of the field identifier
//!
//! ### Field attributes
//!
//! - `#[crud(search)]` / `#[crud(no_search)]` - force search eligibility on or off
//! - `#[crud(soft_delete)]` - mark the soft-delete timestamp (defaults to `deleted_at`)

use proc_macro::TokenStream;
use proc_macro_error2::proc_macro_error;
use syn::{DeriveInput, parse_macro_input};

mod crud_entity;
mod naming;

/// Derive macro for implementing `CrudEntity`.
///
/// Place this on your `SeaORM` `Model` struct next to `DeriveEntityModel`.
/// The generated impl targets the sibling `Entity` type and references the
/// sibling `Column` enum, exactly like the `SeaORM` derives do.
///
/// # Attributes
///
/// - `#[crud(search)]` - include a field in text search even if its type is not scalar
/// - `#[crud(no_search)]` - exclude a scalar field from text search
/// - `#[crud(soft_delete)]` - use this `Option<timestamp>` field as the soft-delete marker
///
/// `SeaORM` (`primary_key`, `column_name`, `ignore`) and serde (`rename`, `skip`,
/// `skip_serializing`) attributes are read as well.
#[proc_macro_derive(CrudEntity, attributes(crud))]
#[proc_macro_error]
pub fn derive_crud_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    crud_entity::expand_derive_crud_entity(input).into()
}
