//! Static per-entity field metadata.
//!
//! The table is produced by `#[derive(CrudEntity)]` at compile time, so the
//! query composer and the merger never inspect model structure at runtime.

use std::fmt;

use sea_orm::EntityTrait;

/// Logical type of a model field.
///
/// Drives search eligibility, timestamp stamping and the zero-value rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Bool,
    Decimal,
    Uuid,
    DateTimeUtc,
    /// Naive date-time (`NaiveDateTime`, the `SeaORM` prelude `DateTime`).
    DateTime,
    DateTimeWithTimeZone,
    DateTimeLocal,
    Date,
    Time,
    Json,
    Bytes,
    Collection,
    Other,
}

impl FieldKind {
    /// Kinds stored as character data; everything else is cast before `LIKE`.
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(self, Self::String)
    }

    #[must_use]
    pub fn is_timestamp(self) -> bool {
        matches!(
            self,
            Self::DateTimeUtc | Self::DateTime | Self::DateTimeWithTimeZone | Self::DateTimeLocal
        )
    }
}

/// How "not supplied" is recognised for a field in a zero-skip patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZeroRule {
    /// Nullable (`Option<_>`) field: zero means unset (`NULL`).
    Unset,
    /// Plain field: zero means equal to the type's default value.
    Default,
}

/// Precomputed metadata for one model field.
#[allow(clippy::struct_excessive_bools)] // independent flags emitted by the derive
pub struct FieldDescriptor<E: EntityTrait> {
    /// Rust field name (raw prefix stripped).
    pub name: &'static str,
    pub column: E::Column,
    /// Resolved storage column name.
    pub column_name: &'static str,
    pub kind: FieldKind,
    pub zero: ZeroRule,
    pub primary_key: bool,
    /// Identifier or one of the managed timestamps.
    pub system: bool,
    pub searchable: bool,
    pub soft_delete: bool,
}

impl<E: EntityTrait> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("column_name", &self.column_name)
            .field("kind", &self.kind)
            .field("zero", &self.zero)
            .field("primary_key", &self.primary_key)
            .field("system", &self.system)
            .field("searchable", &self.searchable)
            .field("soft_delete", &self.soft_delete)
            .finish_non_exhaustive()
    }
}

/// A `SeaORM` entity with a static field-descriptor table.
///
/// Implement with `#[derive(CrudEntity)]` on the `Model` struct.
pub trait CrudEntity: EntityTrait + 'static {
    const FIELDS: &'static [FieldDescriptor<Self>];

    #[must_use]
    fn fields() -> &'static [FieldDescriptor<Self>] {
        Self::FIELDS
    }

    /// The identifier field.
    #[must_use]
    fn id_field() -> Option<&'static FieldDescriptor<Self>> {
        Self::FIELDS.iter().find(|f| f.primary_key)
    }

    /// The soft-delete timestamp, if the entity has one.
    #[must_use]
    fn soft_delete_field() -> Option<&'static FieldDescriptor<Self>> {
        Self::FIELDS.iter().find(|f| f.soft_delete)
    }

    /// Look up a descriptor by Rust field name.
    #[must_use]
    fn field(name: &str) -> Option<&'static FieldDescriptor<Self>> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    fn searchable_fields() -> impl Iterator<Item = &'static FieldDescriptor<Self>> {
        Self::FIELDS.iter().filter(|f| f.searchable)
    }

    /// Table name, used in logs and `NotFound` errors.
    #[must_use]
    fn entity_name() -> String {
        Self::default().table_name().to_owned()
    }
}

/// Stored name of the managed creation timestamp.
pub const CREATED_AT: &str = "created_at";
/// Stored name of the managed modification timestamp.
pub const UPDATED_AT: &str = "updated_at";
