//! Partial-update merging.
//!
//! A patch is the entity's `ActiveModel`: `Set` fields are supplied, `NotSet`
//! fields are left alone. This keeps "set to zero" distinct from "omit".

use sea_orm::{ActiveModelTrait, ActiveValue, IntoActiveModel, ModelTrait};

use crate::fields::CrudEntity;
use crate::value::is_zero;

/// Overlay every supplied non-identifier field of `patch` onto `existing`.
///
/// Fields the patch leaves unset keep their persisted value and stay
/// `Unchanged` in the result, so only supplied columns are written.
#[must_use]
pub fn merge<E>(existing: E::Model, patch: &E::ActiveModel) -> E::ActiveModel
where
    E: CrudEntity,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let mut merged = existing.into_active_model();
    for field in E::fields().iter().filter(|f| !f.primary_key) {
        if let ActiveValue::Set(value) = patch.get(field.column) {
            merged.set(field.column, value);
        }
    }
    merged
}

/// `true` when the patch supplies no field besides the identifier.
#[must_use]
pub fn is_empty_patch<E: CrudEntity>(patch: &E::ActiveModel) -> bool {
    E::fields()
        .iter()
        .filter(|f| !f.primary_key)
        .all(|f| !patch.get(f.column).is_set())
}

/// Build a patch from a fully populated model, treating zero values as
/// "not supplied".
///
/// Nullable fields count as supplied when they are `Some`; other fields when
/// they differ from their type's default. The identifier is always kept. With
/// this builder a field can never be reset to its zero value.
#[must_use]
pub fn non_zero_patch<E: CrudEntity>(model: &E::Model) -> E::ActiveModel {
    let mut patch = <E::ActiveModel as ActiveModelTrait>::default();
    for field in E::fields() {
        let value = model.get(field.column);
        if field.primary_key || !is_zero(field.zero, &value) {
            patch.set(field.column, value);
        }
    }
    patch
}

/// Fields of `patch` that are `Set`, by Rust field name.
pub fn supplied_fields<E: CrudEntity>(
    patch: &E::ActiveModel,
) -> impl Iterator<Item = &'static str> + '_ {
    E::fields()
        .iter()
        .filter(move |f| patch.get(f.column).is_set())
        .map(|f| f.name)
}
