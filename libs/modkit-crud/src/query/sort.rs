//! Ordering and pagination primitives.

use sea_orm::sea_query::{Expr, Order};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, Select};

use crate::error::{RepoError, RepoResult};
use crate::fields::CrudEntity;

/// One `ORDER BY` term parsed from a caller-supplied sort string.
#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub expr: String,
    pub order: Order,
}

/// Split `"name DESC, id"` into ordering terms.
///
/// A trailing `ASC`/`DESC` word (any case) sets the direction; whatever
/// precedes it is kept verbatim. Blank segments are skipped.
#[must_use]
pub fn parse_sort(sort_by: &str) -> Vec<SortKey> {
    sort_by
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|term| match term.rsplit_once(char::is_whitespace) {
            Some((expr, dir)) if dir.eq_ignore_ascii_case("desc") => SortKey {
                expr: expr.trim_end().to_owned(),
                order: Order::Desc,
            },
            Some((expr, dir)) if dir.eq_ignore_ascii_case("asc") => SortKey {
                expr: expr.trim_end().to_owned(),
                order: Order::Asc,
            },
            _ => SortKey {
                expr: term.to_owned(),
                order: Order::Asc,
            },
        })
        .collect()
}

/// Apply `sort_by`, or the primary key ascending when it is blank.
///
/// Expressions reach the store unvalidated; a malformed one surfaces as a
/// store error when the query runs.
#[must_use]
pub fn apply_sort<E: CrudEntity>(mut select: Select<E>, sort_by: &str) -> Select<E> {
    let keys = parse_sort(sort_by);
    if keys.is_empty() {
        if let Some(id) = E::id_field() {
            select = select.order_by(id.column, Order::Asc);
        }
        return select;
    }
    for key in keys {
        select = select.order_by(Expr::cust(key.expr), key.order);
    }
    select
}

/// Translate 1-based `page` and `limit` into `(offset, limit)`.
///
/// `limit <= 0` disables pagination.
///
/// # Errors
/// `Validation` when `limit` is positive and `page` is not, since the
/// resulting offset would be negative.
pub fn page_window(page: i64, limit: i64) -> RepoResult<Option<(u64, u64)>> {
    if limit <= 0 {
        return Ok(None);
    }
    if page <= 0 {
        return Err(RepoError::validation(format!(
            "page must be 1 or greater when limit is set, got {page}"
        )));
    }
    let limit = limit.unsigned_abs();
    let offset = (page - 1).unsigned_abs().saturating_mul(limit);
    Ok(Some((offset, limit)))
}

/// Apply [`page_window`] to a select.
///
/// # Errors
/// See [`page_window`].
pub fn apply_page<E: EntityTrait>(
    select: Select<E>,
    page: i64,
    limit: i64,
) -> RepoResult<Select<E>> {
    Ok(match page_window(page, limit)? {
        Some((offset, limit)) => select.offset(offset).limit(limit),
        None => select,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_suffix_is_case_insensitive() {
        assert_eq!(
            parse_sort("name desc, created_at ASC ,id"),
            vec![
                SortKey {
                    expr: "name".to_owned(),
                    order: Order::Desc
                },
                SortKey {
                    expr: "created_at".to_owned(),
                    order: Order::Asc
                },
                SortKey {
                    expr: "id".to_owned(),
                    order: Order::Asc
                },
            ]
        );
    }

    #[test]
    fn expressions_are_kept_verbatim() {
        let keys = parse_sort("lower(name)  DESC");
        assert_eq!(keys[0].expr, "lower(name)");
        assert_eq!(keys[0].order, Order::Desc);

        let keys = parse_sort("description");
        assert_eq!(keys[0].expr, "description");
        assert_eq!(keys[0].order, Order::Asc);
    }

    #[test]
    fn blank_sort_yields_no_keys() {
        assert!(parse_sort("").is_empty());
        assert!(parse_sort(" , ").is_empty());
    }

    #[test]
    fn pages_are_one_based() {
        assert_eq!(page_window(1, 10).unwrap(), Some((0, 10)));
        assert_eq!(page_window(2, 10).unwrap(), Some((10, 10)));
        assert_eq!(page_window(3, 25).unwrap(), Some((50, 25)));
    }

    #[test]
    fn non_positive_limit_disables_paging() {
        assert_eq!(page_window(5, 0).unwrap(), None);
        assert_eq!(page_window(0, -1).unwrap(), None);
    }

    #[test]
    fn non_positive_page_is_rejected() {
        assert!(page_window(0, 10).unwrap_err().is_validation());
        assert!(page_window(-3, 10).unwrap_err().is_validation());
    }
}
