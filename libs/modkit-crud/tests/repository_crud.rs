#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{author, authors, blob, new_author, new_post, post, posts, setup};
use modkit_crud::{Conditions, CrudRepository, RepoError, SeaOrmRepository, non_zero_patch};
use sea_orm::ActiveValue::Set;
use sea_orm::TransactionTrait;
use tracing_test::traced_test;

#[tokio::test]
async fn create_then_read_by_id_round_trips() {
    let conn = setup().await;
    let repo = authors(&conn);

    let created = repo.create(new_author("Ada")).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.name, "Ada");
    assert_eq!(created.email, "ada@example.com");
    assert_eq!(created.company_id, Some(7));
    assert_eq!(created.created_at, created.updated_at);
    assert!(created.deleted_at.is_none());

    let found = repo
        .read_by_id(created.id.unsigned_abs(), &[])
        .await
        .unwrap();
    assert_eq!(found.model, created);
    assert!(found.related.is_empty());
}

#[tokio::test]
async fn create_keeps_caller_supplied_timestamps() {
    let conn = setup().await;
    let repo = authors(&conn);
    let at = chrono::DateTime::parse_from_rfc3339("2020-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    let created = repo
        .create(author::ActiveModel {
            created_at: Set(at),
            ..new_author("Grace")
        })
        .await
        .unwrap();
    assert_eq!(created.created_at, at);
    assert_ne!(created.updated_at, at);
}

#[tokio::test]
async fn read_by_id_of_missing_row_is_not_found() {
    let conn = setup().await;
    let err = authors(&conn).read_by_id(42, &[]).await.unwrap_err();
    assert!(
        matches!(err, RepoError::NotFound { ref entity, id: 42 } if entity == "authors"),
        "{err}"
    );
}

#[tokio::test]
async fn update_merges_supplied_fields_only() {
    let conn = setup().await;
    let repo = authors(&conn);
    let created = repo.create(new_author("Linus")).await.unwrap();

    let updated = repo
        .update(author::ActiveModel {
            id: Set(created.id),
            role: Set("editor".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(updated.role, "editor");
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.password_hash, created.password_hash);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let stored = repo
        .read_by_id(created.id.unsigned_abs(), &[])
        .await
        .unwrap();
    assert_eq!(stored.model, updated);
}

#[tokio::test]
async fn update_can_reset_fields_to_zero() {
    let conn = setup().await;
    let repo = authors(&conn);
    let created = repo.create(new_author("Barbara")).await.unwrap();

    let updated = repo
        .update(author::ActiveModel {
            id: Set(created.id),
            active: Set(false),
            company_id: Set(None),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!updated.active);
    assert_eq!(updated.company_id, None);
}

#[tokio::test]
async fn zero_skip_patch_ignores_default_values() {
    let conn = setup().await;
    let repo = authors(&conn);
    let created = repo.create(new_author("Ken")).await.unwrap();

    let mut full = created.clone();
    full.name = String::new();
    full.active = false;
    full.role = "admin".to_owned();
    full.company_id = None;

    let updated = repo
        .update(non_zero_patch::<author::Entity>(&full))
        .await
        .unwrap();
    assert_eq!(updated.role, "admin");
    assert_eq!(updated.name, "Ken");
    assert!(updated.active);
    assert_eq!(updated.company_id, Some(7));
}

#[tokio::test]
async fn update_without_identifier_is_rejected() {
    let conn = setup().await;
    let repo = authors(&conn);

    let err = repo
        .update(author::ActiveModel {
            name: Set("nobody".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");

    let err = repo
        .update(author::ActiveModel {
            id: Set(0),
            name: Set("nobody".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let conn = setup().await;
    let err = authors(&conn)
        .update(author::ActiveModel {
            id: Set(99),
            name: Set("ghost".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn update_with_nothing_supplied_returns_stored_row() {
    let conn = setup().await;
    let repo = authors(&conn);
    let created = repo.create(new_author("Dennis")).await.unwrap();

    let same = repo
        .update(author::ActiveModel {
            id: Set(created.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(same, created);
}

#[tokio::test]
async fn delete_soft_deletes_the_row() {
    let conn = setup().await;
    let repo = authors(&conn);
    let keep = repo.create(new_author("Alan")).await.unwrap();
    let gone = repo.create(new_author("Edsger")).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 2);

    repo.delete(gone.id.unsigned_abs()).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 1);

    let still_there = repo.read_by_id(gone.id.unsigned_abs(), &[]).await.unwrap();
    assert!(still_there.deleted_at.is_some());
    assert_eq!(still_there.name, "Edsger");

    let listed = repo
        .read(0, 0, "", &Conditions::new(), &[])
        .await
        .unwrap();
    let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![keep.id]);
}

#[tokio::test]
async fn deleted_rows_cannot_be_updated_or_deleted_again() {
    let conn = setup().await;
    let repo = authors(&conn);
    let created = repo.create(new_author("Niklaus")).await.unwrap();
    let id = created.id.unsigned_abs();

    repo.delete(id).await.unwrap();

    assert!(repo.delete(id).await.unwrap_err().is_not_found());
    let err = repo
        .update(author::ActiveModel {
            id: Set(created.id),
            name: Set("revived".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn delete_validates_identifier() {
    let conn = setup().await;
    let repo = authors(&conn);
    assert!(repo.delete(0).await.unwrap_err().is_validation());
    assert!(repo.delete(5).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[traced_test]
async fn entities_without_soft_delete_are_removed() {
    let conn = setup().await;
    let repo: SeaOrmRepository<blob::Entity> = SeaOrmRepository::new(conn);
    let created = repo
        .create(blob::ActiveModel {
            data: Set(vec![1, 2, 3]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(repo.count().await.unwrap(), 1);

    repo.delete(created.id.unsigned_abs()).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 0);
    assert!(
        repo.read_by_id(created.id.unsigned_abs(), &[])
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(logs_contain("no soft-delete column"));
}

#[tokio::test]
async fn update_lookup_and_write_share_the_callers_transaction() {
    let conn = setup().await;
    let repo = posts(&conn);
    let created = repo
        .create(new_post(1, "draft", "first version"))
        .await
        .unwrap();

    // The pool holds a single connection, so any statement issued outside
    // `txn` would wait for it instead of completing.
    let txn = repo.conn().begin().await.unwrap();
    let updated = SeaOrmRepository::<post::Entity>::update_in(
        &txn,
        post::ActiveModel {
            id: Set(created.id),
            title: Set("final".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "final");
    txn.rollback().await.unwrap();

    let stored = repo
        .read_by_id(created.id.unsigned_abs(), &[])
        .await
        .unwrap();
    assert_eq!(stored.model, created);
}

#[tokio::test]
async fn failed_step_leaves_earlier_writes_uncommitted() {
    let conn = setup().await;
    let repo = posts(&conn);
    let first = repo.create(new_post(1, "one", "")).await.unwrap();
    let second = repo.create(new_post(1, "two", "")).await.unwrap();

    let txn = repo.conn().begin().await.unwrap();
    SeaOrmRepository::<post::Entity>::update_in(
        &txn,
        post::ActiveModel {
            id: Set(first.id),
            views: Set(99),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    SeaOrmRepository::<post::Entity>::delete_in(&txn, second.id.unsigned_abs())
        .await
        .unwrap();
    let err = SeaOrmRepository::<post::Entity>::delete_in(&txn, 404)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    txn.rollback().await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 2);
    let stored = repo.read_by_id(first.id.unsigned_abs(), &[]).await.unwrap();
    assert_eq!(stored.views, 0);
}

#[tokio::test]
async fn caller_transaction_commits_every_step() {
    let conn = setup().await;
    let repo = posts(&conn);
    let first = repo.create(new_post(1, "one", "")).await.unwrap();
    let second = repo.create(new_post(1, "two", "")).await.unwrap();

    let txn = repo.conn().begin().await.unwrap();
    SeaOrmRepository::<post::Entity>::update_in(
        &txn,
        post::ActiveModel {
            id: Set(first.id),
            published: Set(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    SeaOrmRepository::<post::Entity>::delete_in(&txn, second.id.unsigned_abs())
        .await
        .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 1);
    assert!(
        repo.read_by_id(first.id.unsigned_abs(), &[])
            .await
            .unwrap()
            .published
    );
}

#[tokio::test]
async fn constraint_violations_surface_as_store_errors() {
    let conn = setup().await;
    let repo = posts(&conn);
    let created = repo.create(new_post(1, "a", "b")).await.unwrap();

    let err = repo
        .create(post::ActiveModel {
            id: Set(created.id),
            ..new_post(1, "dup", "dup")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Store { op: "create", .. }), "{err}");
}
