#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;

use modkit_crud::{DbConnConfig, PoolCfg, SeaOrmRepository};
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DatabaseConnection};

pub mod author {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, DeriveEntityModel, modkit_crud::CrudEntity)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
        pub email: String,
        #[serde(skip_serializing)]
        #[crud(no_search)]
        pub password_hash: String,
        pub active: bool,
        pub role: String,
        pub company_id: Option<i64>,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::post::Entity")]
        Posts,
    }

    impl Related<super::post::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Posts.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod post {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, DeriveEntityModel, modkit_crud::CrudEntity)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub title: String,
        pub body: String,
        pub views: i32,
        pub published: bool,
        pub author_id: i64,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::author::Entity",
            from = "Column::AuthorId",
            to = "super::author::Column::Id"
        )]
        Author,
    }

    impl Related<super::author::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Author.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Entity with nothing searchable and no soft-delete column.
pub mod blob {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, modkit_crud::CrudEntity)]
    #[sea_orm(table_name = "blobs")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub data: Vec<u8>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

const SCHEMA: [&str; 3] = [
    "CREATE TABLE authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        active BOOLEAN NOT NULL,
        role TEXT NOT NULL,
        company_id INTEGER NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT NULL
    )",
    "CREATE TABLE posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        views INTEGER NOT NULL,
        published BOOLEAN NOT NULL,
        author_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT NULL
    )",
    "CREATE TABLE blobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        data BLOB NOT NULL
    )",
];

/// Fresh in-memory database with the fixture schema.
///
/// A single pooled connection keeps every query on the same in-memory
/// database.
pub async fn setup() -> Arc<DatabaseConnection> {
    let cfg = DbConnConfig {
        dsn: "sqlite::memory:".to_owned(),
        pool: PoolCfg {
            max_conns: Some(1),
            ..PoolCfg::default()
        },
        sqlx_logging: false,
    };
    let conn = cfg.connect().await.expect("connect to in-memory sqlite");
    for ddl in SCHEMA {
        conn.execute_unprepared(ddl).await.expect("create schema");
    }
    Arc::new(conn)
}

pub fn new_author(name: &str) -> author::ActiveModel {
    author::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(format!("{}@example.com", name.to_lowercase())),
        password_hash: Set("$argon2id$secret".to_owned()),
        active: Set(true),
        role: Set("writer".to_owned()),
        company_id: Set(Some(7)),
        ..Default::default()
    }
}

pub fn new_post(author_id: i64, title: &str, body: &str) -> post::ActiveModel {
    post::ActiveModel {
        title: Set(title.to_owned()),
        body: Set(body.to_owned()),
        views: Set(0),
        published: Set(false),
        author_id: Set(author_id),
        ..Default::default()
    }
}

pub fn authors(conn: &Arc<DatabaseConnection>) -> SeaOrmRepository<author::Entity> {
    SeaOrmRepository::new(Arc::clone(conn))
}

pub fn posts(conn: &Arc<DatabaseConnection>) -> SeaOrmRepository<post::Entity> {
    SeaOrmRepository::new(Arc::clone(conn))
}
