//! Schema bootstrap.
//!
//! Tables and indexes are created idempotently at connect time; there are
//! no migration files. The composite primary key on `roles` is the store-
//! level guarantee behind the one-role-per-(film, person) invariant, and
//! `film_directors` join rows are the single representation of the
//! bidirectional directed-by relation.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

const CREATE_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS films (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        release_date TEXT,
        synopsis TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS people (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        date_of_birth TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        film_id TEXT NOT NULL REFERENCES films(id),
        person_id TEXT NOT NULL REFERENCES people(id),
        character TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (film_id, person_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS film_directors (
        film_id TEXT NOT NULL REFERENCES films(id),
        person_id TEXT NOT NULL REFERENCES people(id),
        PRIMARY KEY (film_id, person_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_roles_person ON roles(person_id)",
    "CREATE INDEX IF NOT EXISTS idx_film_directors_person ON film_directors(person_id)",
];

/// Create all catalog tables and indexes if they do not exist.
pub async fn init(pool: &SqlitePool) -> Result<()> {
    for statement in CREATE_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("schema initialized");
    Ok(())
}
