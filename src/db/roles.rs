//! Role storage: the cast join records between films and people.
//!
//! A role is addressed by its composite key (film_id, person_id); the
//! composite PRIMARY KEY in the schema makes a second role for the same
//! pair impossible at the store level. All mutation goes through the cast
//! service, which calls the connection-level operations here inside its
//! own transactions.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::db::sqlite_helpers::{datetime_to_str, str_to_datetime, str_to_uuid, uuid_to_str};
use crate::query::SortableEntity;

/// Composite key identifying one person's part in one film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RoleKey {
    pub film_id: Uuid,
    pub person_id: Uuid,
}

impl RoleKey {
    pub fn new(film_id: Uuid, person_id: Uuid) -> Self {
        Self { film_id, person_id }
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "film {} / person {}", self.film_id, self.person_id)
    }
}

/// Role record from the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRecord {
    pub film_id: Uuid,
    pub person_id: Uuid,
    pub character: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRecord {
    pub fn key(&self) -> RoleKey {
        RoleKey::new(self.film_id, self.person_id)
    }
}

impl SortableEntity for RoleRecord {
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["film_id", "person_id", "character", "created_at"];
    const DEFAULT_SORT: &'static str = "character ASC";
}

const ROLE_COLUMNS: &str = "film_id, person_id, character, created_at, updated_at";

fn role_from_row(row: &SqliteRow) -> Result<RoleRecord> {
    let film_id: String = row.try_get("film_id")?;
    let person_id: String = row.try_get("person_id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(RoleRecord {
        film_id: str_to_uuid(&film_id)?,
        person_id: str_to_uuid(&person_id)?,
        character: row.try_get("character")?,
        created_at: str_to_datetime(&created_at)?,
        updated_at: str_to_datetime(&updated_at)?,
    })
}

/// Fetch a role by its composite key.
pub(crate) async fn get(conn: &mut SqliteConnection, key: RoleKey) -> Result<Option<RoleRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE film_id = ?1 AND person_id = ?2"
    ))
    .bind(uuid_to_str(key.film_id))
    .bind(uuid_to_str(key.person_id))
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(role_from_row).transpose()
}

/// Every role of a film.
pub(crate) async fn list_for_film(
    conn: &mut SqliteConnection,
    film_id: Uuid,
) -> Result<Vec<RoleRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE film_id = ?1 ORDER BY character, person_id"
    ))
    .bind(uuid_to_str(film_id))
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(role_from_row).collect()
}

/// Every role a person has, across films.
pub(crate) async fn list_for_person(
    conn: &mut SqliteConnection,
    person_id: Uuid,
) -> Result<Vec<RoleRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE person_id = ?1 ORDER BY character, film_id"
    ))
    .bind(uuid_to_str(person_id))
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(role_from_row).collect()
}

/// Insert a new role. A composite-key collision surfaces as a database
/// error the caller inspects with [`crate::db::is_unique_violation`].
pub(crate) async fn insert(conn: &mut SqliteConnection, role: &RoleRecord) -> Result<()> {
    sqlx::query(
        "INSERT INTO roles (film_id, person_id, character, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(uuid_to_str(role.film_id))
    .bind(uuid_to_str(role.person_id))
    .bind(&role.character)
    .bind(datetime_to_str(role.created_at))
    .bind(datetime_to_str(role.updated_at))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Update the character of an existing role in place; `created_at` is
/// untouched. Returns false when no role exists for the key.
pub(crate) async fn update_character(
    conn: &mut SqliteConnection,
    key: RoleKey,
    character: &str,
    at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE roles SET character = ?3, updated_at = ?4
         WHERE film_id = ?1 AND person_id = ?2",
    )
    .bind(uuid_to_str(key.film_id))
    .bind(uuid_to_str(key.person_id))
    .bind(character)
    .bind(datetime_to_str(at))
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a role. Returns false when it was already absent.
pub(crate) async fn delete(conn: &mut SqliteConnection, key: RoleKey) -> Result<bool> {
    let result = sqlx::query("DELETE FROM roles WHERE film_id = ?1 AND person_id = ?2")
        .bind(uuid_to_str(key.film_id))
        .bind(uuid_to_str(key.person_id))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every role of a film; returns the number removed.
pub(crate) async fn delete_for_film(conn: &mut SqliteConnection, film_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM roles WHERE film_id = ?1")
        .bind(uuid_to_str(film_id))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
