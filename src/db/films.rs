//! Film database repository.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::db::sqlite_helpers::{
    date_opt_to_str, datetime_to_str, str_to_date_opt, str_to_datetime, str_to_uuid, uuid_to_str,
};
use crate::query::{Page, Predicate, SearchPage, SortKey, SortableEntity, order_by_clause, predicate};

/// Film record from the database. Directors and cast are not columns;
/// they are derived from `film_directors` and `roles` join rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmRecord {
    pub id: Uuid,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub synopsis: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SortableEntity for FilmRecord {
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "title", "release_date", "created_at", "updated_at"];
    const DEFAULT_SORT: &'static str = "title ASC";
}

/// Input for creating a film
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFilm {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub synopsis: Option<String>,
}

/// Input for updating a film; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFilm {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub synopsis: Option<String>,
}

/// Free-text and range filter for film search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilmFilter {
    /// Whitespace-separated tokens matched against the title; any token
    /// matching is sufficient
    pub title: Option<String>,
    /// Strictly before this date
    pub released_before: Option<NaiveDate>,
    /// Strictly after this date
    pub released_after: Option<NaiveDate>,
}

const FILM_COLUMNS: &str = "id, title, release_date, synopsis, created_at, updated_at";

fn film_from_row(row: &SqliteRow) -> Result<FilmRecord> {
    let id: String = row.try_get("id")?;
    let release_date: Option<String> = row.try_get("release_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(FilmRecord {
        id: str_to_uuid(&id)?,
        title: row.try_get("title")?,
        release_date: str_to_date_opt(release_date.as_deref())?,
        synopsis: row.try_get("synopsis")?,
        created_at: str_to_datetime(&created_at)?,
        updated_at: str_to_datetime(&updated_at)?,
    })
}

pub(crate) fn map_films(rows: &[SqliteRow]) -> Result<Vec<FilmRecord>> {
    rows.iter().map(film_from_row).collect()
}

// ============================================================================
// Connection-level operations, usable inside transactions
// ============================================================================

/// Fetch a film on an open connection.
pub(crate) async fn get(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<FilmRecord>> {
    let row = sqlx::query(&format!("SELECT {FILM_COLUMNS} FROM films WHERE id = ?1"))
        .bind(uuid_to_str(id))
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(film_from_row).transpose()
}

/// Fetch every film whose id is in `ids`; the result may be smaller than
/// the request when some ids do not exist.
pub(crate) async fn list_by_ids(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<Vec<FilmRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT {FILM_COLUMNS} FROM films WHERE id IN ({placeholders})");
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(uuid_to_str(*id));
    }
    let rows = query.fetch_all(&mut *conn).await?;
    map_films(&rows)
}

/// Bump a film's `updated_at`, marking an association change as a write
/// to the owning film.
pub(crate) async fn touch(conn: &mut SqliteConnection, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE films SET updated_at = ?2 WHERE id = ?1")
        .bind(uuid_to_str(id))
        .bind(datetime_to_str(at))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ============================================================================
// Repository
// ============================================================================

pub struct FilmRepository {
    pool: SqlitePool,
}

impl FilmRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a film by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FilmRecord>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, id).await
    }

    /// Get every film for the given ids; missing ids are simply absent
    /// from the result.
    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<FilmRecord>> {
        let mut conn = self.pool.acquire().await?;
        list_by_ids(&mut conn, ids).await
    }

    /// Check whether a film exists
    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM films WHERE id = ?1")
            .bind(uuid_to_str(id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Create a new film
    pub async fn create(&self, input: CreateFilm) -> Result<FilmRecord> {
        let now = Utc::now();
        let record = FilmRecord {
            id: Uuid::new_v4(),
            title: input.title,
            release_date: input.release_date,
            synopsis: input.synopsis,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO films (id, title, release_date, synopsis, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(uuid_to_str(record.id))
        .bind(&record.title)
        .bind(date_opt_to_str(record.release_date))
        .bind(&record.synopsis)
        .bind(datetime_to_str(record.created_at))
        .bind(datetime_to_str(record.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    /// Update a film; returns the fresh record, or `None` if the id does
    /// not exist.
    pub async fn update(&self, id: Uuid, input: UpdateFilm) -> Result<Option<FilmRecord>> {
        sqlx::query(
            "UPDATE films SET
                title = COALESCE(?2, title),
                release_date = COALESCE(?3, release_date),
                synopsis = COALESCE(?4, synopsis),
                updated_at = ?5
             WHERE id = ?1",
        )
        .bind(uuid_to_str(id))
        .bind(input.title)
        .bind(date_opt_to_str(input.release_date))
        .bind(input.synopsis)
        .bind(datetime_to_str(Utc::now()))
        .execute(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    /// Delete a film along with its roles and director links.
    ///
    /// The three deletions commit atomically; join rows never outlive the
    /// film. Returns false when the film was already absent.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let id_str = uuid_to_str(id);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM roles WHERE film_id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM film_directors WHERE film_id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM films WHERE id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Search films by free text and release-date range, with whitelisted
    /// sorting and offset pagination.
    pub async fn search(
        &self,
        filter: &FilmFilter,
        sort: &[SortKey],
        page: &Page,
    ) -> Result<SearchPage<FilmRecord>> {
        let condition = Predicate::all(vec![
            predicate::text_contains_any("title", filter.title.as_deref()),
            predicate::date_before("release_date", filter.released_before),
            predicate::date_after("release_date", filter.released_after),
        ]);

        let where_clause = match &condition {
            Some(p) => format!(" WHERE {}", p.sql()),
            None => String::new(),
        };
        let binds: &[String] = condition.as_ref().map(|p| p.binds()).unwrap_or(&[]);

        let count_sql = format!("SELECT COUNT(*) FROM films{where_clause}");
        let mut count_query = sqlx::query_scalar::<sqlx::Sqlite, i64>(&count_sql);
        for value in binds {
            count_query = count_query.bind(value.as_str());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let order = order_by_clause::<FilmRecord>(sort);
        let limit = page.limit();
        let offset = page.offset();
        let sql = format!(
            "SELECT {FILM_COLUMNS} FROM films{where_clause} ORDER BY {order} LIMIT {limit} OFFSET {offset}"
        );
        debug!(sql = %sql, "executing film search");

        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(value.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(SearchPage {
            items: map_films(&rows)?,
            total,
            limit,
            offset,
        })
    }
}
