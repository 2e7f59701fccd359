//! Person database repository.

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

/// Person record from the database. Films directed and roles played are
/// derived from `film_directors` and `roles` join rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonRecord {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SortableEntity for PersonRecord {
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "name", "date_of_birth", "created_at", "updated_at"];
    const DEFAULT_SORT: &'static str = "name ASC";
}

/// Input for creating a person
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePerson {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Input for updating a person; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePerson {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Free-text and range filter for person search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonFilter {
    /// Whitespace-separated tokens matched against the name
    pub name: Option<String>,
    /// Strictly before this date of birth
    pub born_before: Option<NaiveDate>,
    /// Strictly after this date of birth
    pub born_after: Option<NaiveDate>,
}

const PERSON_COLUMNS: &str = "id, name, date_of_birth, created_at, updated_at";

fn person_from_row(row: &SqliteRow) -> Result<PersonRecord> {
    let id: String = row.try_get("id")?;
    let date_of_birth: Option<String> = row.try_get("date_of_birth")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(PersonRecord {
        id: str_to_uuid(&id)?,
        name: row.try_get("name")?,
        date_of_birth: str_to_date_opt(date_of_birth.as_deref())?,
        created_at: str_to_datetime(&created_at)?,
        updated_at: str_to_datetime(&updated_at)?,
    })
}

pub(crate) fn map_people(rows: &[SqliteRow]) -> Result<Vec<PersonRecord>> {
    rows.iter().map(person_from_row).collect()
}

// ============================================================================
// Connection-level operations, usable inside transactions
// ============================================================================

/// Fetch a person on an open connection.
pub(crate) async fn get(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<PersonRecord>> {
    let row = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1"))
        .bind(uuid_to_str(id))
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(person_from_row).transpose()
}

/// Fetch every person whose id is in `ids`; the result may be smaller
/// than the request when some ids do not exist.
pub(crate) async fn list_by_ids(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<Vec<PersonRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE id IN ({placeholders})");
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(uuid_to_str(*id));
    }
    let rows = query.fetch_all(&mut *conn).await?;
    map_people(&rows)
}

// ============================================================================
// Repository
// ============================================================================

pub struct PersonRepository {
    pool: SqlitePool,
}

impl PersonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a person by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<PersonRecord>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, id).await
    }

    /// Get every person for the given ids; missing ids are simply absent
    /// from the result.
    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PersonRecord>> {
        let mut conn = self.pool.acquire().await?;
        list_by_ids(&mut conn, ids).await
    }

    /// Check whether a person exists
    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE id = ?1")
            .bind(uuid_to_str(id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Create a new person
    pub async fn create(&self, input: CreatePerson) -> Result<PersonRecord> {
        let now = Utc::now();
        let record = PersonRecord {
            id: Uuid::new_v4(),
            name: input.name,
            date_of_birth: input.date_of_birth,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO people (id, name, date_of_birth, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(uuid_to_str(record.id))
        .bind(&record.name)
        .bind(date_opt_to_str(record.date_of_birth))
        .bind(datetime_to_str(record.created_at))
        .bind(datetime_to_str(record.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    /// Update a person; returns the fresh record, or `None` if the id
    /// does not exist.
    pub async fn update(&self, id: Uuid, input: UpdatePerson) -> Result<Option<PersonRecord>> {
        sqlx::query(
            "UPDATE people SET
                name = COALESCE(?2, name),
                date_of_birth = COALESCE(?3, date_of_birth),
                updated_at = ?4
             WHERE id = ?1",
        )
        .bind(uuid_to_str(id))
        .bind(input.name)
        .bind(date_opt_to_str(input.date_of_birth))
        .bind(datetime_to_str(Utc::now()))
        .execute(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    /// Delete a person along with their roles and director links.
    ///
    /// The three deletions commit atomically. Returns false when the
    /// person was already absent.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let id_str = uuid_to_str(id);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM roles WHERE person_id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM film_directors WHERE person_id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM people WHERE id = ?1")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Search people by free text and birth-date range, with whitelisted
    /// sorting and offset pagination.
    pub async fn search(
        &self,
        filter: &PersonFilter,
        sort: &[SortKey],
        page: &Page,
    ) -> Result<SearchPage<PersonRecord>> {
        let condition = Predicate::all(vec![
            predicate::text_contains_any("name", filter.name.as_deref()),
            predicate::date_before("date_of_birth", filter.born_before),
            predicate::date_after("date_of_birth", filter.born_after),
        ]);

        let where_clause = match &condition {
            Some(p) => format!(" WHERE {}", p.sql()),
            None => String::new(),
        };
        let binds: &[String] = condition.as_ref().map(|p| p.binds()).unwrap_or(&[]);

        let count_sql = format!("SELECT COUNT(*) FROM people{where_clause}");
        let mut count_query = sqlx::query_scalar::<sqlx::Sqlite, i64>(&count_sql);
        for value in binds {
            count_query = count_query.bind(value.as_str());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let order = order_by_clause::<PersonRecord>(sort);
        let limit = page.limit();
        let offset = page.offset();
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM people{where_clause} ORDER BY {order} LIMIT {limit} OFFSET {offset}"
        );
        debug!(sql = %sql, "executing person search");

        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(value.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(SearchPage {
            items: map_people(&rows)?,
            total,
            limit,
            offset,
        })
    }
}
