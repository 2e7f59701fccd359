//! Directed-by join rows between films and people.
//!
//! One row per (film, person) pairing is the single representation of
//! both `film.directors` and `person.films_directed`, so the two sides
//! can never disagree. The director service is the only writer.

use anyhow::Result;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::db::films::{FilmRecord, map_films};
use crate::db::people::{PersonRecord, map_people};
use crate::db::sqlite_helpers::{str_to_uuid, uuid_to_str};

/// Add a pairing; returns false when it already existed.
pub(crate) async fn link(
    conn: &mut SqliteConnection,
    film_id: Uuid,
    person_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO film_directors (film_id, person_id) VALUES (?1, ?2)",
    )
    .bind(uuid_to_str(film_id))
    .bind(uuid_to_str(person_id))
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove a pairing; returns false when it did not exist.
pub(crate) async fn unlink(
    conn: &mut SqliteConnection,
    film_id: Uuid,
    person_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM film_directors WHERE film_id = ?1 AND person_id = ?2")
        .bind(uuid_to_str(film_id))
        .bind(uuid_to_str(person_id))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove every pairing of a film; returns the number removed.
pub(crate) async fn clear_film(conn: &mut SqliteConnection, film_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM film_directors WHERE film_id = ?1")
        .bind(uuid_to_str(film_id))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Ids of the people directing a film.
pub(crate) async fn person_ids_for_film(
    conn: &mut SqliteConnection,
    film_id: Uuid,
) -> Result<Vec<Uuid>> {
    let rows = sqlx::query("SELECT person_id FROM film_directors WHERE film_id = ?1")
        .bind(uuid_to_str(film_id))
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| {
            let id: String = row.try_get("person_id")?;
            str_to_uuid(&id)
        })
        .collect()
}

/// Directors of a film, sorted by name.
pub(crate) async fn people_for_film(
    conn: &mut SqliteConnection,
    film_id: Uuid,
) -> Result<Vec<PersonRecord>> {
    let rows = sqlx::query(
        "SELECT p.id, p.name, p.date_of_birth, p.created_at, p.updated_at
         FROM people p
         JOIN film_directors fd ON fd.person_id = p.id
         WHERE fd.film_id = ?1
         ORDER BY p.name, p.id",
    )
    .bind(uuid_to_str(film_id))
    .fetch_all(&mut *conn)
    .await?;
    map_people(&rows)
}

/// Films a person directed, sorted by title.
pub(crate) async fn films_for_person(
    conn: &mut SqliteConnection,
    person_id: Uuid,
) -> Result<Vec<FilmRecord>> {
    let rows = sqlx::query(
        "SELECT f.id, f.title, f.release_date, f.synopsis, f.created_at, f.updated_at
         FROM films f
         JOIN film_directors fd ON fd.film_id = f.id
         WHERE fd.person_id = ?1
         ORDER BY f.title, f.id",
    )
    .bind(uuid_to_str(person_id))
    .fetch_all(&mut *conn)
    .await?;
    map_films(&rows)
}
