//! Shared setup for the integration suite.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use chrono::NaiveDate;
use cinelog::Database;
use cinelog::db::{CreateFilm, CreatePerson, FilmRecord, PersonRecord};

/// Fresh in-memory database with the schema bootstrapped.
pub async fn test_db() -> Database {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    Database::connect_in_memory()
        .await
        .expect("in-memory database")
}

pub async fn film(db: &Database, title: &str, year: i32) -> FilmRecord {
    db.films()
        .create(CreateFilm {
            title: title.to_string(),
            release_date: NaiveDate::from_ymd_opt(year, 6, 1),
            synopsis: None,
        })
        .await
        .expect("create film")
}

pub async fn person(db: &Database, name: &str) -> PersonRecord {
    db.people()
        .create(CreatePerson {
            name: name.to_string(),
            date_of_birth: None,
        })
        .await
        .expect("create person")
}

pub async fn person_born(db: &Database, name: &str, year: i32, month: u32, day: u32) -> PersonRecord {
    db.people()
        .create(CreatePerson {
            name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(year, month, day),
        })
        .await
        .expect("create person")
}
