//! Database connection, schema bootstrap, and repositories.

pub mod directors;
pub mod films;
pub mod people;
pub mod roles;
pub mod schema;
pub mod sqlite_helpers;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use films::{CreateFilm, FilmFilter, FilmRecord, FilmRepository, UpdateFilm};
pub use people::{CreatePerson, PersonFilter, PersonRecord, PersonRepository, UpdatePerson};
pub use roles::{RoleKey, RoleRecord};

use crate::services::{CastService, DirectorService};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Wrap an existing pool. The schema is assumed to be bootstrapped.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Open the database at `url`, creating the file if missing, and
    /// bootstrap the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(Self::get_max_connections())
            .connect_with(options)
            .await?;
        let db = Self { pool };
        schema::init(&db.pool).await?;
        Ok(db)
    }

    /// In-memory database, mainly for tests. A single never-reaped
    /// connection keeps every query on the same memory store.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        schema::init(&db.pool).await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a film repository
    pub fn films(&self) -> FilmRepository {
        FilmRepository::new(self.pool.clone())
    }

    /// Get a person repository
    pub fn people(&self) -> PersonRepository {
        PersonRepository::new(self.pool.clone())
    }

    /// Get the director association service
    pub fn directors(&self) -> DirectorService {
        DirectorService::new(self.pool.clone())
    }

    /// Get the cast reconciliation service
    pub fn cast(&self) -> CastService {
        CastService::new(self.pool.clone())
    }
}

/// True when an error from the db layer is a uniqueness-constraint
/// violation surfaced by SQLite.
pub(crate) fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}
