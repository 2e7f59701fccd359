//! Director association maintenance.
//!
//! The film↔person "directed" relation is stored as `film_directors` join
//! rows keyed by (film_id, person_id). This service is the only code path
//! that writes them, so a film's director set and a person's directed
//! films always read consistently; there is no second copy to drift.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::db::{FilmRecord, PersonRecord, directors, films, people};
use crate::error::{CatalogError, EntityKind};

pub struct DirectorService {
    pool: SqlitePool,
}

impl DirectorService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Link a person as a director of a film. Adding an already-present
    /// director is a no-op.
    pub async fn set_director(&self, film_id: Uuid, person_id: Uuid) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;

        if films::get(&mut tx, film_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                kind: EntityKind::Film,
                id: film_id,
            });
        }
        if people::get(&mut tx, person_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                kind: EntityKind::Person,
                id: person_id,
            });
        }

        let inserted = directors::link(&mut tx, film_id, person_id).await?;
        if inserted {
            films::touch(&mut tx, film_id, Utc::now()).await?;
        }
        tx.commit().await?;

        debug!(%film_id, %person_id, inserted, "set director");
        Ok(())
    }

    /// Replace a film's whole director set.
    ///
    /// An empty `person_ids` clears the set. Otherwise every id is
    /// resolved in one batch and the missing ones are reported together in
    /// a single error before anything is written. Directors present in
    /// both the old and new set are left untouched; removals and additions
    /// commit atomically. Returns the resulting director set in requested
    /// order.
    pub async fn update_directors(
        &self,
        film_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<Vec<PersonRecord>, CatalogError> {
        let mut tx = self.pool.begin().await?;

        if films::get(&mut tx, film_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                kind: EntityKind::Film,
                id: film_id,
            });
        }

        // Dedupe, keeping first-seen order for the returned set.
        let mut requested: Vec<Uuid> = Vec::new();
        let mut seen = HashSet::new();
        for id in person_ids {
            if seen.insert(*id) {
                requested.push(*id);
            }
        }

        if requested.is_empty() {
            let removed = directors::clear_film(&mut tx, film_id).await?;
            films::touch(&mut tx, film_id, Utc::now()).await?;
            tx.commit().await?;
            debug!(%film_id, removed, "cleared directors");
            return Ok(Vec::new());
        }

        let resolved = people::list_by_ids(&mut tx, &requested).await?;
        if resolved.len() < requested.len() {
            let found: HashSet<Uuid> = resolved.iter().map(|p| p.id).collect();
            let missing: Vec<Uuid> = requested
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(CatalogError::NotFoundMany {
                kind: EntityKind::Person,
                ids: missing,
            });
        }

        let current: HashSet<Uuid> = directors::person_ids_for_film(&mut tx, film_id)
            .await?
            .into_iter()
            .collect();
        let desired: HashSet<Uuid> = requested.iter().copied().collect();

        let mut removed = 0u64;
        for person_id in current.difference(&desired) {
            directors::unlink(&mut tx, film_id, *person_id).await?;
            removed += 1;
        }
        let mut added = 0u64;
        for person_id in desired.difference(&current) {
            directors::link(&mut tx, film_id, *person_id).await?;
            added += 1;
        }
        films::touch(&mut tx, film_id, Utc::now()).await?;
        tx.commit().await?;

        debug!(
            %film_id,
            added,
            removed,
            kept = desired.len() as u64 - added,
            "replaced director set"
        );

        let mut by_id: HashMap<Uuid, PersonRecord> =
            resolved.into_iter().map(|p| (p.id, p)).collect();
        Ok(requested.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Remove one director pairing on both sides. Returns whether it
    /// existed; removing an absent pairing is not an error.
    pub async fn delete_director(
        &self,
        film_id: Uuid,
        person_id: Uuid,
    ) -> Result<bool, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let removed = directors::unlink(&mut conn, film_id, person_id).await?;
        debug!(%film_id, %person_id, removed, "deleted director");
        Ok(removed)
    }

    /// Clear every director pairing of a film. Returns the number
    /// removed.
    pub async fn delete_directors(&self, film_id: Uuid) -> Result<u64, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let removed = directors::clear_film(&mut conn, film_id).await?;
        debug!(%film_id, removed, "cleared directors");
        Ok(removed)
    }

    /// Directors of a film, sorted by name.
    pub async fn directors_of(&self, film_id: Uuid) -> Result<Vec<PersonRecord>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(directors::people_for_film(&mut conn, film_id).await?)
    }

    /// Films a person directed, sorted by title.
    pub async fn films_directed_by(
        &self,
        person_id: Uuid,
    ) -> Result<Vec<FilmRecord>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(directors::films_for_person(&mut conn, person_id).await?)
    }
}
