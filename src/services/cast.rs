//! Cast reconciliation and role management.
//!
//! The reconciler diffs a film's stored roles against a desired cast list
//! and applies the minimal mutations: stale roles are deleted, existing
//! ones get their character updated in place, new ones are inserted. The
//! whole pass commits in one transaction, so a half-applied cast can
//! never be observed.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::db::{self, RoleKey, RoleRecord, films, people, roles};
use crate::error::{CatalogError, EntityKind};

/// One desired cast entry: a person playing a character.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub person_id: Uuid,
    pub character: String,
}

impl CastMember {
    pub fn new(person_id: Uuid, character: impl Into<String>) -> Self {
        Self {
            person_id,
            character: character.into(),
        }
    }
}

pub struct CastService {
    pool: SqlitePool,
}

impl CastService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reconcile a film's cast against `desired`.
    ///
    /// Characters are validated and every person id batch-resolved before
    /// anything is written; missing ids are reported together. Deletions
    /// run before upserts so a later insert can never trip the composite
    /// primary key mid-reconciliation. A person listed more than once
    /// keeps the character of the last occurrence. An empty `desired`
    /// clears the cast. Returns the film's resulting role set.
    pub async fn update_cast(
        &self,
        film_id: Uuid,
        desired: &[CastMember],
    ) -> Result<Vec<RoleRecord>, CatalogError> {
        for member in desired {
            validate_character(&member.character)?;
        }
        let (order, wanted) = dedupe_last_wins(desired);

        let mut tx = self.pool.begin().await?;

        if films::get(&mut tx, film_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                kind: EntityKind::Film,
                id: film_id,
            });
        }

        if order.is_empty() {
            let removed = roles::delete_for_film(&mut tx, film_id).await?;
            tx.commit().await?;
            debug!(%film_id, removed, "cleared cast");
            return Ok(Vec::new());
        }

        let resolved = people::list_by_ids(&mut tx, &order).await?;
        if resolved.len() < order.len() {
            let found: HashSet<Uuid> = resolved.iter().map(|p| p.id).collect();
            let missing: Vec<Uuid> = order
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(CatalogError::NotFoundMany {
                kind: EntityKind::Person,
                ids: missing,
            });
        }

        let current = roles::list_for_film(&mut tx, film_id).await?;
        let current_keys: HashSet<Uuid> = current.iter().map(|r| r.person_id).collect();

        let mut removed = 0u64;
        for role in &current {
            if !wanted.contains_key(&role.person_id) {
                roles::delete(&mut tx, role.key()).await?;
                removed += 1;
            }
        }

        let now = Utc::now();
        let mut updated = 0u64;
        let mut created = 0u64;
        for person_id in &order {
            let character = &wanted[person_id];
            if current_keys.contains(person_id) {
                roles::update_character(&mut tx, RoleKey::new(film_id, *person_id), character, now)
                    .await?;
                updated += 1;
            } else {
                let role = RoleRecord {
                    film_id,
                    person_id: *person_id,
                    character: character.clone(),
                    created_at: now,
                    updated_at: now,
                };
                roles::insert(&mut tx, &role).await?;
                created += 1;
            }
        }

        let result = roles::list_for_film(&mut tx, film_id).await?;
        tx.commit().await?;

        debug!(%film_id, removed, updated, created, "reconciled cast");
        Ok(result)
    }

    /// Create a role. Fails Conflict when the (film, person) pair already
    /// has one; the composite primary key backs this up under concurrent
    /// creates.
    pub async fn create_role(
        &self,
        film_id: Uuid,
        person_id: Uuid,
        character: &str,
    ) -> Result<RoleRecord, CatalogError> {
        validate_character(character)?;
        let key = RoleKey::new(film_id, person_id);

        let mut conn = self.pool.acquire().await?;

        if films::get(&mut conn, film_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                kind: EntityKind::Film,
                id: film_id,
            });
        }
        if people::get(&mut conn, person_id).await?.is_none() {
            return Err(CatalogError::NotFound {
                kind: EntityKind::Person,
                id: person_id,
            });
        }
        if roles::get(&mut conn, key).await?.is_some() {
            return Err(CatalogError::RoleConflict { key });
        }

        let now = Utc::now();
        let role = RoleRecord {
            film_id,
            person_id,
            character: character.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        match roles::insert(&mut conn, &role).await {
            Ok(()) => {
                debug!(%key, "created role");
                Ok(role)
            }
            Err(err) if db::is_unique_violation(&err) => Err(CatalogError::RoleConflict { key }),
            Err(err) => Err(err.into()),
        }
    }

    /// Get a role by its composite key.
    pub async fn get_role(
        &self,
        film_id: Uuid,
        person_id: Uuid,
    ) -> Result<RoleRecord, CatalogError> {
        let key = RoleKey::new(film_id, person_id);
        let mut conn = self.pool.acquire().await?;
        roles::get(&mut conn, key)
            .await?
            .ok_or(CatalogError::RoleNotFound { key })
    }

    /// Update the character of an existing role in place.
    pub async fn update_role(
        &self,
        film_id: Uuid,
        person_id: Uuid,
        character: &str,
    ) -> Result<RoleRecord, CatalogError> {
        validate_character(character)?;
        let key = RoleKey::new(film_id, person_id);
        let mut conn = self.pool.acquire().await?;

        let changed = roles::update_character(&mut conn, key, character.trim(), Utc::now()).await?;
        if !changed {
            return Err(CatalogError::RoleNotFound { key });
        }
        roles::get(&mut conn, key)
            .await?
            .ok_or(CatalogError::RoleNotFound { key })
    }

    /// Delete a role. Returns whether one existed; deleting an absent
    /// role is not an error.
    pub async fn delete_role(
        &self,
        film_id: Uuid,
        person_id: Uuid,
    ) -> Result<bool, CatalogError> {
        let key = RoleKey::new(film_id, person_id);
        let mut conn = self.pool.acquire().await?;
        let removed = roles::delete(&mut conn, key).await?;
        debug!(%key, removed, "deleted role");
        Ok(removed)
    }

    /// Delete every role of a film, independent of reconciliation.
    /// Returns the number removed.
    pub async fn delete_cast(&self, film_id: Uuid) -> Result<u64, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let removed = roles::delete_for_film(&mut conn, film_id).await?;
        debug!(%film_id, removed, "deleted cast");
        Ok(removed)
    }

    /// Current cast of a film.
    pub async fn cast_of(&self, film_id: Uuid) -> Result<Vec<RoleRecord>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(roles::list_for_film(&mut conn, film_id).await?)
    }

    /// Every role a person has, across films.
    pub async fn roles_of_person(&self, person_id: Uuid) -> Result<Vec<RoleRecord>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(roles::list_for_person(&mut conn, person_id).await?)
    }
}

/// Collapse duplicate person ids: the last occurrence's character wins,
/// first-seen position fixes the upsert order.
fn dedupe_last_wins(desired: &[CastMember]) -> (Vec<Uuid>, HashMap<Uuid, String>) {
    let mut order: Vec<Uuid> = Vec::new();
    let mut wanted: HashMap<Uuid, String> = HashMap::new();
    for member in desired {
        if !wanted.contains_key(&member.person_id) {
            order.push(member.person_id);
        }
        wanted.insert(member.person_id, member.character.trim().to_string());
    }
    (order, wanted)
}

fn validate_character(character: &str) -> Result<(), CatalogError> {
    if character.trim().is_empty() {
        return Err(CatalogError::Validation {
            field: "character",
            reason: "must not be blank".to_string(),
        });
    }
    Ok(())
}
