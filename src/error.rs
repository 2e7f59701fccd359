//! Error taxonomy for the catalog core.
//!
//! Every failure a service can produce carries enough structure (entity
//! kind, offending id or ids, composite key) for a transport layer to
//! render a precise message. HTTP/GraphQL status mapping is the caller's
//! concern; nothing here is swallowed or retried internally.

use std::fmt;

use uuid::Uuid;

use crate::db::RoleKey;

/// The kinds of catalog entity an error can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Film,
    Person,
    Role,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Film => "film",
            EntityKind::Person => "person",
            EntityKind::Role => "role",
        })
    }
}

/// Errors produced by the catalog services.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    /// A batch lookup resolved fewer entities than requested; `ids` holds
    /// every id that failed to resolve, not just the first.
    #[error("{kind} not found: {}", join_ids(.ids))]
    NotFoundMany { kind: EntityKind, ids: Vec<Uuid> },

    /// No role exists for the (film, person) pair.
    #[error("role not found for {key}")]
    RoleNotFound { key: RoleKey },

    /// A role already exists for the (film, person) pair.
    #[error("role already exists for {key}")]
    RoleConflict { key: RoleKey },

    /// Input rejected before touching the store.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Underlying store failure.
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Database(err.into())
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_many_lists_every_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let err = CatalogError::NotFoundMany {
            kind: EntityKind::Person,
            ids: vec![a, b],
        };
        let message = err.to_string();
        assert!(message.contains(&a.to_string()));
        assert!(message.contains(&b.to_string()));
        assert!(message.starts_with("person not found"));
    }

    #[test]
    fn test_conflict_names_the_pair() {
        let key = RoleKey::new(Uuid::new_v4(), Uuid::new_v4());
        let err = CatalogError::RoleConflict { key };
        assert!(err.to_string().contains(&key.film_id.to_string()));
        assert!(err.to_string().contains(&key.person_id.to_string()));
    }
}
