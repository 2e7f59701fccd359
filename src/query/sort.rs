//! Sort-field whitelisting.
//!
//! Client-requested sort keys pass a static per-entity whitelist before
//! they reach ORDER BY, so a request can never sort by a relation, an
//! internal column, or anything else outside the declared set. Disallowed
//! fields are dropped silently rather than rejected; a request that loses
//! every key falls back to the entity's default order.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A client-requested sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Static registry of an entity's sortable surface.
///
/// Declared per record type next to its repository; there is no runtime
/// field scanning.
pub trait SortableEntity {
    /// Column names clients may sort by.
    const SORTABLE_FIELDS: &'static [&'static str];

    /// ORDER BY clause applied when no requested key survives the
    /// whitelist.
    const DEFAULT_SORT: &'static str;
}

/// Drop every requested key whose field is not whitelisted for `E`,
/// preserving the relative order of the survivors.
pub fn allowed_sort<E: SortableEntity>(requested: &[SortKey]) -> Vec<SortKey> {
    requested
        .iter()
        .filter(|key| E::SORTABLE_FIELDS.contains(&key.field.as_str()))
        .cloned()
        .collect()
}

/// Render the ORDER BY clause for the surviving keys, falling back to the
/// entity default when none survive.
pub fn order_by_clause<E: SortableEntity>(requested: &[SortKey]) -> String {
    let keys = allowed_sort::<E>(requested);
    if keys.is_empty() {
        return E::DEFAULT_SORT.to_string();
    }
    keys.iter()
        .map(|key| format!("{} {}", key.field, key.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}
