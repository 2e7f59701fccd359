//! Free-text and range predicates for catalog search.
//!
//! A [`Predicate`] is a SQL condition fragment plus the values to bind for
//! its placeholders. Builders return `Option<Predicate>`: `None` means "no
//! condition" (the leg matches everything), so an absent filter simply
//! contributes nothing when legs are folded with [`Predicate::all`] or
//! [`Predicate::any`]. A filter that is present but matches nothing is
//! expressed as a real condition, never as an always-false fragment.
//!
//! Column names are always crate-supplied constants; only bind values
//! originate from callers.

use chrono::NaiveDate;

/// A composable SQL condition: a WHERE-clause fragment with `?`
/// placeholders and the values to bind for them, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    sql: String,
    binds: Vec<String>,
}

impl Predicate {
    /// The SQL fragment, safe to splice after `WHERE`.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values to bind, in placeholder order. Every catalog predicate
    /// operand is TEXT: search tokens and ISO-8601 dates.
    pub fn binds(&self) -> &[String] {
        &self.binds
    }

    /// AND-fold, discarding absent legs. `None` when every leg is absent,
    /// i.e. the query matches everything.
    pub fn all(legs: Vec<Option<Predicate>>) -> Option<Predicate> {
        Self::fold(legs, " AND ")
    }

    /// OR-fold, discarding absent legs.
    pub fn any(legs: Vec<Option<Predicate>>) -> Option<Predicate> {
        Self::fold(legs, " OR ")
    }

    fn fold(legs: Vec<Option<Predicate>>, joiner: &str) -> Option<Predicate> {
        let mut present: Vec<Predicate> = legs.into_iter().flatten().collect();
        match present.len() {
            0 => None,
            1 => Some(present.remove(0)),
            _ => {
                let sql = format!(
                    "({})",
                    present
                        .iter()
                        .map(|p| p.sql.as_str())
                        .collect::<Vec<_>>()
                        .join(joiner)
                );
                let binds = present.into_iter().flat_map(|p| p.binds).collect();
                Some(Predicate { sql, binds })
            }
        }
    }
}

/// Case-insensitive substring match of any whitespace-separated token of
/// `input` against `column`. Any single token matching is sufficient; the
/// search is deliberately permissive rather than an all-tokens match.
/// Blank or absent input produces no condition.
pub fn text_contains_any(column: &str, input: Option<&str>) -> Option<Predicate> {
    let input = input?.trim();
    if input.is_empty() {
        return None;
    }

    let legs = input
        .split_whitespace()
        .map(|token| {
            Some(Predicate {
                sql: format!("LOWER({column}) LIKE ? ESCAPE '\\'"),
                binds: vec![format!("%{}%", escape_like(&token.to_lowercase()))],
            })
        })
        .collect();
    Predicate::any(legs)
}

/// Strict `column < bound`. Dates are stored as ISO-8601 TEXT, which
/// compares lexicographically the same as chronologically. Rows with a
/// NULL date never match a range leg.
pub fn date_before(column: &str, bound: Option<NaiveDate>) -> Option<Predicate> {
    bound.map(|b| Predicate {
        sql: format!("{column} < ?"),
        binds: vec![b.to_string()],
    })
}

/// Strict `column > bound`; see [`date_before`].
pub fn date_after(column: &str, bound: Option<NaiveDate>) -> Option<Predicate> {
    bound.map(|b| Predicate {
        sql: format!("{column} > ?"),
        binds: vec![b.to_string()],
    })
}

/// Escape LIKE wildcards so tokens match literally.
fn escape_like(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for ch in token.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
