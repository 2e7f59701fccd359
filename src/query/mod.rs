//! Safe dynamic querying: search predicates, sort whitelisting, and
//! pagination.
//!
//! Nothing in this module interpolates client input into SQL text. Column
//! names come from crate-internal constants, sort fields pass a static
//! whitelist, and every client-supplied value travels as a bind parameter.

pub mod page;
pub mod predicate;
pub mod sort;

pub use page::{Page, SearchPage};
pub use predicate::Predicate;
pub use sort::{SortDirection, SortKey, SortableEntity, allowed_sort, order_by_clause};
