//! Catalog services: the only write paths for film↔person associations.

pub mod cast;
pub mod directors;

pub use cast::{CastMember, CastService};
pub use directors::DirectorService;
