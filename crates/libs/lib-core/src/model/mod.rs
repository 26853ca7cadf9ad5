//! Database model layer: pool, entities, and repositories.

pub mod store;
