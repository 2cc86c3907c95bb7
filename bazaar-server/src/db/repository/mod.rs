//! Repository Module
//!
//! CRUD and domain-specific queries per SurrealDB table. Handlers and
//! services go through these; raw queries never appear in handlers.

pub mod cart;
pub mod category;
pub mod coupon;
pub mod order;
pub mod product;
pub mod promotion;
pub mod variant;

pub use cart::CartRepository;
pub use category::CategoryRepository;
pub use coupon::CouponRepository;
pub use order::{OrderQuery, OrderRepository, StatusCount};
pub use product::{ProductQuery, ProductRepository};
pub use promotion::PromotionRepository;
pub use variant::VariantRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Thing;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Strip a "table:" prefix from an id if present
pub fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(id)
}

/// Build a Thing from table + id, tolerating an already-prefixed id
pub fn make_thing(table: &str, id: &str) -> Thing {
    Thing::from((table.to_string(), strip_table_prefix(table, id).to_string()))
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_prefix_handles_both_forms() {
        assert_eq!(strip_table_prefix("product", "product:abc"), "abc");
        assert_eq!(strip_table_prefix("product", "abc"), "abc");
    }

    #[test]
    fn make_thing_is_idempotent_on_prefix() {
        let a = make_thing("product", "abc");
        let b = make_thing("product", "product:abc");
        assert_eq!(a, b);
    }
}
