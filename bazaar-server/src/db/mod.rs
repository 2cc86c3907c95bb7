//! Database Module
//!
//! Embedded SurrealDB (RocksDB backend). Schema is bootstrapped with
//! `DEFINE` statements on startup; the unique indexes below are load-bearing
//! (SKU and coupon-code uniqueness, one cart per owner).

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "bazaar";
const DATABASE: &str = "main";

/// Open the embedded database under `work_dir/data` and apply schema
pub async fn connect(work_dir: &str) -> Result<Surreal<Db>, AppError> {
    let path = Path::new(work_dir).join("data");
    let db = Surreal::new::<RocksDb>(path)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

    define_schema(&db).await?;
    tracing::info!("Database ready (embedded SurrealDB, RocksDB backend)");

    Ok(db)
}

/// Apply `DEFINE` statements (idempotent)
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        "
        DEFINE INDEX IF NOT EXISTS variant_sku_unique ON TABLE variant COLUMNS sku UNIQUE;
        DEFINE INDEX IF NOT EXISTS coupon_code_unique ON TABLE coupon COLUMNS code UNIQUE;
        DEFINE INDEX IF NOT EXISTS cart_owner_unique ON TABLE cart COLUMNS owner_key UNIQUE;
        DEFINE INDEX IF NOT EXISTS order_number_unique ON TABLE shop_order COLUMNS order_number UNIQUE;
        ",
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::models::{CategoryCreate, Variant};
    use crate::db::repository::{CategoryRepository, make_thing};

    // Opens the real RocksDB backend against a throwaway directory so
    // the startup path (directory layout, schema bootstrap, unique
    // indexes) is covered, not just the in-memory engine.
    #[tokio::test]
    async fn connect_bootstraps_rocksdb_under_work_dir() {
        let work_dir = tempfile::tempdir().expect("tempdir");
        let db = super::connect(work_dir.path().to_str().expect("utf-8 path"))
            .await
            .expect("connect");
        assert!(work_dir.path().join("data").exists());

        let category = CategoryRepository::new(db.clone())
            .create(CategoryCreate {
                name: "Clothing".to_string(),
                sort_order: None,
            })
            .await
            .expect("category");
        assert!(category.id.is_some());

        // Unique SKU index from define_schema is live.
        let variant = Variant {
            id: None,
            product: make_thing("product", "p1"),
            sku: "SKU-1".to_string(),
            selling_price: 100.0,
            mrp: 120.0,
            stock: 1,
            attributes: Default::default(),
            is_active: true,
        };
        let created: Option<Variant> = db
            .create("variant")
            .content(variant.clone())
            .await
            .expect("first insert");
        assert!(created.is_some());
        let duplicate: Result<Option<Variant>, _> = db.create("variant").content(variant).await;
        assert!(duplicate.is_err());
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory database for unit tests

    use surrealdb::Surreal;
    use surrealdb::engine::local::{Db, Mem};

    /// Fresh in-memory database with schema applied
    pub async fn memory_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.expect("in-memory db");
        db.use_ns(super::NAMESPACE)
            .use_db(super::DATABASE)
            .await
            .expect("select ns/db");
        super::define_schema(&db).await.expect("schema");
        db
    }
}
