//! Product Repository

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

/// Filters for the public catalog listing.
#[derive(Debug, Default, Clone)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub page: u32,
    pub per_page: u32,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let pure_id = strip_table_prefix(PRODUCT_TABLE, id);
        let product: Option<Product> = self.base.db().select((PRODUCT_TABLE, pure_id)).await?;
        Ok(product)
    }

    pub async fn list(&self, filter: &ProductQuery) -> RepoResult<(Vec<Product>, u64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if !filter.include_inactive {
            conditions.push("is_active = true");
        }
        if filter.category.is_some() {
            conditions.push("category = $category");
        }
        if filter.search.is_some() {
            conditions.push("string::lowercase(name) CONTAINS $search");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let per_page = filter.per_page.max(1);
        let start = filter.page.saturating_sub(1) * per_page;

        let list_query = format!(
            "SELECT * FROM product{} ORDER BY created_at DESC LIMIT $limit START $start",
            where_clause
        );
        let count_query = format!("SELECT count() FROM product{} GROUP ALL", where_clause);

        let mut query = self
            .base
            .db()
            .query(&list_query)
            .query(&count_query)
            .bind(("limit", per_page as i64))
            .bind(("start", start as i64));
        if let Some(category) = &filter.category {
            query = query.bind(("category", make_thing("category", category)));
        }
        if let Some(search) = &filter.search {
            query = query.bind(("search", search.to_lowercase()));
        }

        let mut response = query.await?;
        let products: Vec<Product> = response.take(0)?;

        #[derive(serde::Deserialize)]
        struct CountRow {
            count: u64,
        }
        let count: Option<CountRow> = response.take(1)?;
        let total = count.map(|c| c.count).unwrap_or(0);

        Ok((products, total))
    }

    pub async fn create(&self, data: &ProductCreate) -> RepoResult<Product> {
        let product = Product {
            id: None,
            name: data.name.clone(),
            description: data.description.clone(),
            category: make_thing("category", &data.category),
            images: data.images.clone().unwrap_or_default(),
            gst_rate: data.gst_rate.unwrap_or(0),
            is_active: true,
            created_at: Some(now_millis()),
        };
        let created: Option<Product> =
            self.base.db().create(PRODUCT_TABLE).content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let thing = make_thing(PRODUCT_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.description.is_some() {
            set_parts.push("description = $description");
        }
        if data.category.is_some() {
            set_parts.push("category = $category");
        }
        if data.images.is_some() {
            set_parts.push("images = $images");
        }
        if data.gst_rate.is_some() {
            set_parts.push("gst_rate = $gst_rate");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));
        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.description {
            query = query.bind(("description", v));
        }
        if let Some(v) = data.category {
            query = query.bind(("category", make_thing("category", &v)));
        }
        if let Some(v) = data.images {
            query = query.bind(("images", v));
        }
        if let Some(v) = data.gst_rate {
            query = query.bind(("gst_rate", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let products: Vec<Product> = query.await?.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Soft delete. Catalog listings filter on is_active, and existing
    /// orders keep their item snapshots either way.
    pub async fn deactivate(&self, id: &str) -> RepoResult<()> {
        let thing = make_thing(PRODUCT_TABLE, id);
        let updated: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $thing SET is_active = false RETURN AFTER")
            .bind(("thing", thing))
            .await?
            .take(0)?;
        if updated.is_empty() {
            return Err(RepoError::NotFound(format!("Product {} not found", id)));
        }
        Ok(())
    }
}
