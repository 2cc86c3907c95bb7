//! Category Repository

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const CATEGORY_TABLE: &str = "category";

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category WHERE is_active = true ORDER BY sort_order")
            .await?
            .take(0)?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        let pure_id = strip_table_prefix(CATEGORY_TABLE, id);
        let category: Option<Category> = self.base.db().select((CATEGORY_TABLE, pure_id)).await?;
        Ok(category)
    }

    pub async fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        let category = Category {
            id: None,
            name: data.name,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: true,
        };
        let created: Option<Category> =
            self.base.db().create(CATEGORY_TABLE).content(category).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create category".to_string()))
    }

    pub async fn update(&self, id: &str, data: CategoryUpdate) -> RepoResult<Category> {
        let thing = make_thing(CATEGORY_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.sort_order.is_some() {
            set_parts.push("sort_order = $sort_order");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));
        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.sort_order {
            query = query.bind(("sort_order", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let categories: Vec<Category> = query.await?.take(0)?;
        categories
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let pure_id = strip_table_prefix(CATEGORY_TABLE, id);
        let result: Option<Category> = self.base.db().delete((CATEGORY_TABLE, pure_id)).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}
