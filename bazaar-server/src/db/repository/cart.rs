//! Cart Repository
//!
//! One cart per owner_key (either a user id or a guest session id),
//! enforced by a unique index. The whole cart document is replaced on
//! mutation; carts are small.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Cart;
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const CART_TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_owner(&self, owner_key: &str) -> RepoResult<Option<Cart>> {
        let carts: Vec<Cart> = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE owner_key = $owner_key")
            .bind(("owner_key", owner_key.to_string()))
            .await?
            .take(0)?;
        Ok(carts.into_iter().next())
    }

    pub async fn upsert(&self, mut cart: Cart) -> RepoResult<Cart> {
        cart.updated_at = now_millis();
        let saved: Option<Cart> = match cart.id.clone() {
            Some(id) => {
                self.base
                    .db()
                    .update((CART_TABLE, id.id.to_string()))
                    .content(cart)
                    .await?
            }
            None => self.base.db().create(CART_TABLE).content(cart).await?,
        };
        saved.ok_or_else(|| RepoError::Database("Failed to save cart".to_string()))
    }

    pub async fn delete_by_owner(&self, owner_key: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE cart WHERE owner_key = $owner_key")
            .bind(("owner_key", owner_key.to_string()))
            .await?;
        Ok(())
    }
}
