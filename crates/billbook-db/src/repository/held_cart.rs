//! # Held Cart Repository
//!
//! Parks a cart so the till can serve the next customer, then resumes it
//! later by id. The cart is stored whole as a JSON payload; `customer_id`
//! and `item_count` are copied into columns for the listing.
//!
//! ```text
//! POST /sessions/{id}/hold ──► save(cart) ──► held_carts row
//! POST /sessions/held/{id}/resume ──► load(id) + delete(id) ──► new session
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use billbook_core::ports::{CartStore, HeldCartSummary};
use billbook_core::{Cart, RepoResult};

#[derive(Debug, FromRow)]
struct HeldCartRow {
    id: String,
    customer_id: Option<String>,
    item_count: i64,
    held_at: DateTime<Utc>,
}

impl From<HeldCartRow> for HeldCartSummary {
    fn from(row: HeldCartRow) -> Self {
        HeldCartSummary {
            id: row.id,
            customer_id: row.customer_id,
            item_count: row.item_count,
            held_at: row.held_at,
        }
    }
}

/// Repository for parked carts.
#[derive(Debug, Clone)]
pub struct HeldCartRepository {
    pool: SqlitePool,
}

impl HeldCartRepository {
    /// Creates a new HeldCartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HeldCartRepository { pool }
    }

    /// Inserts the cart, or replaces a held cart with the same id.
    pub async fn save(&self, cart: &Cart) -> DbResult<()> {
        let payload = serde_json::to_string(cart)?;

        debug!(cart_id = %cart.id, items = cart.item_count(), "Holding cart");

        sqlx::query(
            r#"
            INSERT INTO held_carts (id, customer_id, item_count, payload, held_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                customer_id = excluded.customer_id,
                item_count = excluded.item_count,
                payload = excluded.payload,
                held_at = excluded.held_at
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.customer_id)
        .bind(cart.item_count() as i64)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads a held cart by id.
    pub async fn load(&self, id: &str) -> DbResult<Cart> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM held_carts WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let payload = payload.ok_or_else(|| DbError::not_found("Held cart", id))?;
        Ok(serde_json::from_str(&payload)?)
    }

    /// Deletes a held cart. Returns false if there was none.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM held_carts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists held carts, most recently held first.
    pub async fn list_held(&self) -> DbResult<Vec<HeldCartSummary>> {
        let rows: Vec<HeldCartRow> = sqlx::query_as(
            "SELECT id, customer_id, item_count, held_at FROM held_carts ORDER BY held_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HeldCartSummary::from).collect())
    }
}

#[async_trait]
impl CartStore for HeldCartRepository {
    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        Ok(HeldCartRepository::save(self, cart).await?)
    }

    async fn load(&self, id: &str) -> RepoResult<Cart> {
        Ok(HeldCartRepository::load(self, id).await?)
    }

    async fn delete(&self, id: &str) -> RepoResult<bool> {
        Ok(HeldCartRepository::delete(self, id).await?)
    }

    async fn list_held(&self) -> RepoResult<Vec<HeldCartSummary>> {
        Ok(HeldCartRepository::list_held(self).await?)
    }
}
