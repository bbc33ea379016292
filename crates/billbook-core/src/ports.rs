//! # Repository Ports
//!
//! Storage interfaces the billing service depends on. Implementations live
//! in `billbook-db`; this crate only names the operations.
//!
//! ```text
//! ┌──────────────────────┐          ┌──────────────────────────────────┐
//! │  billbook-api        │  Arc<dyn │  billbook-db                     │
//! │  handlers ───────────┼─────────►│  ProductRepository               │
//! │                      │  Port>   │  CustomerRepository              │
//! │                      │          │  HeldCartRepository              │
//! │                      │          │  InvoiceRepository               │
//! └──────────────────────┘          └──────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::RepoResult;
use crate::invoice::{Invoice, InvoiceDraft, InvoiceSummary, TaxSummary};
use crate::types::{Customer, Product};

/// Catalog of billable products and services.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Gets an active or inactive product by id.
    async fn get(&self, id: &str) -> RepoResult<Product>;

    /// Active products whose name or SKU matches `query`. Empty query lists all.
    async fn search(&self, query: &str, limit: u32) -> RepoResult<Vec<Product>>;

    async fn insert(&self, product: &Product) -> RepoResult<()>;

    async fn update(&self, product: &Product) -> RepoResult<()>;

    /// Soft delete: the product stays readable for old invoices.
    async fn deactivate(&self, id: &str) -> RepoResult<()>;
}

/// Customer profiles and loyalty balances.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get(&self, id: &str) -> RepoResult<Customer>;

    /// Looks up by normalized 10-digit phone.
    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Customer>>;

    async fn insert(&self, customer: &Customer) -> RepoResult<()>;

    /// Updates profile fields. The loyalty balance is not written here.
    async fn update(&self, customer: &Customer) -> RepoResult<()>;

    /// Most recently updated first.
    async fn list(&self, limit: u32) -> RepoResult<Vec<Customer>>;
}

/// Listing entry for a parked cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HeldCartSummary {
    pub id: String,
    pub customer_id: Option<String>,
    pub item_count: i64,
    #[ts(as = "String")]
    pub held_at: DateTime<Utc>,
}

/// Parked carts, resumed later by id.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Inserts or replaces the cart with the same id.
    async fn save(&self, cart: &Cart) -> RepoResult<()>;

    async fn load(&self, id: &str) -> RepoResult<Cart>;

    /// Returns whether a cart was deleted.
    async fn delete(&self, id: &str) -> RepoResult<bool>;

    /// Most recently held first.
    async fn list_held(&self) -> RepoResult<Vec<HeldCartSummary>>;
}

/// Finalized invoices.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Appends the invoice and its rows and deducts redeemed points from the
    /// customer, all in one transaction.
    ///
    /// Fails with `Conflict` if the customer no longer has enough points.
    async fn finalize(&self, draft: &InvoiceDraft) -> RepoResult<Invoice>;

    async fn get(&self, id: &str) -> RepoResult<Invoice>;

    /// Newest first.
    async fn recent(&self, limit: u32) -> RepoResult<Vec<InvoiceSummary>>;

    /// GST collected per slab between two dates, both inclusive.
    async fn tax_summary(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<TaxSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryCarts {
        carts: Mutex<HashMap<String, Cart>>,
    }

    #[async_trait]
    impl CartStore for MemoryCarts {
        async fn save(&self, cart: &Cart) -> RepoResult<()> {
            let mut carts = self.carts.lock().map_err(|e| RepoError::Storage(e.to_string()))?;
            carts.insert(cart.id.clone(), cart.clone());
            Ok(())
        }

        async fn load(&self, id: &str) -> RepoResult<Cart> {
            let carts = self.carts.lock().map_err(|e| RepoError::Storage(e.to_string()))?;
            carts
                .get(id)
                .cloned()
                .ok_or_else(|| RepoError::not_found("Held cart", id))
        }

        async fn delete(&self, id: &str) -> RepoResult<bool> {
            let mut carts = self.carts.lock().map_err(|e| RepoError::Storage(e.to_string()))?;
            Ok(carts.remove(id).is_some())
        }

        async fn list_held(&self) -> RepoResult<Vec<HeldCartSummary>> {
            let carts = self.carts.lock().map_err(|e| RepoError::Storage(e.to_string()))?;
            Ok(carts
                .values()
                .map(|c| HeldCartSummary {
                    id: c.id.clone(),
                    customer_id: c.customer_id.clone(),
                    item_count: c.item_count() as i64,
                    held_at: c.created_at,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_cart_store_is_object_safe() {
        let store: Arc<dyn CartStore> = Arc::new(MemoryCarts::default());
        let cart = Cart::new();

        store.save(&cart).await.unwrap();
        assert_eq!(store.load(&cart.id).await.unwrap(), cart);
        assert_eq!(store.list_held().await.unwrap().len(), 1);

        assert!(store.delete(&cart.id).await.unwrap());
        assert!(matches!(
            store.load(&cart.id).await,
            Err(RepoError::NotFound { .. })
        ));
    }
}
