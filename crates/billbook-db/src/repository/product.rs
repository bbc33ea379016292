//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Full-text search using FTS5
//! - CRUD operations
//! - Soft delete (deactivate)
//!
//! ## FTS5 Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How FTS5 Search Works                                │
//! │                                                                         │
//! │  User types: "hair col"                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Each word becomes a quoted prefix: "hair"* "col"*                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ products_fts (sku, name, category)      │                           │
//! │  │                                         │                           │
//! │  │ HAIR-010 | Hair Colour Global | Salon   │ ← MATCH!                  │
//! │  │ HAIR-011 | Hair Colour Roots  | Salon   │ ← MATCH!                  │
//! │  │ HAIR-001 | Haircut            | Salon   │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Active rows only, ordered by rank                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use billbook_core::ports::ProductCatalog;
use billbook_core::{Product, RepoResult};

const PRODUCT_COLUMNS: &str = "p.id, p.sku, p.name, p.category, p.hsn_code, p.price_paise, \
     p.tax_rate_bps, p.is_active, p.created_at, p.updated_at";

/// Row shape of the `products` table.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    category: Option<String>,
    hsn_code: Option<String>,
    price_paise: i64,
    tax_rate_bps: u32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category: row.category,
            hsn_code: row.hsn_code,
            price_paise: row.price_paise,
            tax_rate_bps: row.tax_rate_bps,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Turns free text into an FTS5 expression of quoted prefix terms.
///
/// Quoting keeps `-`, `:` and `*` typed by the cashier from being read as
/// FTS5 operators.
fn fts_expression(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let results = repo.search("facial", 20).await?;
/// let product = repo.get("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products using full-text search.
    ///
    /// ## Arguments
    /// * `query` - Search words, each matched as a prefix of sku, name or category
    /// * `limit` - Maximum results to return
    ///
    /// ## Example
    /// ```rust,ignore
    /// let products = repo.search("hair", 20).await?;
    ///
    /// // Empty query lists active products by name
    /// let products = repo.search("", 20).await?;
    /// ```
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products p
             INNER JOIN products_fts ON p.rowid = products_fts.rowid
             WHERE products_fts MATCH ?1
             AND p.is_active = 1
             ORDER BY products_fts.rank
             LIMIT ?2"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(fts_expression(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists active products (no search filter), sorted by name.
    async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products p
             WHERE p.is_active = 1
             ORDER BY p.name
             LIMIT ?1"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID, active or not.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No product with this id
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");

        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::from)
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by its SKU (e.g., "HAIR-001").
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.sku = ?1");

        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, hsn_code,
                price_paise, tax_rate_bps, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.hsn_code)
        .bind(product.price_paise)
        .bind(product.tax_rate_bps)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        Ok(())
    }

    /// Updates an existing product and stamps `updated_at`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                category = ?4,
                hsn_code = ?5,
                price_paise = ?6,
                tax_rate_bps = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.hsn_code)
        .bind(product.price_paise)
        .bind(product.tax_rate_bps)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// - Old invoices still name this product
    /// - Can be restored if deactivated by mistake
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl ProductCatalog for ProductRepository {
    async fn get(&self, id: &str) -> RepoResult<Product> {
        Ok(ProductRepository::get(self, id).await?)
    }

    async fn search(&self, query: &str, limit: u32) -> RepoResult<Vec<Product>> {
        Ok(ProductRepository::search(self, query, limit).await?)
    }

    async fn insert(&self, product: &Product) -> RepoResult<()> {
        Ok(ProductRepository::insert(self, product).await?)
    }

    async fn update(&self, product: &Product) -> RepoResult<()> {
        Ok(ProductRepository::update(self, product).await?)
    }

    async fn deactivate(&self, id: &str) -> RepoResult<()> {
        Ok(ProductRepository::deactivate(self, id).await?)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
