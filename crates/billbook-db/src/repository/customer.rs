//! # Customer Repository
//!
//! Customer profiles keyed by a normalized 10-digit phone, plus the loyalty
//! balance that checkout draws from.
//!
//! The balance is written on insert and by `InvoiceRepository::finalize`.
//! Profile updates leave it alone.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use billbook_core::ports::CustomerDirectory;
use billbook_core::{Customer, RepoResult};

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, email, state_code, gstin, loyalty_points, created_at, updated_at";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    state_code: Option<String>,
    gstin: Option<String>,
    loyalty_points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            state_code: row.state_code,
            gstin: row.gstin,
            loyalty_points: row.loyalty_points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Customer::from)
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Looks a customer up by phone. The phone must already be normalized.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1");

        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    /// Inserts a new customer, including the opening loyalty balance.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Phone already registered
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, state_code, gstin,
                loyalty_points, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.state_code)
        .bind(&customer.gstin)
        .bind(customer.loyalty_points)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &customer.phone),
            other => other,
        })?;

        Ok(())
    }

    /// Updates profile fields and stamps `updated_at`.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                email = ?4,
                state_code = ?5,
                gstin = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.state_code)
        .bind(&customer.gstin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &customer.phone),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Lists customers, most recently updated first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY updated_at DESC, name LIMIT ?1"
        );

        let rows: Vec<CustomerRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }
}

#[async_trait]
impl CustomerDirectory for CustomerRepository {
    async fn get(&self, id: &str) -> RepoResult<Customer> {
        Ok(CustomerRepository::get(self, id).await?)
    }

    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Customer>> {
        Ok(CustomerRepository::find_by_phone(self, phone).await?)
    }

    async fn insert(&self, customer: &Customer) -> RepoResult<()> {
        Ok(CustomerRepository::insert(self, customer).await?)
    }

    async fn update(&self, customer: &Customer) -> RepoResult<()> {
        Ok(CustomerRepository::update(self, customer).await?)
    }

    async fn list(&self, limit: u32) -> RepoResult<Vec<Customer>> {
        Ok(CustomerRepository::list(self, limit).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use uuid::Uuid;

    pub(crate) fn sample_customer(phone: &str, points: i64) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4().to_string(),
            name: "Asha Rao".to_string(),
            phone: phone.to_string(),
            email: None,
            state_code: Some("29".to_string()),
            gstin: None,
            loyalty_points: points,
            created_at: now,
            updated_at: now,
        }
    }

    async fn repo() -> CustomerRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().customers()
    }

    #[tokio::test]
    async fn test_insert_and_find_by_phone() {
        let repo = repo().await;
        let customer = sample_customer("9876543210", 120);
        repo.insert(&customer).await.unwrap();

        let found = repo.find_by_phone("9876543210").await.unwrap().unwrap();
        assert_eq!(found.id, customer.id);
        assert_eq!(found.loyalty_points, 120);

        assert!(repo.find_by_phone("9000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let repo = repo().await;
        repo.insert(&sample_customer("9876543210", 0)).await.unwrap();

        let err = repo.insert(&sample_customer("9876543210", 0)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "9876543210"));
    }

    #[tokio::test]
    async fn test_update_leaves_points_alone() {
        let repo = repo().await;
        let mut customer = sample_customer("9876543210", 50);
        repo.insert(&customer).await.unwrap();

        customer.name = "Asha R.".to_string();
        customer.state_code = Some("27".to_string());
        customer.loyalty_points = 9_999;
        repo.update(&customer).await.unwrap();

        let loaded = repo.get(&customer.id).await.unwrap();
        assert_eq!(loaded.name, "Asha R.");
        assert_eq!(loaded.state_code.as_deref(), Some("27"));
        assert_eq!(loaded.loyalty_points, 50);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo().await;
        assert!(matches!(
            repo.update(&sample_customer("9876543210", 0)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let repo = repo().await;
        for phone in ["9876543210", "9876543211", "9876543212"] {
            repo.insert(&sample_customer(phone, 0)).await.unwrap();
        }

        assert_eq!(repo.list(2).await.unwrap().len(), 2);
        assert_eq!(repo.list(10).await.unwrap().len(), 3);
    }
}
