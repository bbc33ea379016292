//! # Invoice Repository
//!
//! Finalized invoices and the GST report built from them.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    finalize(draft): one transaction                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT invoices        (header + rounded totals)                    │
//! │    INSERT invoice_lines   (one per cart row)                           │
//! │    UPDATE customers       SET loyalty_points = loyalty_points - n      │
//! │                           WHERE id = ? AND loyalty_points >= n          │
//! │         │                                                               │
//! │         ├── 1 row  ──► COMMIT                                          │
//! │         └── 0 rows ──► ROLLBACK, InsufficientPoints / NotFound         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded UPDATE re-checks the balance inside the transaction, so two
//! tills redeeming against the same customer cannot both spend the same
//! points.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use billbook_core::invoice::{
    Invoice, InvoiceDraft, InvoiceLine, InvoiceSummary, TaxSlabSummary, TaxSummary,
};
use billbook_core::ports::InvoiceStore;
use billbook_core::{DiscountRate, DisplayTotals, Money, RepoResult, TaxJurisdiction, TaxRate};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    receipt_number: String,
    customer_id: Option<String>,
    cashier_id: String,
    jurisdiction: String,
    sub_total_paise: i64,
    cgst_paise: i64,
    sgst_paise: i64,
    igst_paise: i64,
    total_tax_paise: i64,
    grand_total_paise: i64,
    loyalty_points_redeemed: i64,
    payable_paise: i64,
    created_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, lines: Vec<InvoiceLine>) -> DbResult<Invoice> {
        let jurisdiction = TaxJurisdiction::parse(&self.jurisdiction)
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        Ok(Invoice {
            id: self.id,
            receipt_number: self.receipt_number,
            customer_id: self.customer_id,
            cashier_id: self.cashier_id,
            jurisdiction,
            lines,
            totals: DisplayTotals {
                sub_total: Money::from_paise(self.sub_total_paise),
                cgst: Money::from_paise(self.cgst_paise),
                sgst: Money::from_paise(self.sgst_paise),
                igst: Money::from_paise(self.igst_paise),
                total_tax: Money::from_paise(self.total_tax_paise),
                grand_total: Money::from_paise(self.grand_total_paise),
                loyalty_points_redeemed: self.loyalty_points_redeemed,
                payable_after_redemption: Money::from_paise(self.payable_paise),
            },
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InvoiceLineRow {
    line_no: i64,
    product_id: String,
    name: String,
    quantity: i64,
    unit_rate_paise: i64,
    discount_bps: u32,
    tax_rate_bps: u32,
    line_amount_paise: i64,
    cgst_paise: i64,
    sgst_paise: i64,
    igst_paise: i64,
}

impl TryFrom<InvoiceLineRow> for InvoiceLine {
    type Error = DbError;

    fn try_from(row: InvoiceLineRow) -> Result<Self, Self::Error> {
        let discount = DiscountRate::from_bps(row.discount_bps)
            .map_err(|e| DbError::Serialization(e.to_string()))?;

        Ok(InvoiceLine {
            line_no: row.line_no,
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            unit_rate: Money::from_paise(row.unit_rate_paise),
            discount,
            tax_rate: TaxRate::from_bps(row.tax_rate_bps),
            line_amount: Money::from_paise(row.line_amount_paise),
            cgst: Money::from_paise(row.cgst_paise),
            sgst: Money::from_paise(row.sgst_paise),
            igst: Money::from_paise(row.igst_paise),
        })
    }
}

#[derive(Debug, FromRow)]
struct InvoiceSummaryRow {
    id: String,
    receipt_number: String,
    customer_id: Option<String>,
    grand_total_paise: i64,
    payable_paise: i64,
    created_at: DateTime<Utc>,
}

impl From<InvoiceSummaryRow> for InvoiceSummary {
    fn from(row: InvoiceSummaryRow) -> Self {
        InvoiceSummary {
            id: row.id,
            receipt_number: row.receipt_number,
            customer_id: row.customer_id,
            grand_total: Money::from_paise(row.grand_total_paise),
            payable_after_redemption: Money::from_paise(row.payable_paise),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SlabRow {
    tax_rate_bps: u32,
    taxable_paise: i64,
    cgst_paise: i64,
    sgst_paise: i64,
    igst_paise: i64,
}

impl From<SlabRow> for TaxSlabSummary {
    fn from(row: SlabRow) -> Self {
        TaxSlabSummary {
            tax_rate: TaxRate::from_bps(row.tax_rate_bps),
            taxable_value: Money::from_paise(row.taxable_paise),
            cgst: Money::from_paise(row.cgst_paise),
            sgst: Money::from_paise(row.sgst_paise),
            igst: Money::from_paise(row.igst_paise),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Persists an invoice draft and deducts redeemed points atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::InsufficientPoints)` - Balance dropped below the redemption
    /// * `Err(DbError::NotFound)` - Redeeming customer does not exist
    /// * `Err(DbError::ForeignKeyViolation)` - Invoice names an unknown customer
    pub async fn finalize(&self, draft: &InvoiceDraft) -> DbResult<Invoice> {
        debug!(
            invoice_id = %draft.id,
            receipt = %draft.receipt_number,
            lines = draft.lines.len(),
            "Finalizing invoice"
        );

        let mut tx = self.pool.begin().await?;

        Self::insert_header(&mut tx, draft).await?;
        for line in &draft.lines {
            Self::insert_line(&mut tx, &draft.id, line).await?;
        }

        let redeemed = draft.loyalty_points_redeemed();
        if redeemed > 0 {
            // Walk-in carts have no balance, so a redemption always names a customer
            let customer_id = draft
                .customer_id
                .as_deref()
                .ok_or_else(|| DbError::not_found("Customer", "none"))?;
            Self::deduct_points(&mut tx, customer_id, redeemed).await?;
        }

        tx.commit().await?;

        info!(
            invoice_id = %draft.id,
            receipt = %draft.receipt_number,
            grand_total = %draft.totals.grand_total,
            points_redeemed = redeemed,
            "Invoice finalized"
        );

        Ok(Invoice::from(draft.clone()))
    }

    async fn insert_header(tx: &mut Transaction<'_, Sqlite>, draft: &InvoiceDraft) -> DbResult<()> {
        let totals = &draft.totals;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, receipt_number, customer_id, cashier_id, jurisdiction,
                sub_total_paise, cgst_paise, sgst_paise, igst_paise,
                total_tax_paise, grand_total_paise,
                loyalty_points_redeemed, payable_paise,
                invoice_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&draft.id)
        .bind(&draft.receipt_number)
        .bind(&draft.customer_id)
        .bind(&draft.cashier_id)
        .bind(draft.jurisdiction.as_str())
        .bind(totals.sub_total.paise())
        .bind(totals.cgst.paise())
        .bind(totals.sgst.paise())
        .bind(totals.igst.paise())
        .bind(totals.total_tax.paise())
        .bind(totals.grand_total.paise())
        .bind(totals.loyalty_points_redeemed)
        .bind(totals.payable_after_redemption.paise())
        .bind(draft.created_at.date_naive())
        .bind(draft.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn insert_line(
        tx: &mut Transaction<'_, Sqlite>,
        invoice_id: &str,
        line: &InvoiceLine,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines (
                invoice_id, line_no, product_id, name, quantity,
                unit_rate_paise, discount_bps, tax_rate_bps,
                line_amount_paise, cgst_paise, sgst_paise, igst_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(invoice_id)
        .bind(line.line_no)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_rate.paise())
        .bind(line.discount.bps())
        .bind(line.tax_rate.bps())
        .bind(line.line_amount.paise())
        .bind(line.cgst.paise())
        .bind(line.sgst.paise())
        .bind(line.igst.paise())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn deduct_points(
        tx: &mut Transaction<'_, Sqlite>,
        customer_id: &str,
        points: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET loyalty_points = loyalty_points - ?2, updated_at = ?3
            WHERE id = ?1 AND loyalty_points >= ?2
            "#,
        )
        .bind(customer_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
            .bind(customer_id)
            .fetch_optional(&mut **tx)
            .await?;

        if exists.is_none() {
            return Err(DbError::not_found("Customer", customer_id));
        }

        warn!(customer_id = %customer_id, requested = points, "Loyalty balance too low at checkout");
        Err(DbError::InsufficientPoints {
            customer_id: customer_id.to_string(),
            requested: points,
        })
    }

    /// Gets an invoice with its rows.
    pub async fn get(&self, id: &str) -> DbResult<Invoice> {
        let header: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, receipt_number, customer_id, cashier_id, jurisdiction,
                   sub_total_paise, cgst_paise, sgst_paise, igst_paise,
                   total_tax_paise, grand_total_paise,
                   loyalty_points_redeemed, payable_paise, created_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let header = header.ok_or_else(|| DbError::not_found("Invoice", id))?;

        let rows: Vec<InvoiceLineRow> = sqlx::query_as(
            r#"
            SELECT line_no, product_id, name, quantity,
                   unit_rate_paise, discount_bps, tax_rate_bps,
                   line_amount_paise, cgst_paise, sgst_paise, igst_paise
            FROM invoice_lines
            WHERE invoice_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(InvoiceLine::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        header.into_invoice(lines)
    }

    /// Lists invoice headers, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<InvoiceSummary>> {
        let rows: Vec<InvoiceSummaryRow> = sqlx::query_as(
            r#"
            SELECT id, receipt_number, customer_id, grand_total_paise, payable_paise, created_at
            FROM invoices
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InvoiceSummary::from).collect())
    }

    /// GST collected per rate slab for invoices dated `from..=to`.
    ///
    /// Sums the rounded per-row amounts stored at checkout, so the report
    /// matches the printed invoices.
    pub async fn tax_summary(&self, from: NaiveDate, to: NaiveDate) -> DbResult<TaxSummary> {
        debug!(%from, %to, "Building tax summary");

        let invoice_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE invoice_date BETWEEN ?1 AND ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let slabs: Vec<SlabRow> = sqlx::query_as(
            r#"
            SELECT l.tax_rate_bps           AS tax_rate_bps,
                   SUM(l.line_amount_paise) AS taxable_paise,
                   SUM(l.cgst_paise)        AS cgst_paise,
                   SUM(l.sgst_paise)        AS sgst_paise,
                   SUM(l.igst_paise)        AS igst_paise
            FROM invoice_lines l
            INNER JOIN invoices i ON i.id = l.invoice_id
            WHERE i.invoice_date BETWEEN ?1 AND ?2
            GROUP BY l.tax_rate_bps
            ORDER BY l.tax_rate_bps
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(TaxSummary::from_slabs(
            from,
            to,
            invoice_count,
            slabs.into_iter().map(TaxSlabSummary::from).collect(),
        ))
    }
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn finalize(&self, draft: &InvoiceDraft) -> RepoResult<Invoice> {
        Ok(InvoiceRepository::finalize(self, draft).await?)
    }

    async fn get(&self, id: &str) -> RepoResult<Invoice> {
        Ok(InvoiceRepository::get(self, id).await?)
    }

    async fn recent(&self, limit: u32) -> RepoResult<Vec<InvoiceSummary>> {
        Ok(InvoiceRepository::recent(self, limit).await?)
    }

    async fn tax_summary(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<TaxSummary> {
        Ok(InvoiceRepository::tax_summary(self, from, to).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::tests::sample_customer;
    use crate::repository::product::tests::sample_product;
    use billbook_core::{Cart, Customer, RepoError};
    use rust_decimal::Decimal;

    async fn setup() -> (Database, Customer) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = sample_customer("9876543210", 100);
        db.customers().insert(&customer).await.unwrap();
        (db, customer)
    }

    /// ₹500 facial at 5% with 10% off, plus 3 × ₹50 at 12%.
    fn cart_for(customer: Option<&Customer>, redeem: i64) -> Cart {
        let mut cart = Cart::new();
        let facial = cart.add_or_increment(&sample_product("SKIN-001", "Facial", 50_000, 500)).unwrap();
        cart.set_discount(&facial, Decimal::from(10)).unwrap();
        let wax = cart.add_or_increment(&sample_product("WAX-001", "Waxing", 5_000, 1200)).unwrap();
        cart.set_quantity(&wax, 3).unwrap();
        if let Some(customer) = customer {
            cart.attach_customer(customer, "29");
            cart.request_redemption(redeem).unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_finalize_persists_and_deducts_points() {
        let (db, customer) = setup().await;
        let draft = InvoiceDraft::from_cart(&cart_for(Some(&customer), 40), "staff-1").unwrap();

        let invoice = db.invoices().finalize(&draft).await.unwrap();
        assert_eq!(invoice.receipt_number, draft.receipt_number);

        let loaded = db.invoices().get(&draft.id).await.unwrap();
        assert_eq!(loaded.lines, draft.lines);
        assert_eq!(loaded.totals, draft.totals);
        assert_eq!(loaded.totals.grand_total, Money::from_paise(64_050));
        assert_eq!(loaded.totals.payable_after_redemption, Money::from_paise(60_050));
        assert_eq!(loaded.jurisdiction, TaxJurisdiction::SameState);

        let customer = db.customers().get(&customer.id).await.unwrap();
        assert_eq!(customer.loyalty_points, 60);
    }

    #[tokio::test]
    async fn test_second_redemption_conflicts_and_rolls_back() {
        let (db, customer) = setup().await;
        let first = InvoiceDraft::from_cart(&cart_for(Some(&customer), 80), "staff-1").unwrap();
        let second = InvoiceDraft::from_cart(&cart_for(Some(&customer), 80), "staff-2").unwrap();

        db.invoices().finalize(&first).await.unwrap();
        let err = db.invoices().finalize(&second).await.unwrap_err();
        assert!(matches!(err, DbError::InsufficientPoints { requested: 80, .. }));

        // Nothing from the failed checkout was kept
        assert_eq!(db.invoices().recent(10).await.unwrap().len(), 1);
        assert!(matches!(
            db.invoices().get(&second.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(db.customers().get(&customer.id).await.unwrap().loyalty_points, 20);

        let store: &dyn InvoiceStore = &db.invoices();
        assert!(matches!(
            store.finalize(&second).await,
            Err(RepoError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_walk_in_invoice() {
        let (db, _) = setup().await;
        let draft = InvoiceDraft::from_cart(&cart_for(None, 0), "staff-1").unwrap();

        db.invoices().finalize(&draft).await.unwrap();

        let recent = db.invoices().recent(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].customer_id, None);
        assert_eq!(recent[0].grand_total, recent[0].payable_after_redemption);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let (db, _) = setup().await;
        let mut draft = InvoiceDraft::from_cart(&cart_for(None, 0), "staff-1").unwrap();
        draft.customer_id = Some("ghost".to_string());

        assert!(matches!(
            db.invoices().finalize(&draft).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_tax_summary_groups_by_slab() {
        let (db, mut customer) = setup().await;
        customer.state_code = Some("27".to_string());

        let local = InvoiceDraft::from_cart(&cart_for(None, 0), "staff-1").unwrap();
        let interstate = InvoiceDraft::from_cart(&cart_for(Some(&customer), 0), "staff-1").unwrap();
        db.invoices().finalize(&local).await.unwrap();
        db.invoices().finalize(&interstate).await.unwrap();

        let today = local.created_at.date_naive();
        let summary = db.invoices().tax_summary(today, today).await.unwrap();

        assert_eq!(summary.invoice_count, 2);
        assert_eq!(summary.slabs.len(), 2);

        // 5% slab: ₹450 taxable per invoice, ₹22.50 tax each
        let five = &summary.slabs[0];
        assert_eq!(five.tax_rate, TaxRate::GST_5);
        assert_eq!(five.taxable_value, Money::from_rupees(900));
        assert_eq!(five.cgst, Money::from_paise(1125));
        assert_eq!(five.sgst, Money::from_paise(1125));
        assert_eq!(five.igst, Money::from_paise(2250));

        assert_eq!(summary.slabs[1].tax_rate, TaxRate::GST_12);
        assert_eq!(summary.total_tax, Money::from_paise(2 * (2250 + 1800)));

        let tomorrow = today.succ_opt().unwrap();
        let empty = db.invoices().tax_summary(tomorrow, tomorrow).await.unwrap();
        assert_eq!(empty.invoice_count, 0);
        assert!(empty.slabs.is_empty());
        assert_eq!(empty.total_tax, Money::zero());
    }

    #[tokio::test]
    async fn test_get_missing_invoice() {
        let (db, _) = setup().await;
        assert!(matches!(
            db.invoices().get("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
