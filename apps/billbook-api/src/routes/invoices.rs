//! # Invoice and Report Routes
//!
//! Read-only views over finalized invoices, for managers.
//!
//! ```text
//! GET /invoices?limit=50
//! GET /invoices/{id}
//! GET /reports/tax-summary?from=2024-03-01&to=2024-03-31
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use billbook_core::invoice::{Invoice, InvoiceSummary, TaxSummary};
use billbook_core::Capability;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::page_size;
use crate::AppState;

/// Longest range a single tax report may cover.
const MAX_REPORT_DAYS: i64 = 366;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list))
        .route("/invoices/{id}", get(get_invoice))
        .route("/reports/tax-summary", get(tax_summary))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

/// Both ends inclusive; either defaults to today.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RangeParams {
    fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ApiError> {
        let from = self.from.unwrap_or(today);
        let to = self.to.unwrap_or(today);

        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }
        if (to - from).num_days() >= MAX_REPORT_DAYS {
            return Err(ApiError::validation(format!(
                "Report range must be under {} days",
                MAX_REPORT_DAYS
            )));
        }
        Ok((from, to))
    }
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<InvoiceSummary>>, ApiError> {
    user.require(Capability::ViewReports)?;
    let limit = page_size(params.limit, 50);
    Ok(Json(state.invoices.recent(limit).await?))
}

async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    user.require(Capability::ViewReports)?;
    Ok(Json(state.invoices.get(&id).await?))
}

async fn tax_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<RangeParams>,
) -> Result<Json<TaxSummary>, ApiError> {
    user.require(Capability::ViewReports)?;

    let (from, to) = params.resolve(Utc::now().date_naive())?;
    debug!(%from, %to, "tax_summary request");

    Ok(Json(state.invoices.tax_summary(from, to).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_range_defaults_to_today() {
        let params = RangeParams { from: None, to: None };
        assert_eq!(params.resolve(day(9)).unwrap(), (day(9), day(9)));

        let params = RangeParams { from: Some(day(1)), to: None };
        assert_eq!(params.resolve(day(9)).unwrap(), (day(1), day(9)));
    }

    #[test]
    fn test_range_rejects_inverted_and_long() {
        let params = RangeParams { from: Some(day(9)), to: Some(day(1)) };
        assert!(params.resolve(day(9)).is_err());

        let params = RangeParams {
            from: Some(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()),
            to: Some(day(1)),
        };
        assert!(params.resolve(day(9)).is_err());
    }
}
