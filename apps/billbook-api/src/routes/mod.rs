//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /health                          open                                 │
//! │  /auth/challenge, /auth/verify    open                                 │
//! │  /products …                      Billing (read) / ManageInventory     │
//! │  /customers …                     ManageCustomers                      │
//! │  /sessions …                      Billing                              │
//! │  /invoices …, /reports …          ViewReports                          │
//! │  /staff                           ManageStaff (/staff/me: any login)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every handler except the open ones takes an [`crate::auth::AuthUser`];
//! capability checks come first in the handler body.

pub mod auth;
pub mod customers;
pub mod health;
pub mod invoices;
pub mod products;
pub mod sessions;
pub mod staff;

use axum::Router;

use crate::AppState;

/// Largest page any list endpoint returns.
pub const MAX_PAGE_SIZE: u32 = 100;

pub(crate) fn page_size(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// All routes, without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(products::routes())
        .merge(customers::routes())
        .merge(sessions::routes())
        .merge(invoices::routes())
        .merge(staff::routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_bounds() {
        assert_eq!(page_size(None, 20), 20);
        assert_eq!(page_size(Some(0), 20), 1);
        assert_eq!(page_size(Some(5000), 20), MAX_PAGE_SIZE);
    }
}
