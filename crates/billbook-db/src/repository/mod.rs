//! # Repository Module
//!
//! SQLite implementations of the `billbook-core` ports.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  state.catalog.search("facial", 20)                            │
//! │       ▼                                                                 │
//! │  Arc<dyn ProductCatalog>          (port, billbook-core)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository                (adapter, this module)               │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get(&self, id)                                                    │
//! │  ├── insert(&self, product)                                            │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL → *Row (FromRow) → core type                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and FTS5 search
//! - [`customer::CustomerRepository`] - Customer profiles and loyalty balances
//! - [`staff::StaffRepository`] - Staff members and their roles
//! - [`held_cart::HeldCartRepository`] - Parked carts
//! - [`invoice::InvoiceRepository`] - Invoices and GST reports

pub mod customer;
pub mod held_cart;
pub mod invoice;
pub mod product;
pub mod staff;
