//! # Access Control
//!
//! Roles map to a fixed capability set. The set is checked once, where a
//! request enters the system; nothing downstream compares role names.
//!
//! ```text
//!                  Billing  Inventory  Customers  Reports  Staff
//!   Admin            ✔         ✔          ✔          ✔       ✔
//!   Manager          ✔         ✔          ✔          ✔
//!   Sales            ✔                    ✔
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Capability
// =============================================================================

/// Something a signed-in user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Open billing sessions, edit carts, check out.
    Billing,
    /// Create, edit and deactivate products.
    ManageInventory,
    /// Create and edit customer profiles.
    ManageCustomers,
    /// Read invoices and tax reports.
    ViewReports,
    /// Manage staff accounts.
    ManageStaff,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Billing,
        Capability::ManageInventory,
        Capability::ManageCustomers,
        Capability::ViewReports,
        Capability::ManageStaff,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Capability::Billing => "bill",
            Capability::ManageInventory => "manage inventory",
            Capability::ManageCustomers => "manage customers",
            Capability::ViewReports => "view reports",
            Capability::ManageStaff => "manage staff",
        };
        f.write_str(text)
    }
}

// =============================================================================
// Role
// =============================================================================

/// Staff role, stored on the staff record and carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Sales,
}

impl Role {
    /// The capabilities granted to this role.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => &Capability::ALL,
            Role::Manager => &[
                Capability::Billing,
                Capability::ManageInventory,
                Capability::ManageCustomers,
                Capability::ViewReports,
            ],
            Role::Sales => &[Capability::Billing, Capability::ManageCustomers],
        }
    }

    /// Whether this role holds `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Fails with [`CoreError::Forbidden`] unless this role holds `capability`.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::access::{Capability, Role};
    ///
    /// assert!(Role::Sales.require(Capability::Billing).is_ok());
    /// assert!(Role::Sales.require(Capability::ViewReports).is_err());
    /// ```
    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                role: *self,
                capability,
            })
        }
    }

    /// Storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Sales => "sales",
        }
    }

    /// Parses the storage name.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "sales" => Ok(Role::Sales),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "manager".into(), "sales".into()],
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
