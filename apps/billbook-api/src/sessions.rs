//! # Billing Sessions
//!
//! Open carts live in memory, one per till session, keyed by cart id.
//! Each cart sits behind its own mutex so two requests on the same session
//! apply one after the other, while different sessions never wait on each
//! other.
//!
//! ```text
//! SessionRegistry
//!   RwLock<HashMap<id, Arc<Mutex<Cart>>>>
//!        │
//!        ├── open()    ──► new Cart
//!        ├── lock(id)  ──► guard on a cart that is still registered
//!        ├── insert()  ◄── resumed held cart
//!        └── remove()  ◄── hold / checkout / discard
//! ```
//!
//! Hold and checkout remove the session while they still hold the cart's
//! lock. A request queued behind them finds the entry gone once it gets the
//! lock, and fails with NotFound instead of touching a closed cart.

use std::collections::HashMap;
use std::sync::Arc;

use billbook_core::Cart;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use crate::error::ApiError;

pub type SharedCart = Arc<Mutex<Cart>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SharedCart>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session with an empty cart.
    pub async fn open(&self) -> (String, SharedCart) {
        self.insert(Cart::new()).await
    }

    /// Registers an existing cart under its own id.
    pub async fn insert(&self, cart: Cart) -> (String, SharedCart) {
        let id = cart.id.clone();
        let shared = Arc::new(Mutex::new(cart));
        self.sessions
            .write()
            .await
            .insert(id.clone(), shared.clone());
        debug!(session_id = %id, "Session opened");
        (id, shared)
    }

    pub async fn get(&self, id: &str) -> Result<SharedCart, ApiError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Session", id))
    }

    /// Locks a session's cart.
    ///
    /// The registry is checked again after the lock is acquired, so a cart
    /// closed by the previous lock holder is reported as NotFound.
    pub async fn lock(&self, id: &str) -> Result<OwnedMutexGuard<Cart>, ApiError> {
        let shared = self.get(id).await?;
        let guard = shared.clone().lock_owned().await;

        let current = self.sessions.read().await.get(id).cloned();
        match current {
            Some(entry) if Arc::ptr_eq(&entry, &shared) => Ok(guard),
            _ => {
                debug!(session_id = %id, "Session closed while waiting for its cart");
                Err(ApiError::not_found("Session", id))
            }
        }
    }

    pub async fn remove(&self, id: &str) -> Option<SharedCart> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            debug!(session_id = %id, "Session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
