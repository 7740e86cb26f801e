//! Application state for the Adjustment Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::PayrollConfig;
use crate::ledger::Ledger;
use crate::store::InMemoryStore;

/// Shared application state.
///
/// Every request runs as one unit of work against the ledger; the mutex
/// serializes them.
#[derive(Clone)]
pub struct AppState {
    /// The ledger over the in-memory store.
    ledger: Arc<Mutex<Ledger<InMemoryStore>>>,
}

impl AppState {
    /// Creates a new application state around an existing ledger.
    pub fn new(ledger: Ledger<InMemoryStore>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Creates a new application state with an empty store.
    pub fn with_config(config: PayrollConfig) -> Self {
        Self::new(Ledger::new(InMemoryStore::new(), Arc::new(config)))
    }

    /// Returns the shared ledger.
    pub fn ledger(&self) -> &Arc<Mutex<Ledger<InMemoryStore>>> {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_app_state_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppState>();
    }
}
