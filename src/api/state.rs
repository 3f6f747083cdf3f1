//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::service::PayrollRunner;
use crate::store::InMemoryStore;

/// Shared application state.
///
/// Holds the payroll runner, which owns the configuration and the record
/// store.
#[derive(Clone)]
pub struct AppState {
    runner: Arc<PayrollRunner>,
}

impl AppState {
    /// Creates a new application state around a runner.
    pub fn new(runner: PayrollRunner) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    /// Creates a state over an empty in-memory store; holidays come from the
    /// configuration.
    pub fn in_memory(config: ConfigLoader) -> Self {
        Self::new(PayrollRunner::new(config, Arc::new(InMemoryStore::new())))
    }

    /// Returns the payroll runner.
    pub fn runner(&self) -> &PayrollRunner {
        &self.runner
    }
}
