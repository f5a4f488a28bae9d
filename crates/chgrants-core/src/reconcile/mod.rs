//! Reconciler orchestrator.
//!
//! Entry point for reconciliation calls. Selects exactly one reconciliation
//! path per call, drives observe → diff → render, then executes the
//! resulting statements through the gateway in emission order.

mod grants;
mod users;

use std::sync::Arc;

use tracing::debug;

use crate::error::{ReconcileError, ReconcileResult};
use crate::gateway::QueryGateway;
use crate::observe::StateObserver;

/// Reconciles declared authorization state against a live server.
///
/// Holds the gateway capability for the duration of its lifetime; one
/// reconciliation call processes one principal end-to-end, in strict
/// sequence.
pub struct Reconciler {
    gateway: Arc<dyn QueryGateway>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler over an optional gateway capability.
    ///
    /// The capability is explicit: when the running environment has no
    /// database client to offer, `None` is rejected here, before any
    /// reconciliation is attempted.
    pub fn new(gateway: Option<Arc<dyn QueryGateway>>) -> ReconcileResult<Self> {
        match gateway {
            Some(gateway) => Ok(Self { gateway }),
            None => Err(ReconcileError::dependency_missing("database client")),
        }
    }

    /// Create a reconciler over a known-present gateway.
    pub fn with_gateway(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    pub(crate) fn observer(&self) -> StateObserver<'_> {
        StateObserver::new(self.gateway.as_ref())
    }

    /// Execute statements one at a time, in order. Fail-fast: the first
    /// failing statement aborts the rest; the error carries everything
    /// executed up to that point. No rollback: partial application is a
    /// visible, expected outcome.
    pub(crate) async fn execute_all(&self, statements: Vec<String>) -> ReconcileResult<Vec<String>> {
        let mut executed = Vec::with_capacity(statements.len());
        for statement in statements {
            debug!(statement = %statement, "executing statement");
            match self.gateway.execute(&statement).await {
                Ok(_) => executed.push(statement),
                Err(error) => return Err(ReconcileError::server(error, executed)),
            }
        }
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_rejects_missing_capability() {
        let err = Reconciler::new(None).unwrap_err();
        assert_eq!(err.error_code(), "DEPENDENCY_MISSING");
    }
}
