//! # chgrants Testkit
//!
//! Test utilities for chgrants.
//!
//! Provides [`MockGateway`], a scripted in-memory implementation of the
//! execution gateway: observation queries are answered from a response
//! table keyed by exact statement text, every executed statement is
//! recorded in order, and individual statements can be scripted to fail.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chgrants_testkit::MockGateway;
//!
//! let gateway = MockGateway::new()
//!     .with_user("reader", true)
//!     .with_roles("reader", &["r1"]);
//!
//! let reconciler = Reconciler::with_gateway(std::sync::Arc::new(gateway));
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use chgrants_core::gateway::{QueryGateway, Row, ServerError, Value};

/// Scripted in-memory gateway.
///
/// Statements without a scripted response succeed with an empty row set,
/// which makes mutating statements "just work" while still being recorded.
#[derive(Default)]
pub struct MockGateway {
    responses: HashMap<String, Vec<Row>>,
    failures: HashMap<String, ServerError>,
    executed: Mutex<Vec<String>>,
}

impl MockGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an exact statement to return the given rows.
    #[must_use]
    pub fn on(mut self, statement: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.insert(statement.into(), rows);
        self
    }

    /// Script an exact statement to fail with the given error.
    #[must_use]
    pub fn fail_on(mut self, statement: impl Into<String>, error: ServerError) -> Self {
        self.failures.insert(statement.into(), error);
        self
    }

    /// Script the principal-existence query.
    #[must_use]
    pub fn with_user(self, name: &str, exists: bool) -> Self {
        let count = u64::from(exists);
        self.on(
            format!("SELECT count() FROM system.users WHERE name = '{name}'"),
            vec![vec![Value::UInt(count)]],
        )
    }

    /// Script the granted-roles query.
    #[must_use]
    pub fn with_roles(self, principal: &str, roles: &[&str]) -> Self {
        self.on(
            format!(
                "SELECT granted_role_name FROM system.role_grants WHERE user_name = '{principal}';"
            ),
            text_rows(roles),
        )
    }

    /// Script the inherited-profiles query.
    #[must_use]
    pub fn with_profiles(self, user: &str, profiles: &[&str]) -> Self {
        self.on(
            format!(
                "SELECT inherit_profile FROM system.settings_profile_elements WHERE user_name = '{user}';"
            ),
            text_rows(profiles),
        )
    }

    /// Script the quotas-applied-to-user query.
    #[must_use]
    pub fn with_user_quotas(self, user: &str, quotas: &[&str]) -> Self {
        self.on(
            format!("SELECT name FROM system.quotas WHERE has(apply_to_list, '{user}');"),
            text_rows(quotas),
        )
    }

    /// Script the quota member-list query.
    #[must_use]
    pub fn with_quota_members(self, quota: &str, members: &[&str]) -> Self {
        self.on(
            format!("SELECT apply_to_list FROM system.quotas WHERE name = '{quota}';"),
            vec![vec![Value::TextArray(
                members.iter().map(ToString::to_string).collect(),
            )]],
        )
    }

    /// Every statement executed so far, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl QueryGateway for MockGateway {
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, ServerError> {
        self.executed.lock().push(statement.to_string());
        if let Some(error) = self.failures.get(statement) {
            return Err(error.clone());
        }
        Ok(self.responses.get(statement).cloned().unwrap_or_default())
    }
}

/// Build single-column text rows.
pub fn text_rows(values: &[&str]) -> Vec<Row> {
    values.iter().map(|value| vec![Value::from(*value)]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_scripts() {
        let gateway = MockGateway::new().with_user("dev", true);
        let rows = gateway
            .execute("SELECT count() FROM system.users WHERE name = 'dev'")
            .await
            .unwrap();
        assert_eq!(rows, vec![vec![Value::UInt(1)]]);
        let rows = gateway.execute("GRANT r1 to 'dev'").await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(
            gateway.executed(),
            [
                "SELECT count() FROM system.users WHERE name = 'dev'".to_string(),
                "GRANT r1 to 'dev'".to_string(),
            ]
        );
    }
}
