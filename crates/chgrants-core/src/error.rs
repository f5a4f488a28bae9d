//! Reconciliation error types.
//!
//! One closed taxonomy for everything that can abort a reconciliation call.
//! All variants are terminal for the current call; nothing is retried
//! internally.

use thiserror::Error;

use crate::gateway::ServerError;

/// Error that can occur during a reconciliation call.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Mutually exclusive or missing required inputs. Raised before any
    /// server interaction.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// A requested privilege name is not in the supported taxonomy.
    #[error("'{privilege}' is not in applicable grants: {}", allowed.join(", "))]
    UnsupportedPrivilege {
        privilege: String,
        allowed: Vec<&'static str>,
    },

    /// A non-empty desired role set was observed against a principal that
    /// does not exist on the server.
    #[error("'{principal}' user does not exist")]
    PrincipalNotFound { principal: String },

    /// The execution gateway reported a failure. Carries the statements that
    /// were already executed before the failing one, so the caller can reason
    /// about partial convergence.
    #[error("server execution failed: {error}")]
    ServerExecution {
        error: ServerError,
        executed: Vec<String>,
    },

    /// The database client capability required to reach the server is
    /// unavailable in the running environment.
    #[error("required capability unavailable: {capability}")]
    DependencyMissing { capability: String },
}

impl ReconcileError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReconcileError::Configuration { .. } => "CONFIGURATION",
            ReconcileError::UnsupportedPrivilege { .. } => "UNSUPPORTED_PRIVILEGE",
            ReconcileError::PrincipalNotFound { .. } => "PRINCIPAL_NOT_FOUND",
            ReconcileError::ServerExecution { .. } => "SERVER_EXECUTION",
            ReconcileError::DependencyMissing { .. } => "DEPENDENCY_MISSING",
        }
    }

    /// Statements that were successfully executed before the call failed.
    ///
    /// Empty for every variant raised before statement execution begins.
    pub fn executed_statements(&self) -> &[String] {
        match self {
            ReconcileError::ServerExecution { executed, .. } => executed,
            _ => &[],
        }
    }

    // Convenience constructors

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        ReconcileError::Configuration {
            message: message.into(),
        }
    }

    /// Create a principal-not-found error.
    pub fn principal_not_found(principal: impl Into<String>) -> Self {
        ReconcileError::PrincipalNotFound {
            principal: principal.into(),
        }
    }

    /// Create a server-execution error with the statements executed so far.
    pub fn server(error: ServerError, executed: Vec<String>) -> Self {
        ReconcileError::ServerExecution { error, executed }
    }

    /// Create a dependency-missing error.
    pub fn dependency_missing(capability: impl Into<String>) -> Self {
        ReconcileError::DependencyMissing {
            capability: capability.into(),
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ReconcileError::configuration("x").error_code(),
            "CONFIGURATION"
        );
        assert_eq!(
            ReconcileError::principal_not_found("reader").error_code(),
            "PRINCIPAL_NOT_FOUND"
        );
        assert_eq!(
            ReconcileError::dependency_missing("clickhouse client").error_code(),
            "DEPENDENCY_MISSING"
        );
    }

    #[test]
    fn test_principal_not_found_display() {
        let err = ReconcileError::principal_not_found("reader");
        assert_eq!(err.to_string(), "'reader' user does not exist");
    }

    #[test]
    fn test_executed_statements_only_on_server_execution() {
        let err = ReconcileError::server(
            ServerError::classify(None, "boom"),
            vec!["GRANT r1 to 'u'".to_string()],
        );
        assert_eq!(err.executed_statements(), ["GRANT r1 to 'u'".to_string()]);
        assert!(ReconcileError::configuration("x")
            .executed_statements()
            .is_empty());
    }

    #[test]
    fn test_unsupported_privilege_lists_allowed_set() {
        let err = ReconcileError::UnsupportedPrivilege {
            privilege: "FLY".to_string(),
            allowed: vec!["SELECT", "INSERT"],
        };
        assert_eq!(
            err.to_string(),
            "'FLY' is not in applicable grants: SELECT, INSERT"
        );
    }
}
