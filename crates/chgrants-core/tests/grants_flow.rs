//! End-to-end tests for the role-assignment and privilege-grant paths.

use std::sync::Arc;

use chgrants_core::error::ReconcileError;
use chgrants_core::gateway::ServerError;
use chgrants_core::reconcile::Reconciler;
use chgrants_core::types::GrantsRequest;
use chgrants_testkit::MockGateway;

#[tokio::test]
async fn test_role_grant_is_idempotent() {
    // First run: nothing held yet.
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &[]),
    );
    let reconciler = Reconciler::with_gateway(gateway.clone());
    let request = GrantsRequest::new("developer").with_roles(["reader"]);

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.executed, ["GRANT reader to 'developer'"]);

    // Second run against the converged state: no further mutations.
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &["reader"]),
    );
    let reconciler = Reconciler::with_gateway(gateway.clone());

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert!(!outcome.changed);
    assert!(outcome.executed.is_empty());
    // Only observation queries reached the server.
    assert!(gateway.executed().iter().all(|s| s.starts_with("SELECT")));
}

#[tokio::test]
async fn test_revoking_unheld_roles_changes_nothing() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &["other"]),
    );
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("developer").with_roles(["reader"]).revoke();

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert!(!outcome.changed);
    assert!(outcome.executed.is_empty());
}

#[tokio::test]
async fn test_revoke_targets_only_held_roles() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &["r2", "r3"]),
    );
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("developer")
        .with_roles(["r1", "r2"])
        .revoke();

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(outcome.executed, ["REVOKE r2 from 'developer'"]);
}

#[tokio::test]
async fn test_replace_executes_even_when_satisfied() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &["reader", "extra"]),
    );
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("developer").with_roles(["reader"]).replace();

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(
        outcome.executed,
        ["GRANT reader to 'developer' WITH REPLACE OPTION"]
    );
}

#[tokio::test]
async fn test_missing_roles_are_created_before_granting() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &["r2"]),
    );
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("developer")
        .with_roles(["r1", "r2", "r3"])
        .create_missing_roles();

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(
        outcome.executed,
        [
            "CREATE ROLE IF NOT EXISTS r1",
            "CREATE ROLE IF NOT EXISTS r3",
            "GRANT r1, r2, r3 to 'developer'",
        ]
    );
}

#[tokio::test]
async fn test_role_reconciliation_requires_existing_principal() {
    let gateway = Arc::new(MockGateway::new().with_user("ghost", false));
    let reconciler = Reconciler::with_gateway(gateway.clone());
    let request = GrantsRequest::new("ghost").with_roles(["reader"]);

    let err = reconciler.reconcile_grants(&request).await.unwrap_err();
    assert!(matches!(err, ReconcileError::PrincipalNotFound { .. }));
    assert!(gateway.executed().iter().all(|s| s.starts_with("SELECT")));
}

#[tokio::test]
async fn test_privilege_grants_follow_row_major_order() {
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("reader")
        .with_privileges(["select"])
        .with_databases(["d1", "d2"])
        .with_tables(["t1", "t2"]);

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(
        outcome.executed,
        [
            "GRANT select on d1.t1 to 'reader'",
            "GRANT select on d1.t2 to 'reader'",
            "GRANT select on d2.t1 to 'reader'",
            "GRANT select on d2.t2 to 'reader'",
        ]
    );
}

#[tokio::test]
async fn test_replace_clause_attaches_to_first_scope_only() {
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("reader")
        .with_privileges(["select", "insert"])
        .with_databases(["d1", "d2"])
        .with_tables(["t1", "t2"])
        .replace();

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(outcome.executed.len(), 4);
    assert_eq!(
        outcome.executed[0],
        "GRANT select, insert on d1.t1 to 'reader' WITH REPLACE OPTION"
    );
    let with_replace = outcome
        .executed
        .iter()
        .filter(|s| s.ends_with("WITH REPLACE OPTION"))
        .count();
    assert_eq!(with_replace, 1);
}

#[tokio::test]
async fn test_privilege_revoke_is_unconditional_per_scope() {
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("reader_role")
        .with_privileges(["delete"])
        .revoke();

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(
        outcome.executed,
        ["REVOKE delete on default.* from 'reader_role'"]
    );
}

#[tokio::test]
async fn test_unknown_privilege_aborts_before_execution() {
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Reconciler::with_gateway(gateway.clone());
    let request = GrantsRequest::new("reader").with_privileges(["select", "teleport"]);

    let err = reconciler.reconcile_grants(&request).await.unwrap_err();
    assert!(matches!(err, ReconcileError::UnsupportedPrivilege { .. }));
    assert!(gateway.executed().is_empty());
}

#[tokio::test]
async fn test_roles_and_privileges_are_mutually_exclusive() {
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Reconciler::with_gateway(gateway.clone());
    let request = GrantsRequest::new("reader")
        .with_roles(["r1"])
        .with_privileges(["select"]);

    let err = reconciler.reconcile_grants(&request).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Configuration { .. }));
    assert!(gateway.executed().is_empty());
}

#[tokio::test]
async fn test_failed_statement_aborts_rest_of_batch() {
    let gateway = Arc::new(
        MockGateway::new().fail_on(
            "GRANT select on d2.* to 'reader'",
            ServerError::classify(Some(497), "DB::Exception: Not enough privileges."),
        ),
    );
    let reconciler = Reconciler::with_gateway(gateway.clone());
    let request = GrantsRequest::new("reader")
        .with_privileges(["select"])
        .with_databases(["d1", "d2", "d3"]);

    let err = reconciler.reconcile_grants(&request).await.unwrap_err();
    match &err {
        ReconcileError::ServerExecution { error, executed } => {
            assert_eq!(error.code, Some(497));
            assert_eq!(error.message, "DB::Exception: Not enough privileges.");
            assert_eq!(executed, &["GRANT select on d1.* to 'reader'".to_string()]);
        }
        other => panic!("expected ServerExecution, got {other:?}"),
    }
    // The third statement was never submitted.
    assert!(!gateway
        .executed()
        .contains(&"GRANT select on d3.* to 'reader'".to_string()));
}

#[tokio::test]
async fn test_cluster_qualifies_grant_statements() {
    let gateway = Arc::new(MockGateway::new());
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("reader_role")
        .with_privileges(["select"])
        .with_databases(["statistics"])
        .on_cluster("main");

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(
        outcome.executed,
        ["GRANT on CLUSTER 'main' select on statistics.* to 'reader_role'"]
    );
}

#[tokio::test]
async fn test_snapshot_reports_observed_roles() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_user("developer", true)
            .with_roles("developer", &["r1", "r2"]),
    );
    let reconciler = Reconciler::with_gateway(gateway);
    let request = GrantsRequest::new("developer").with_roles(["r1"]);

    let outcome = reconciler.reconcile_grants(&request).await.unwrap();
    assert_eq!(
        outcome.snapshot.get("user_roles"),
        Some(&serde_json::json!(["r1", "r2"]))
    );
    assert_eq!(
        outcome.snapshot.get("user_has_roles"),
        Some(&serde_json::json!(true))
    );
}

#[tokio::test]
async fn test_reconciler_requires_a_gateway_capability() {
    let err = Reconciler::new(None).unwrap_err();
    assert!(matches!(err, ReconcileError::DependencyMissing { .. }));
}
