//! Role-assignment and privilege-grant reconciliation paths.

use serde_json::json;
use tracing::{info, instrument};

use super::Reconciler;
use crate::diff::{self, PrivilegeDiffOptions, RoleDiffOptions};
use crate::error::ReconcileResult;
use crate::privilege;
use crate::statement::render_all;
use crate::types::{GrantsMode, GrantsRequest, Reconciliation, ScopeTarget, StateSnapshot};

impl Reconciler {
    /// Reconcile a principal's role assignments or privilege grants.
    ///
    /// The request must declare exactly one of the two: classification
    /// rejects ambiguous or empty requests before any server interaction.
    #[instrument(skip(self, request), fields(grantee = %request.grantee))]
    pub async fn reconcile_grants(&self, request: &GrantsRequest) -> ReconcileResult<Reconciliation> {
        match request.classify()? {
            GrantsMode::Roles => self.reconcile_roles(request).await,
            GrantsMode::Privileges => self.reconcile_privileges(request).await,
        }
    }

    async fn reconcile_roles(&self, request: &GrantsRequest) -> ReconcileResult<Reconciliation> {
        let observation = self
            .observer()
            .roles(&request.grantee, &request.roles)
            .await?;

        let mut snapshot = StateSnapshot::new();
        snapshot.insert("user_roles".to_string(), json!(observation.held));
        snapshot.insert("user_has_roles".to_string(), json!(observation.has_all));

        let options = RoleDiffOptions {
            revoke: request.revoke,
            replace: request.replace,
            create_missing: request.create_missing_roles,
        };
        let intents = diff::roles(&request.grantee, &request.roles, &observation, &options);
        let statements = render_all(&intents, request.cluster.as_deref());

        let executed = self.execute_all(statements).await?;
        info!(
            grantee = %request.grantee,
            statements = executed.len(),
            "role reconciliation complete"
        );
        Ok(Reconciliation::new(executed, snapshot))
    }

    async fn reconcile_privileges(&self, request: &GrantsRequest) -> ReconcileResult<Reconciliation> {
        privilege::validate(&request.privileges)?;

        let targets = ScopeTarget::cross_product(&request.databases, &request.tables);
        let options = PrivilegeDiffOptions {
            revoke: request.revoke,
            replace: request.replace,
        };
        let intents = diff::privileges(&request.grantee, &request.privileges, &targets, &options);
        let statements = render_all(&intents, request.cluster.as_deref());

        let executed = self.execute_all(statements).await?;
        info!(
            grantee = %request.grantee,
            targets = targets.len(),
            statements = executed.len(),
            "privilege reconciliation complete"
        );
        Ok(Reconciliation::new(executed, StateSnapshot::new()))
    }
}
