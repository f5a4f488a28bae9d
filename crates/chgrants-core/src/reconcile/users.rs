//! User-lifecycle reconciliation path.

use serde_json::json;
use tracing::{info, instrument};

use super::Reconciler;
use crate::diff::{self, RoleDiffOptions};
use crate::error::ReconcileResult;
use crate::observe::RoleObservation;
use crate::statement::{render_all, MutationIntent};
use crate::types::{Reconciliation, StateSnapshot, UserRequest, UserState};

impl Reconciler {
    /// Reconcile a user towards its declared lifecycle state.
    ///
    /// Target present: create the user if absent, then independently
    /// converge quota membership, profile assignment, and role grants, each
    /// gated on its own already-satisfied check. Target absent: drop the
    /// user if it exists.
    #[instrument(skip(self, request), fields(user = %request.name, state = %request.state))]
    pub async fn reconcile_user(&self, request: &UserRequest) -> ReconcileResult<Reconciliation> {
        match request.state {
            UserState::Present => self.ensure_present(request).await,
            UserState::Absent => self.ensure_absent(request).await,
        }
    }

    async fn ensure_present(&self, request: &UserRequest) -> ReconcileResult<Reconciliation> {
        let observer = self.observer();
        let exists = observer.principal_exists(&request.name).await?;

        let mut snapshot = StateSnapshot::new();
        snapshot.insert("user_exists".to_string(), json!(exists));

        let mut intents = Vec::new();
        if !exists {
            intents.push(MutationIntent::CreateUser {
                name: request.name.clone(),
                password: request.password.clone(),
            });
        }

        if let Some(quota) = &request.quota {
            let observation = observer.quota(&request.name, quota).await?;
            snapshot.insert("user_quotas".to_string(), json!(observation.quotas));
            snapshot.insert("user_has_quota".to_string(), json!(observation.has_quota));
            if !observation.has_quota {
                intents.push(MutationIntent::AlterQuota {
                    quota: quota.clone(),
                    members: observation.members,
                });
            }
        }

        if let Some(profile) = &request.profile {
            let observation = observer.profile(&request.name, profile).await?;
            snapshot.insert("user_profiles".to_string(), json!(observation.profiles));
            snapshot.insert(
                "user_has_profile".to_string(),
                json!(observation.has_profile),
            );
            if !observation.has_profile {
                intents.push(MutationIntent::AlterProfile {
                    user: request.name.clone(),
                    profile: profile.clone(),
                });
            }
        }

        if !request.roles.is_empty() {
            // No existence gate here: the user may be created by an earlier
            // statement in this same batch.
            let held = observer.held_roles(&request.name).await?;
            let observation = RoleObservation::assess(held, &request.roles);
            snapshot.insert("user_roles".to_string(), json!(observation.held));
            snapshot.insert("user_has_roles".to_string(), json!(observation.has_all));
            intents.extend(diff::roles(
                &request.name,
                &request.roles,
                &observation,
                &RoleDiffOptions::default(),
            ));
        }

        let statements = render_all(&intents, None);
        let executed = self.execute_all(statements).await?;
        info!(
            user = %request.name,
            created = !exists,
            statements = executed.len(),
            "user reconciliation complete"
        );
        Ok(Reconciliation::new(executed, snapshot))
    }

    async fn ensure_absent(&self, request: &UserRequest) -> ReconcileResult<Reconciliation> {
        let exists = self.observer().principal_exists(&request.name).await?;

        let mut snapshot = StateSnapshot::new();
        snapshot.insert("user_exists".to_string(), json!(exists));

        let statements = if exists {
            render_all(
                &[MutationIntent::DropUser {
                    name: request.name.clone(),
                }],
                None,
            )
        } else {
            Vec::new()
        };

        let executed = self.execute_all(statements).await?;
        info!(
            user = %request.name,
            dropped = exists,
            "user removal reconciliation complete"
        );
        Ok(Reconciliation::new(executed, snapshot))
    }
}
