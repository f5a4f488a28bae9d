//! Live state observation.
//!
//! Read-only queries against the server's system tables, normalized into the
//! observation structs the diff engine consumes. All current state is read
//! live; nothing is cached between calls.

use tracing::debug;

use crate::error::{ReconcileError, ReconcileResult};
use crate::gateway::{QueryGateway, Row};
use crate::statement::escape_literal;

/// Roles currently granted to a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleObservation {
    /// Granted role names, in server order.
    pub held: Vec<String>,
    /// Whether every desired role is already held.
    pub has_all: bool,
}

impl RoleObservation {
    /// Assess a held set against a desired set.
    pub fn assess(held: Vec<String>, desired: &[String]) -> Self {
        let has_all = desired.iter().all(|role| held.contains(role));
        Self { held, has_all }
    }
}

/// Settings profiles currently inherited by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileObservation {
    /// Inherited profile names, in server order.
    pub profiles: Vec<String>,
    /// Whether the desired profile is among them.
    pub has_profile: bool,
}

/// Quota memberships of a user, plus the desired quota's member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaObservation {
    /// Quotas currently applied to the user.
    pub quotas: Vec<String>,
    /// Whether the desired quota is among them.
    pub has_quota: bool,
    /// The desired quota's full member list with the user appended;
    /// exactly what an `ALTER QUOTA` re-statement must carry.
    pub members: Vec<String>,
}

/// Issues read-only queries through the execution gateway.
pub struct StateObserver<'a> {
    gateway: &'a dyn QueryGateway,
}

impl<'a> StateObserver<'a> {
    /// Create an observer over a gateway.
    pub fn new(gateway: &'a dyn QueryGateway) -> Self {
        Self { gateway }
    }

    async fn fetch(&self, query: &str) -> ReconcileResult<Vec<Row>> {
        self.gateway
            .execute(query)
            .await
            .map_err(|error| ReconcileError::server(error, Vec::new()))
    }

    /// First-column text values of a result set; non-text cells are skipped.
    fn texts(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .filter_map(|row| row.first())
            .filter_map(|value| value.as_text())
            .map(ToString::to_string)
            .collect()
    }

    /// Whether a user or role with this name exists.
    pub async fn principal_exists(&self, principal: &str) -> ReconcileResult<bool> {
        let query = format!(
            "SELECT count() FROM system.users WHERE name = '{}'",
            escape_literal(principal)
        );
        let rows = self.fetch(&query).await?;
        let count = rows
            .first()
            .and_then(|row| row.first())
            .and_then(|value| value.as_uint())
            .unwrap_or(0);
        debug!(principal = %principal, exists = count > 0, "observed principal existence");
        Ok(count > 0)
    }

    /// Roles currently granted to a principal. No existence gate: a
    /// principal with no grants (or none at all) yields an empty set.
    pub async fn held_roles(&self, principal: &str) -> ReconcileResult<Vec<String>> {
        let query = format!(
            "SELECT granted_role_name FROM system.role_grants WHERE user_name = '{}';",
            escape_literal(principal)
        );
        let rows = self.fetch(&query).await?;
        Ok(Self::texts(&rows))
    }

    /// Observe a principal's roles against a desired set.
    ///
    /// A non-empty desired set against a non-existent principal is an
    /// error, not silently "nothing held".
    pub async fn roles(
        &self,
        principal: &str,
        desired: &[String],
    ) -> ReconcileResult<RoleObservation> {
        if !self.principal_exists(principal).await? {
            return Err(ReconcileError::principal_not_found(principal));
        }
        let held = self.held_roles(principal).await?;
        debug!(principal = %principal, held = held.len(), "observed role grants");
        Ok(RoleObservation::assess(held, desired))
    }

    /// Observe a user's inherited settings profiles against a desired one.
    pub async fn profile(&self, user: &str, profile: &str) -> ReconcileResult<ProfileObservation> {
        let query = format!(
            "SELECT inherit_profile FROM system.settings_profile_elements WHERE user_name = '{}';",
            escape_literal(user)
        );
        let rows = self.fetch(&query).await?;
        let profiles = Self::texts(&rows);
        let has_profile = profiles.iter().any(|name| name == profile);
        Ok(ProfileObservation {
            profiles,
            has_profile,
        })
    }

    /// Observe a user's quota memberships and the desired quota's member
    /// list.
    pub async fn quota(&self, user: &str, quota: &str) -> ReconcileResult<QuotaObservation> {
        let applied_query = format!(
            "SELECT name FROM system.quotas WHERE has(apply_to_list, '{}');",
            escape_literal(user)
        );
        let members_query = format!(
            "SELECT apply_to_list FROM system.quotas WHERE name = '{}';",
            escape_literal(quota)
        );

        let quotas = Self::texts(&self.fetch(&applied_query).await?);
        let has_quota = quotas.iter().any(|name| name == quota);

        let member_rows = self.fetch(&members_query).await?;
        let mut members: Vec<String> = member_rows
            .first()
            .and_then(|row| row.first())
            .and_then(|value| value.as_text_array())
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        members.push(user.to_string());

        Ok(QuotaObservation {
            quotas,
            has_quota,
            members,
        })
    }
}
