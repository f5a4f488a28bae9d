//! Request and result types.
//!
//! Requests arrive already validated and type-coerced by the caller (argument
//! parsing is an external collaborator); the structures here only enforce the
//! invariants the reconciler itself depends on, at classification time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};

/// A (database, table-or-wildcard) pair a privilege grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTarget {
    /// Database name.
    pub database: String,
    /// Table name or `*`.
    pub table: String,
}

impl ScopeTarget {
    /// Create a scope target.
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// The effective scope set of a request: the cross product of its
    /// databases and tables, row-major over databases then tables.
    ///
    /// This order is also the execution order of the resulting statements;
    /// replace semantics attach to the first entry.
    pub fn cross_product(databases: &[String], tables: &[String]) -> Vec<ScopeTarget> {
        let mut targets = Vec::with_capacity(databases.len() * tables.len());
        for database in databases {
            for table in tables {
                targets.push(ScopeTarget::new(database, table));
            }
        }
        targets
    }
}

impl fmt::Display for ScopeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

fn default_databases() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_tables() -> Vec<String> {
    vec!["*".to_string()]
}

/// Declared grant state for one principal: either a role assignment or a
/// privilege grant, never both in one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantsRequest {
    /// User or role the grants apply to.
    pub grantee: String,

    /// Roles the grantee should hold.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Privileges the grantee should hold.
    #[serde(default)]
    pub privileges: Vec<String>,

    /// Databases the privileges apply to.
    #[serde(default = "default_databases")]
    pub databases: Vec<String>,

    /// Tables the privileges apply to (`*` for all).
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,

    /// Revoke the requested roles/privileges instead of granting them.
    #[serde(default)]
    pub revoke: bool,

    /// Make the held set equal exactly the requested set.
    #[serde(default)]
    pub replace: bool,

    /// Create requested roles that do not exist yet.
    #[serde(default)]
    pub create_missing_roles: bool,

    /// Run grant/revoke statements as distributed DDL on this cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

impl GrantsRequest {
    /// Create a request for a grantee with defaulted scope.
    pub fn new(grantee: impl Into<String>) -> Self {
        Self {
            grantee: grantee.into(),
            roles: Vec::new(),
            privileges: Vec::new(),
            databases: default_databases(),
            tables: default_tables(),
            revoke: false,
            replace: false,
            create_missing_roles: false,
            cluster: None,
        }
    }

    /// Set the desired role set.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the desired privilege set.
    #[must_use]
    pub fn with_privileges<I, S>(mut self, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.privileges = privileges.into_iter().map(Into::into).collect();
        self
    }

    /// Set the database list.
    #[must_use]
    pub fn with_databases<I, S>(mut self, databases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.databases = databases.into_iter().map(Into::into).collect();
        self
    }

    /// Set the table list.
    #[must_use]
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Revoke instead of grant.
    #[must_use]
    pub fn revoke(mut self) -> Self {
        self.revoke = true;
        self
    }

    /// Replace existing grants.
    #[must_use]
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Create requested roles that do not exist yet.
    #[must_use]
    pub fn create_missing_roles(mut self) -> Self {
        self.create_missing_roles = true;
        self
    }

    /// Run grant/revoke statements on a cluster.
    #[must_use]
    pub fn on_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Classify the request into exactly one reconciliation mode.
    ///
    /// Enforces the mutual-exclusion invariants before any server
    /// interaction: exactly one of roles/privileges non-empty, and at most
    /// one of revoke/replace set.
    pub(crate) fn classify(&self) -> ReconcileResult<GrantsMode> {
        if self.revoke && self.replace {
            return Err(ReconcileError::configuration(
                "'revoke' and 'replace' are mutually exclusive",
            ));
        }
        match (self.roles.is_empty(), self.privileges.is_empty()) {
            (false, false) => Err(ReconcileError::configuration(
                "only one of 'roles' or 'privileges' may be defined",
            )),
            (true, true) => Err(ReconcileError::configuration(
                "no roles or privileges are defined",
            )),
            (false, true) => Ok(GrantsMode::Roles),
            (true, false) => Ok(GrantsMode::Privileges),
        }
    }
}

/// The two mutually exclusive grant reconciliation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GrantsMode {
    Roles,
    Privileges,
}

/// Target state of a managed user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    /// The user should exist.
    #[default]
    Present,
    /// The user should not exist.
    Absent,
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserState::Present => write!(f, "present"),
            UserState::Absent => write!(f, "absent"),
        }
    }
}

/// Declared lifecycle state for one user: existence, password, and the
/// quota, profile, and roles it should carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    /// User name.
    pub name: String,

    /// Password for user creation.
    #[serde(default)]
    pub password: String,

    /// Target state.
    #[serde(default)]
    pub state: UserState,

    /// Roles the user should hold.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Quota the user should be a member of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<String>,

    /// Settings profile the user should be assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl UserRequest {
    /// Create a request targeting a present user with no policy objects.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: String::new(),
            state: UserState::Present,
            roles: Vec::new(),
            quota: None,
            profile: None,
        }
    }

    /// Set the creation password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the target state.
    #[must_use]
    pub fn with_state(mut self, state: UserState) -> Self {
        self.state = state;
        self
    }

    /// Set the desired role set.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the quota membership target.
    #[must_use]
    pub fn with_quota(mut self, quota: impl Into<String>) -> Self {
        self.quota = Some(quota.into());
        self
    }

    /// Set the settings profile target.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Observed-state snapshot returned alongside a reconciliation result.
///
/// Keys follow the server-side vocabulary (`user_exists`, `user_roles`,
/// `user_has_roles`, …); ordered for deterministic serialization.
pub type StateSnapshot = BTreeMap<String, serde_json::Value>;

/// Outcome of one reconciliation call.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// Whether at least one statement was executed.
    pub changed: bool,
    /// Executed statements, in execution order.
    pub executed: Vec<String>,
    /// Observed-state snapshot taken before mutation.
    pub snapshot: StateSnapshot,
}

impl Reconciliation {
    /// Build an outcome from the executed statements and snapshot.
    pub fn new(executed: Vec<String>, snapshot: StateSnapshot) -> Self {
        Self {
            changed: !executed.is_empty(),
            executed,
            snapshot,
        }
    }
}
