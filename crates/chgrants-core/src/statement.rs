//! Mutation intents and statement rendering.
//!
//! The diff engine emits [`MutationIntent`] values; rendering maps each one
//! to exactly one literal statement string. Rendering never reorders or
//! deduplicates: ordering fidelity with the diff output is a contract.

use crate::types::ScopeTarget;

/// A planned mutation, carrying the data needed to render it and nothing
/// else. Produced by the diff engine, consumed once by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Create a role if it does not exist.
    CreateRole {
        /// Role name.
        role: String,
    },
    /// Grant a role set to a grantee.
    GrantRoles {
        /// Roles to grant, in request order.
        roles: Vec<String>,
        /// User or role receiving the grant.
        grantee: String,
        /// Make the held role set equal exactly `roles`.
        replace: bool,
    },
    /// Revoke one role from a grantee.
    RevokeRoles {
        /// Role to revoke.
        role: String,
        /// User or role losing the grant.
        grantee: String,
    },
    /// Create a user with a sha256 password.
    CreateUser {
        /// User name.
        name: String,
        /// Plaintext password (hashed server-side).
        password: String,
    },
    /// Drop a user.
    DropUser {
        /// User name.
        name: String,
    },
    /// Grant a privilege set at one scope target.
    GrantPrivileges {
        /// Privileges to grant, in request order and spelling.
        privileges: Vec<String>,
        /// Scope the grant applies to.
        on: ScopeTarget,
        /// User or role receiving the grant.
        grantee: String,
        /// Make the privilege set at this scope equal exactly `privileges`.
        replace: bool,
    },
    /// Revoke a privilege set at one scope target.
    RevokePrivileges {
        /// Privileges to revoke.
        privileges: Vec<String>,
        /// Scope the revoke applies to.
        on: ScopeTarget,
        /// User or role losing the grant.
        grantee: String,
    },
    /// Re-state a quota's member list.
    AlterQuota {
        /// Quota name.
        quota: String,
        /// Full member list, existing members first.
        members: Vec<String>,
    },
    /// Assign a settings profile to a user.
    AlterProfile {
        /// User name.
        user: String,
        /// Profile name.
        profile: String,
    },
}

/// Escape a string for embedding inside single quotes.
pub(crate) fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// The `on CLUSTER '<name>' ` segment, or nothing.
fn cluster_clause(cluster: Option<&str>) -> String {
    match cluster {
        Some(name) => format!("on CLUSTER '{}' ", escape_literal(name)),
        None => String::new(),
    }
}

impl MutationIntent {
    /// Render this intent as one literal statement.
    ///
    /// `cluster` qualifies grant/revoke statements as distributed DDL; the
    /// remaining statement kinds ignore it.
    pub fn render(&self, cluster: Option<&str>) -> String {
        match self {
            MutationIntent::CreateRole { role } => {
                format!("CREATE ROLE IF NOT EXISTS {role}")
            }
            MutationIntent::GrantRoles {
                roles,
                grantee,
                replace,
            } => {
                let suffix = if *replace { " WITH REPLACE OPTION" } else { "" };
                format!(
                    "GRANT {}{} to '{}'{}",
                    cluster_clause(cluster),
                    roles.join(", "),
                    escape_literal(grantee),
                    suffix
                )
            }
            MutationIntent::RevokeRoles { role, grantee } => {
                format!(
                    "REVOKE {}{} from '{}'",
                    cluster_clause(cluster),
                    role,
                    escape_literal(grantee)
                )
            }
            MutationIntent::CreateUser { name, password } => {
                format!(
                    "CREATE USER {} IDENTIFIED WITH sha256_password BY '{}'",
                    name,
                    escape_literal(password)
                )
            }
            MutationIntent::DropUser { name } => format!("DROP USER {name}"),
            MutationIntent::GrantPrivileges {
                privileges,
                on,
                grantee,
                replace,
            } => {
                let suffix = if *replace { " WITH REPLACE OPTION" } else { "" };
                format!(
                    "GRANT {}{} on {} to '{}'{}",
                    cluster_clause(cluster),
                    privileges.join(", "),
                    on,
                    escape_literal(grantee),
                    suffix
                )
            }
            MutationIntent::RevokePrivileges {
                privileges,
                on,
                grantee,
            } => {
                format!(
                    "REVOKE {}{} on {} from '{}'",
                    cluster_clause(cluster),
                    privileges.join(", "),
                    on,
                    escape_literal(grantee)
                )
            }
            MutationIntent::AlterQuota { quota, members } => {
                format!("ALTER QUOTA {} to {}", quota, members.join(", "))
            }
            MutationIntent::AlterProfile { user, profile } => {
                format!("ALTER USER {user} SETTINGS PROFILE {profile}")
            }
        }
    }
}

/// Render a batch of intents in emission order.
pub fn render_all(intents: &[MutationIntent], cluster: Option<&str>) -> Vec<String> {
    intents.iter().map(|intent| intent.render(cluster)).collect()
}
