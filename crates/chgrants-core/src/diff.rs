//! Diff engine.
//!
//! Two independent reconciliation algorithms over desired vs. observed
//! state, selected by the orchestrator and never combined in one call. Both
//! are pure functions of their inputs; the order of emitted intents is
//! deterministic and preserved through rendering and execution.

use crate::observe::RoleObservation;
use crate::statement::MutationIntent;
use crate::types::ScopeTarget;

/// Mode flags for the role-assignment diff.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleDiffOptions {
    /// Revoke the desired roles instead of granting them.
    pub revoke: bool,
    /// Make the held role set equal exactly the desired set.
    pub replace: bool,
    /// Create desired roles that are not yet held.
    pub create_missing: bool,
}

/// Compute the mutations needed to converge a principal's role grants.
///
/// Revoking a role that is not held is an idempotent no-op, not an error.
/// Replace is unconditional: "make the held set equal the desired set" is
/// observably different from the current state whenever any other role is
/// held, which is not locally checkable from the observation alone.
pub fn roles(
    grantee: &str,
    desired: &[String],
    observed: &RoleObservation,
    options: &RoleDiffOptions,
) -> Vec<MutationIntent> {
    if options.revoke {
        return desired
            .iter()
            .filter(|role| observed.held.contains(role))
            .map(|role| MutationIntent::RevokeRoles {
                role: role.clone(),
                grantee: grantee.to_string(),
            })
            .collect();
    }

    let mut intents = Vec::new();

    if options.create_missing && !observed.has_all {
        for role in desired {
            if !observed.held.contains(role) {
                intents.push(MutationIntent::CreateRole { role: role.clone() });
            }
        }
    }

    if options.replace {
        intents.push(MutationIntent::GrantRoles {
            roles: desired.to_vec(),
            grantee: grantee.to_string(),
            replace: true,
        });
    } else if !observed.has_all {
        intents.push(MutationIntent::GrantRoles {
            roles: desired.to_vec(),
            grantee: grantee.to_string(),
            replace: false,
        });
    }

    intents
}

/// Mode flags for the privilege-grant diff.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegeDiffOptions {
    /// Revoke the privileges instead of granting them.
    pub revoke: bool,
    /// Make the privilege set at the first scope target equal exactly the
    /// desired set.
    pub replace: bool,
}

/// Compute the mutations needed to converge privilege grants over an
/// ordered scope target list.
///
/// The privilege set must already be validated. Revokes are emitted
/// unconditionally for every target (revoking non-existent privileges is a
/// server-side no-op). The replace qualifier attaches to the first emitted
/// statement only; attaching it to every statement would make later
/// statements re-wipe earlier ones.
pub fn privileges(
    grantee: &str,
    privileges: &[String],
    targets: &[ScopeTarget],
    options: &PrivilegeDiffOptions,
) -> Vec<MutationIntent> {
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            if options.revoke {
                MutationIntent::RevokePrivileges {
                    privileges: privileges.to_vec(),
                    on: target.clone(),
                    grantee: grantee.to_string(),
                }
            } else {
                MutationIntent::GrantPrivileges {
                    privileges: privileges.to_vec(),
                    on: target.clone(),
                    grantee: grantee.to_string(),
                    replace: options.replace && index == 0,
                }
            }
        })
        .collect()
}
