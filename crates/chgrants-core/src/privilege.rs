//! Privilege taxonomy and validation.
//!
//! The set of grantable privileges is closed and partitioned into three scope
//! levels. Requested names are matched case-insensitively (uppercased) with
//! one exception: the dictionary-lookup privilege `dictGet`, which ClickHouse
//! spells mixed-case and which must be supplied verbatim.

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};

/// Privileges with no object scope.
pub const SYSTEM_PRIVILEGES: &[&str] = &[
    "CREATE FUNCTION",
    "DROP FUNCTION",
    "RELOAD DICTIONARY",
    "KILL QUERY",
    "MYSQL",
    "CLUSTER",
];

/// Privileges scoped to a database.
pub const DATABASE_PRIVILEGES: &[&str] = &["CREATE DATABASE", "DROP DATABASE"];

/// Privileges scoped to a database and table.
pub const TABLE_PRIVILEGES: &[&str] = &[
    "ALL",
    "SELECT",
    "SHOW",
    "dictGet",
    "INSERT",
    "UPDATE",
    "DELETE",
    "ALTER",
    "ALTER TABLE",
    "ALTER COLUMN",
    "ALTER CONSTRAINT",
    "ALTER INDEX",
    "ALTER VIEW",
    "ALTER TTL",
    "CREATE",
    "CREATE TABLE",
    "CREATE VIEW",
    "CREATE DICTIONARY",
    "DROP",
    "DROP TABLE",
    "DROP VIEW",
    "DROP DICTIONARY",
    "TRUNCATE",
    "OPTIMIZE",
];

/// Scope level a privilege applies at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeScope {
    /// No object scope.
    System,
    /// Scoped to a database.
    Database,
    /// Scoped to a database and table (wildcard table supported).
    Table,
}

impl PrivilegeScope {
    /// Get the scope identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeScope::System => "system",
            PrivilegeScope::Database => "database",
            PrivilegeScope::Table => "table",
        }
    }
}

/// Canonical form of a requested privilege name: uppercased, except the
/// mixed-case `dictGet` which is preserved verbatim.
pub fn canonicalize(name: &str) -> String {
    if name == "dictGet" {
        name.to_string()
    } else {
        name.to_uppercase()
    }
}

/// Resolve the scope level of a requested privilege name.
///
/// Returns `None` for names outside the taxonomy. Every known name resolves
/// to exactly one level.
pub fn scope_of(name: &str) -> Option<PrivilegeScope> {
    let canonical = canonicalize(name);
    if SYSTEM_PRIVILEGES.contains(&canonical.as_str()) {
        Some(PrivilegeScope::System)
    } else if DATABASE_PRIVILEGES.contains(&canonical.as_str()) {
        Some(PrivilegeScope::Database)
    } else if TABLE_PRIVILEGES.contains(&canonical.as_str()) {
        Some(PrivilegeScope::Table)
    } else {
        None
    }
}

/// The full allowed set, in taxonomy order.
pub fn allowed_privileges() -> Vec<&'static str> {
    SYSTEM_PRIVILEGES
        .iter()
        .chain(DATABASE_PRIVILEGES)
        .chain(TABLE_PRIVILEGES)
        .copied()
        .collect()
}

/// Validate a requested privilege set against the taxonomy.
///
/// All-or-nothing: fails on the first unknown name so the error is
/// deterministic, and performs no partial validation. No side effects.
pub fn validate(requested: &[String]) -> ReconcileResult<()> {
    for name in requested {
        if scope_of(name).is_none() {
            return Err(ReconcileError::UnsupportedPrivilege {
                privilege: canonicalize(name),
                allowed: allowed_privileges(),
            });
        }
    }
    Ok(())
}
