//! # chgrants
//!
//! Declarative reconciliation of ClickHouse users, roles, and grants.
//!
//! Given the authorization state a principal *should* hold (roles,
//! privileges, quota and profile memberships) and the state actually
//! observed on a running server, this crate computes and executes the
//! minimal ordered sequence of statements required to converge the two.
//! Reconciliation is idempotent: repeated calls with unchanged input
//! produce no further mutations.
//!
//! ## Architecture
//!
//! - [`gateway::QueryGateway`] - narrow capability trait for statement
//!   execution; connection management lives behind it
//! - [`observe::StateObserver`] - read-only queries over the server's
//!   system tables
//! - [`privilege`] - the closed privilege taxonomy and its validator
//! - [`diff`] - pure diff algorithms turning desired + observed state into
//!   ordered mutation intents
//! - [`statement`] - mutation intents and literal statement rendering
//! - [`reconcile::Reconciler`] - orchestrator dispatching the role,
//!   privilege, and user-lifecycle paths
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chgrants_core::prelude::*;
//!
//! let reconciler = Reconciler::new(Some(gateway))?;
//!
//! let request = GrantsRequest::new("reader")
//!     .with_privileges(["select", "insert"])
//!     .with_databases(["dictionaries"])
//!     .with_tables(["statistics", "clients"]);
//!
//! let outcome = reconciler.reconcile_grants(&request).await?;
//! assert!(outcome.changed);
//! for statement in &outcome.executed {
//!     println!("{statement}");
//! }
//! ```

pub mod diff;
pub mod error;
pub mod gateway;
pub mod observe;
pub mod privilege;
pub mod reconcile;
pub mod statement;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use chgrants_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ReconcileError, ReconcileResult};
    pub use crate::gateway::{QueryGateway, Row, ServerError, Value};
    pub use crate::observe::{
        ProfileObservation, QuotaObservation, RoleObservation, StateObserver,
    };
    pub use crate::privilege::PrivilegeScope;
    pub use crate::reconcile::Reconciler;
    pub use crate::statement::MutationIntent;
    pub use crate::types::{
        GrantsRequest, Reconciliation, ScopeTarget, StateSnapshot, UserRequest, UserState,
    };
}

// Re-export async_trait for gateway implementors
pub use async_trait::async_trait;
