//! Per-backend database drivers. Each reconciles one tenant's user/database
//! against a shared server, grounded in `handlers/database/*_handler.go`.

pub mod mongo;
pub mod mysql;
pub mod redis;

use async_trait::async_trait;

/// One tenant's desired database identity: the user and database name a
/// service connects with inside a shared server environment.
#[derive(Debug, Clone)]
pub struct DatabaseIdentity {
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Common shape of the three database drivers (added: the Go original
/// duplicates this as three free-function pairs; naming it lets the task
/// reconcilers in [`crate::reconcilers::task`] stay generic over driver
/// kind).
#[async_trait]
pub trait DatabaseDriver {
    /// Ensures the tenant's user and database exist with the desired
    /// permissions. Returns whether anything changed.
    async fn reconcile(&self, identity: &DatabaseIdentity) -> crate::Result<bool>;

    /// Drops the tenant's database and removes its user.
    async fn delete(&self, identity: &DatabaseIdentity) -> crate::Result<()>;
}
