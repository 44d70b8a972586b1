//! Redis tenant driver, grounded in `handlers/task/redis_handler.go`.
//!
//! Redis has no concept of a per-tenant user: a "database" here is just one
//! of the server's numbered logical databases (`SELECT n`). There is no
//! `CREATE USER`/`GRANT` step to perform, so this driver's only real job is
//! connecting to a given numbered database and clearing it on delete; slot
//! *assignment* (picking which number a tenant gets) lives in
//! [`crate::slot_allocator`], which scans claimed `RedisDatabase` objects
//! only and never talks to the server.

use super::{DatabaseDriver, DatabaseIdentity};
use crate::apis::dbconfig_types::RedisConfigSpec;
use async_trait::async_trait;

pub struct RedisDriver {
    client: redis::Client,
}

impl RedisDriver {
    pub fn connect(config: &RedisConfigSpec) -> crate::Result<Self> {
        let scheme = if config.is_tls_enabled { "rediss" } else { "redis" };
        let url = if config.password.is_empty() {
            format!("{scheme}://{}:{}", config.host, config.port)
        } else {
            format!("{scheme}://:{}@{}:{}", config.password, config.host, config.port)
        };
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }

    pub async fn flush_database(&self, database_number: u32) -> crate::Result<()> {
        let mut conn = self.client.get_async_connection().await?;
        redis::cmd("SELECT").arg(database_number).query_async(&mut conn).await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl DatabaseDriver for RedisDriver {
    /// Redis tenancy has no user/permission step: provisioning a slot is
    /// just selecting it and issuing `FLUSHDB`, matching the original's
    /// `redis_handler.go::reconcile`. The caller (the Redis task reconciler)
    /// is responsible for the idempotency the spec calls for — it only
    /// invokes this once per newly-assigned slot, not on every tick a
    /// `RedisDatabase` is already `Complete`, since re-flushing live tenant
    /// data on every reconcile would defeat the point of provisioning it.
    async fn reconcile(&self, identity: &DatabaseIdentity) -> crate::Result<bool> {
        let database_number: u32 = identity.database.parse().unwrap_or(0);
        self.flush_database(database_number).await?;
        Ok(true)
    }

    async fn delete(&self, identity: &DatabaseIdentity) -> crate::Result<()> {
        let database_number: u32 = identity.database.parse().unwrap_or(0);
        self.flush_database(database_number).await
    }
}
