use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shared state machine for database reservations and batch jobs: absorbing
/// terminal states once `Complete` or `Failed` is reached.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Complete,
    Failed,
}

impl JobState {
    pub fn is_final(&self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }
}

/// Identifies which site/service/environment a per-tenant database
/// reservation belongs to; carried as labels so list-by-environment queries
/// (e.g. the Redis slot allocator) don't need to read every reservation's
/// spec.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub site_name: String,
    pub service_name: String,
    pub environment: String,
}

/// A per-tenant MySQL database + user reserved for one service in one site.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "MysqlDatabase", group = "task.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "MysqlDatabaseStatus")]
#[serde(rename_all = "camelCase")]
pub struct MysqlDatabaseSpec {
    pub environment_config: EnvironmentConfig,
    pub database_name: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
pub struct MysqlDatabaseStatus {
    #[serde(default)]
    pub state: JobState,
}

/// A per-tenant MongoDB database + user reserved for one service in one site.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "MongoDatabase", group = "task.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "MongoDatabaseStatus")]
#[serde(rename_all = "camelCase")]
pub struct MongoDatabaseSpec {
    pub environment_config: EnvironmentConfig,
    pub database_name: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
pub struct MongoDatabaseStatus {
    #[serde(default)]
    pub state: JobState,
}

/// A reserved numeric Redis database slot for one service in one site.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "RedisDatabase", group = "task.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "RedisDatabaseStatus")]
#[serde(rename_all = "camelCase")]
pub struct RedisDatabaseSpec {
    pub environment_config: EnvironmentConfig,
    pub database_number: u32,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
pub struct RedisDatabaseStatus {
    #[serde(default)]
    pub state: JobState,
}

impl MysqlDatabaseSpec {
    /// Whether `self` (the desired spec) matches an existing object's spec,
    /// ignoring fields the reconciler is allowed to leave stale (none, for
    /// mysql: username/password/database-name all matter).
    pub fn matches(&self, existing: &MysqlDatabaseSpec) -> bool {
        self == existing
    }
}

impl MongoDatabaseSpec {
    pub fn matches(&self, existing: &MongoDatabaseSpec) -> bool {
        self == existing
    }
}

impl RedisDatabaseSpec {
    /// Redis reservations match on environment alone: the slot number is
    /// reassigned by the allocator, not compared, so a site moving between
    /// environments is detected without flapping on its own assigned slot.
    pub fn matches(&self, existing: &RedisDatabaseSpec) -> bool {
        self.environment_config == existing.environment_config
    }
}
