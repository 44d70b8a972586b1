use crate::apis::task_types::JobState;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Drives one batch `Job` that seeds a freshly created database from a
/// source environment's data.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "DbInitJob", group = "job.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "DbInitJobStatus")]
#[kube(printcolumn = r#"{"name":"Site", "type":"string", "jsonPath":".spec.siteName"}"#)]
#[kube(printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#)]
#[serde(rename_all = "camelCase")]
pub struct DbInitJobSpec {
    pub site_name: String,
    pub service_name: String,
    #[serde(default)]
    pub mysql_environment: String,
    #[serde(default)]
    pub mongo_environment: String,
    pub db_init_source: String,
    pub database_name: String,
    pub username: String,
    pub password: String,
    pub deadline_seconds: i64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbInitJobStatus {
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub job_not_found_count: u32,
    #[serde(default)]
    pub deadline_timestamp: Option<Time>,
}

/// Drives one batch `Job` that runs the service's schema/data migrations
/// against its already-initialised database.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "DbMigrationJob", group = "job.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "DbMigrationJobStatus")]
#[kube(printcolumn = r#"{"name":"Site", "type":"string", "jsonPath":".spec.siteName"}"#)]
#[kube(printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#)]
#[serde(rename_all = "camelCase")]
pub struct DbMigrationJobSpec {
    pub site_name: String,
    pub service_name: String,
    pub image_tag: String,
    pub deadline_seconds: i64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbMigrationJobStatus {
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub job_not_found_count: u32,
    #[serde(default)]
    pub last_migrated_image_tag: String,
    #[serde(default)]
    pub deadline_timestamp: Option<Time>,
}

/// Aggregates one batch `Job` per backup-enabled service into a whole-site
/// backup run.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "Backup", group = "job.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "BackupStatus")]
#[kube(printcolumn = r#"{"name":"Site", "type":"string", "jsonPath":".spec.siteName"}"#)]
#[kube(printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.backupType"}"#)]
#[kube(printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#)]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    pub site_name: String,
    #[serde(default)]
    pub backup_type: BackupType,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub enum BackupType {
    #[default]
    Manual,
    Scheduled,
    Final,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    #[serde(flatten)]
    pub detail: BackupStatusDetail,
    #[serde(default)]
    pub services: BTreeMap<String, BackupStatusDetail>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatusDetail {
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub job_started_at: Option<Time>,
    #[serde(default)]
    pub job_finished_at: Option<Time>,
}
