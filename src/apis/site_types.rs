use crate::defaults;
use chrono::{DateTime, Duration, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `StagingSite` describes one ephemeral per-branch environment: the set
/// of services it runs and the databases/networking/workloads the operator
/// must provision for them.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "StagingSite", group = "site.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(status = "StagingSiteStatus", shortname = "site")]
#[kube(printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#)]
#[kube(printcolumn = r#"{"name":"Enabled", "type":"boolean", "jsonPath":".spec.enabled"}"#)]
#[serde(rename_all = "camelCase")]
pub struct StagingSiteSpec {
    #[serde(default)]
    pub domain_prefix: String,
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "defaults::default_enabled")]
    pub enabled: bool,
    #[serde(default = "defaults::default_disable_after")]
    pub disable_after: TimeInterval,
    #[serde(default = "defaults::default_delete_after")]
    pub delete_after: TimeInterval,
    #[serde(default)]
    pub backup_before_delete: bool,
    #[serde(default)]
    pub daily_backup_window_hour: Option<i32>,
    #[serde(default)]
    pub services: BTreeMap<String, StagingSiteService>,
    #[serde(default)]
    pub include_all_services: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StagingSiteService {
    #[serde(default = "defaults::default_image_tag")]
    pub image_tag: String,
    #[serde(default = "defaults::default_replicas")]
    pub replicas: i32,
    #[serde(default)]
    pub resource_overrides: BTreeMap<String, k8s_openapi::api::core::v1::ResourceRequirements>,
    #[serde(default)]
    pub mysql_environment: String,
    #[serde(default)]
    pub mongo_environment: String,
    #[serde(default)]
    pub redis_environment: String,
    #[serde(default)]
    pub include_in_backups: bool,
    #[serde(rename = "dumpSourceEnvironmentName", default)]
    pub db_init_source_environment_name: String,
    #[serde(default)]
    pub extra_envs: BTreeMap<String, String>,
    #[serde(default)]
    pub custom_template_values: BTreeMap<String, String>,
}

/// Additive time span used for the disable/delete idle timers: all
/// components are summed, so 1 day + 25 hours + 90 minutes == 2 days 2
/// hours 30 minutes.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub struct TimeInterval {
    #[serde(default)]
    pub never: bool,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
}

impl TimeInterval {
    pub fn duration(&self) -> Option<Duration> {
        if self.never {
            return None;
        }
        Some(Duration::days(self.days) + Duration::hours(self.hours) + Duration::minutes(self.minutes))
    }

    pub fn deadline_from(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| from + d)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StagingSiteStatus {
    #[serde(default)]
    pub database_creation_complete: bool,
    #[serde(default)]
    pub database_initialisation_complete: bool,
    #[serde(default)]
    pub database_migrations_complete: bool,
    #[serde(default)]
    pub configs_are_created: bool,
    #[serde(default)]
    pub networking_objects_are_created: bool,
    #[serde(default)]
    pub workloads_are_created: bool,
    #[serde(default)]
    pub last_applied_configuration: Option<Time>,
    /// `.metadata.generation` last observed by the orchestrator; a mismatch
    /// means the spec changed since the last reconcile, which clears a
    /// latched `Failed` state back to `Pending`.
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub disable_at: Option<Time>,
    #[serde(default)]
    pub delete_at: Option<Time>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub state: StagingSiteState,
    #[serde(default)]
    pub workload_health: WorkloadHealth,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub services: BTreeMap<String, StagingSiteServiceStatus>,
    #[serde(default)]
    pub last_backup_time: Option<Time>,
    #[serde(default)]
    pub next_backup_time: Option<Time>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StagingSiteServiceStatus {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub redis_database_number: u32,
    #[serde(default)]
    pub deployment_status: Option<k8s_openapi::api::apps::v1::DeploymentStatus>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub enum StagingSiteState {
    #[default]
    Pending,
    Complete,
    Failed,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
pub enum WorkloadHealth {
    #[default]
    Incomplete,
    Healthy,
    Unhealthy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_interval_components_are_additive() {
        let interval = TimeInterval { never: false, days: 1, hours: 25, minutes: 90 };
        assert_eq!(interval.duration().unwrap(), Duration::days(2) + Duration::hours(2) + Duration::minutes(30));
    }

    #[test]
    fn never_interval_has_no_deadline() {
        let interval = TimeInterval { never: true, days: 7, hours: 0, minutes: 0 };
        assert!(interval.duration().is_none());
        assert!(interval.deadline_from(Utc::now()).is_none());
    }
}
