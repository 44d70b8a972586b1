use k8s_openapi::api::core::v1::{PodSpec, ServiceSpec};
use k8s_openapi::api::networking::v1::IngressSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reusable service definition: the deployment/init/migration/backup pod
/// templates, networking specs, and configmap contents for one named
/// service, shared by every `StagingSite` that enables it.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(
    kind = "ServiceConfig",
    group = "config.operator.kube-stager.io",
    version = "v1",
    namespaced
)]
#[kube(printcolumn = r#"{"name":"Short-Name", "type":"string", "jsonPath":".spec.shortName"}"#)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfigSpec {
    pub short_name: String,
    #[serde(default)]
    pub config_maps: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub custom_template_values: BTreeMap<String, String>,
    pub deployment_pod_spec: PodSpec,
    #[serde(default)]
    pub db_init_pod_spec: Option<PodSpec>,
    #[serde(default)]
    pub migration_job_pod_spec: Option<PodSpec>,
    #[serde(default)]
    pub backup_pod_spec: Option<PodSpec>,
    #[serde(default)]
    pub service_spec: Option<ServiceSpec>,
    #[serde(default)]
    pub ingress_spec: Option<IngressSpec>,
    #[serde(default)]
    pub ingress_annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub default_mongo_environment: String,
    #[serde(default)]
    pub default_mysql_environment: String,
    #[serde(default)]
    pub default_redis_environment: String,
}
