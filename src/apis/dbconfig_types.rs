use crate::defaults;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Connection details for a shared MySQL server environment (e.g. "master").
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "MysqlConfig", group = "config.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(printcolumn = r#"{"name":"Host", "type":"string", "jsonPath":".spec.host"}"#)]
#[serde(rename_all = "camelCase")]
pub struct MysqlConfigSpec {
    pub host: String,
    #[serde(default)]
    pub username: String,
    pub password: String,
    #[serde(default = "defaults::default_mysql_port")]
    pub port: u16,
}

/// Connection details for a shared MongoDB replica set environment.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "MongoConfig", group = "config.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(printcolumn = r#"{"name":"Host1", "type":"string", "jsonPath":".spec.host1"}"#)]
#[serde(rename_all = "camelCase")]
pub struct MongoConfigSpec {
    pub host1: String,
    #[serde(default)]
    pub host2: String,
    #[serde(default)]
    pub host3: String,
    #[serde(default)]
    pub username: String,
    pub password: String,
    #[serde(default = "defaults::default_mongo_port")]
    pub port: u16,
}

/// Connection details and slot capacity for a shared Redis server
/// environment; each `RedisDatabase` reserves one numeric database index.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(kind = "RedisConfig", group = "config.operator.kube-stager.io", version = "v1", namespaced)]
#[kube(printcolumn = r#"{"name":"Host", "type":"string", "jsonPath":".spec.host"}"#)]
#[serde(rename_all = "camelCase")]
pub struct RedisConfigSpec {
    pub host: String,
    #[serde(default = "defaults::default_redis_available_database_count")]
    pub available_database_count: u32,
    #[serde(default = "defaults::default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub is_tls_enabled: bool,
    #[serde(default = "defaults::default_true")]
    pub verify_tls_server_certificate: bool,
    #[serde(default)]
    pub password: String,
}
