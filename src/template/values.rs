//! Builds the `${...}` template value set for one service within one site,
//! mirroring `template.NewSite` + `template.LoadConfigs` from the original:
//! site- and service-level values are registered first, then each
//! configured database's connection details, then custom template value
//! overrides (site-level winning over service-level), so that a later
//! registration always overrides an earlier one for the same key.
//!
//! Key namespace is grounded in `handlers/template/site.go::GetTemplateValues`:
//! `site.*` for site-wide values, `database.*` for this service's own
//! resolved database identity (plus `database.<kind>.*` for per-backend
//! connection details), and `service.<name>.*` for cross-service peer values.

use super::TemplateValueSource;
use crate::apis::dbconfig_types::{MongoConfigSpec, MysqlConfigSpec, RedisConfigSpec};
use crate::apis::serviceconfig_types::ServiceConfigSpec;
use crate::apis::site_types::{StagingSite, StagingSiteService};
use crate::naming::{make_database_name, make_object_name, make_username};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct SiteTemplateValues {
    values: BTreeMap<String, String>,
}

impl TemplateValueSource for SiteTemplateValues {
    fn template_values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl SiteTemplateValues {
    /// Registers the site- and service-level values available to every
    /// template in this service's manifests.
    pub fn new(site: &StagingSite, service_name: &str, service: &StagingSiteService, config: &ServiceConfigSpec) -> Self {
        let mut values = BTreeMap::new();
        values.insert("site.name".to_owned(), site.metadata.name.clone().unwrap_or_default());
        values.insert("site.domainPrefix".to_owned(), site.spec.domain_prefix.clone());
        values.insert("site.imageTag".to_owned(), service.image_tag.clone());
        values.insert("service.name".to_owned(), service_name.to_owned());
        values.insert("service.shortName".to_owned(), config.short_name.clone());

        // service-level custom values first, site-level overrides win
        for (k, v) in &config.custom_template_values {
            values.insert(format!("site.custom.{k}"), v.clone());
        }
        for (k, v) in &service.custom_template_values {
            values.insert(format!("site.custom.{k}"), v.clone());
        }

        // configmap object names only depend on the site/service/shortName,
        // so they can be registered up front rather than requiring a
        // separate async round trip once the configmap reconciler runs.
        for cm_name in config.config_maps.keys() {
            let object_name = make_object_name(&site.name_any(), &[&config.short_name, cm_name]);
            values.insert(format!("site.configmap.{cm_name}"), object_name);
        }

        Self { values }
    }

    pub fn with_mysql(mut self, config: &MysqlConfigSpec, database_name: &str, username: &str, password: &str) -> Self {
        self.values.insert("database.mysql.host".to_owned(), config.host.clone());
        self.values.insert("database.mysql.port".to_owned(), config.port.to_string());
        self.values.insert("database.name".to_owned(), database_name.to_owned());
        self.values.insert("database.username".to_owned(), username.to_owned());
        self.values.insert("database.password".to_owned(), password.to_owned());
        self
    }

    pub fn with_mongo(mut self, config: &MongoConfigSpec, database_name: &str, username: &str, password: &str) -> Self {
        self.values.insert("database.mongo.host1".to_owned(), config.host1.clone());
        self.values.insert("database.mongo.host2".to_owned(), config.host2.clone());
        self.values.insert("database.mongo.host3".to_owned(), config.host3.clone());
        self.values.insert("database.mongo.port".to_owned(), config.port.to_string());
        self.values.insert("database.name".to_owned(), database_name.to_owned());
        self.values.insert("database.username".to_owned(), username.to_owned());
        self.values.insert("database.password".to_owned(), password.to_owned());
        self
    }

    pub fn with_redis(mut self, config: &RedisConfigSpec, database_number: u32) -> Self {
        let scheme = if config.is_tls_enabled { "rediss" } else { "redis" };
        self.values.insert("database.redis.scheme".to_owned(), scheme.to_owned());
        self.values.insert("database.redis.host".to_owned(), config.host.clone());
        self.values.insert("database.redis.port".to_owned(), config.port.to_string());
        self.values.insert("database.redis.database".to_owned(), database_number.to_string());
        self.values.insert("database.redis.password".to_owned(), config.password.clone());
        self
    }

    pub fn with_extra_envs(mut self, extra_envs: &BTreeMap<String, String>) -> Self {
        for (k, v) in extra_envs {
            self.values.insert(format!("env.{k}"), v.clone());
        }
        self
    }

    /// The environment a db-init job should seed a fresh database from,
    /// e.g. `"master"` by default (`StagingSiteService::db_init_source_environment_name`).
    pub fn with_init_source(mut self, source: &str) -> Self {
        self.values.insert("database.initSource".to_owned(), source.to_owned());
        self
    }

    /// Cross-service values: for every *other* service declared on the site,
    /// exposes its internal cluster URL (`service.<name>.clusterUrl`) and, if
    /// it owns a database, its reserved database name/username/password
    /// (`service.<name>.database.*`), grounded in `site.go::GetTemplateValues`'s
    /// peer-service loop. Per-peer host/port are not repeated here: every
    /// service of a given database kind shares the same environment for the
    /// whole site (see the `first_environment` assumption in
    /// `reconcilers/site.rs`), so a peer's host/port equal the caller's own
    /// already-registered `database.<kind>.*` values.
    pub fn with_peer_services(
        mut self,
        site: &StagingSite,
        configs: &BTreeMap<String, ServiceConfigSpec>,
        namespace: &str,
        exclude_service: &str,
    ) -> Self {
        for (peer_name, peer_config) in configs {
            if peer_name == exclude_service {
                continue;
            }
            let Some(peer_service) = site.spec.services.get(peer_name) else { continue };

            if peer_config.service_spec.is_some() {
                let object_name = make_object_name(&site.name_any(), &[&peer_config.short_name]);
                self.values.insert(
                    format!("service.{peer_name}.clusterUrl"),
                    format!("{object_name}.{namespace}.svc.cluster.local"),
                );
            }

            if !peer_service.mysql_environment.is_empty() || !peer_service.mongo_environment.is_empty() {
                let db_name = make_database_name(&site.spec.db_name, &peer_config.short_name);
                let username = make_username(&site.spec.username, &peer_config.short_name);
                self.values.insert(format!("service.{peer_name}.database.name"), db_name);
                self.values.insert(format!("service.{peer_name}.database.username"), username);
                self.values.insert(format!("service.{peer_name}.database.password"), site.spec.password.clone());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::site_types::StagingSite;
    use std::collections::BTreeMap;

    fn site_with_services(services: Vec<(&str, StagingSiteService)>) -> StagingSite {
        let mut site = StagingSite::new("demo", Default::default());
        site.metadata.name = Some("demo".to_owned());
        site.spec.db_name = "demo_db".to_owned();
        site.spec.username = "demo_user".to_owned();
        site.spec.password = "hunter2".to_owned();
        for (name, binding) in services {
            site.spec.services.insert(name.to_owned(), binding);
        }
        site
    }

    #[test]
    fn site_and_service_keys_use_the_spec_namespace() {
        let service = StagingSiteService { image_tag: "v1".to_owned(), ..Default::default() };
        let site = site_with_services(vec![("web", service.clone())]);
        let config = ServiceConfigSpec { short_name: "web".to_owned(), ..Default::default() };
        let values = SiteTemplateValues::new(&site, "web", &service, &config);
        let map = values.template_values();
        assert_eq!(map.get("site.name").map(String::as_str), Some("demo"));
        assert_eq!(map.get("site.imageTag").map(String::as_str), Some("v1"));
        assert!(!map.contains_key("service.imageTag"));
        assert!(!map.contains_key("mysql.host"));
    }

    #[test]
    fn custom_values_are_namespaced_under_site_custom() {
        let service = StagingSiteService::default();
        let site = site_with_services(vec![("web", service.clone())]);
        let mut config = ServiceConfigSpec { short_name: "web".to_owned(), ..Default::default() };
        config.custom_template_values.insert("feature".to_owned(), "on".to_owned());
        let values = SiteTemplateValues::new(&site, "web", &service, &config);
        assert_eq!(values.template_values().get("site.custom.feature").map(String::as_str), Some("on"));
    }

    #[test]
    fn configmap_object_names_are_registered_up_front() {
        let service = StagingSiteService::default();
        let site = site_with_services(vec![("web", service.clone())]);
        let mut config = ServiceConfigSpec { short_name: "web".to_owned(), ..Default::default() };
        let mut cms = BTreeMap::new();
        cms.insert("app".to_owned(), BTreeMap::new());
        config.config_maps = cms;
        let values = SiteTemplateValues::new(&site, "web", &service, &config);
        assert!(values.template_values().contains_key("site.configmap.app"));
    }

    #[test]
    fn redis_values_include_scheme() {
        let service = StagingSiteService::default();
        let site = site_with_services(vec![("web", service.clone())]);
        let config = ServiceConfigSpec { short_name: "web".to_owned(), ..Default::default() };
        let redis_config = RedisConfigSpec { is_tls_enabled: true, host: "redis.local".to_owned(), port: 6379, ..Default::default() };
        let values = SiteTemplateValues::new(&site, "web", &service, &config).with_redis(&redis_config, 3);
        let map = values.template_values();
        assert_eq!(map.get("database.redis.scheme").map(String::as_str), Some("rediss"));
        assert_eq!(map.get("database.redis.database").map(String::as_str), Some("3"));
    }

    #[test]
    fn peer_services_expose_cluster_url_and_database_identity() {
        let mut web = StagingSiteService::default();
        web.mysql_environment = "prod".to_owned();
        let worker = StagingSiteService::default();
        let site = site_with_services(vec![("web", web.clone()), ("worker", worker.clone())]);

        let mut configs = BTreeMap::new();
        configs.insert(
            "web".to_owned(),
            ServiceConfigSpec {
                short_name: "web".to_owned(),
                service_spec: Some(Default::default()),
                ..Default::default()
            },
        );
        configs.insert("worker".to_owned(), ServiceConfigSpec { short_name: "worker".to_owned(), ..Default::default() });

        let worker_config = configs.get("worker").unwrap().clone();
        let values = SiteTemplateValues::new(&site, "worker", &worker, &worker_config)
            .with_peer_services(&site, &configs, "ns1", "worker");
        let map = values.template_values();
        assert!(map.get("service.web.clusterUrl").unwrap().contains("ns1.svc.cluster.local"));
        assert!(map.contains_key("service.web.database.name"));
        assert!(!map.contains_key("service.worker.clusterUrl"));
    }
}
