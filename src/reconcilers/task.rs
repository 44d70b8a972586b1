//! Per-DB-kind task reconcilers, grounded in
//! `handlers/task/handler_interface.go`. Unlike the job reconcilers in
//! [`crate::reconcilers::job`], a database task is not a multi-phase batch
//! `Job` with a deadline: the handler provisions the user/database
//! synchronously against the shared server and records the result on a
//! child `*Database` object owned by the site, matching
//! `mysql_handler.go`/`mongo_handler.go`/`redis_handler.go`'s synchronous
//! `Reconcile` calls.

use crate::apis::serviceconfig_types::ServiceConfigSpec;
use crate::apis::site_types::StagingSite;
use crate::apis::task_types::{
    EnvironmentConfig, JobState, MongoDatabaseSpec, MongoDatabaseStatus, MysqlDatabaseSpec, MysqlDatabaseStatus,
    RedisDatabaseSpec, RedisDatabaseStatus,
};
use crate::drivers::{mongo::MongoDriver, mysql::MysqlDriver, redis::RedisDriver, DatabaseDriver, DatabaseIdentity};
use crate::errors::{ControllerError, DatabaseType};
use crate::labels;
use crate::naming::{make_database_name, make_object_name, make_username};
use crate::slot_allocator;
use async_trait::async_trait;
use kube::api::{Api, ListParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;

/// Common shape of the three database task reconcilers: diff the site's
/// declared services against existing child `*Database` objects and
/// provision/tear down the gap.
#[async_trait]
pub trait TaskHandler {
    /// Reconciles every service in `site` that requests this kind of
    /// database: creates or updates the owned child object and provisions
    /// the backing server. Returns once every declared service's database
    /// is in a final state. A service with no matching `ServiceConfig` is
    /// skipped, grounded in `PopulateFomSite`'s "no service config provided"
    /// precondition.
    async fn ensure_databases_are_created(
        &self,
        client: Client,
        site: &StagingSite,
        configs: &BTreeMap<String, ServiceConfigSpec>,
    ) -> crate::Result<bool>;

    /// Removes every child `*Database` object for `site` (deleting its
    /// backing user/database as well), used by the finalizer cleanup path.
    async fn delete_databases(&self, client: Client, site: &StagingSite) -> crate::Result<()>;
}

fn owner_ref(site: &StagingSite) -> k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
    site.controller_owner_ref(&()).expect("StagingSite is namespaced, has a uid")
}

fn child_labels(site: &StagingSite, service_name: &str, environment: &str, env_label: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(labels::SITE.to_owned(), site.name_any());
    labels.insert(labels::SERVICE.to_owned(), service_name.to_owned());
    labels.insert(env_label.to_owned(), environment.to_owned());
    labels
}

pub struct MysqlTaskHandler {
    pub driver: MysqlDriver,
}

#[async_trait]
impl TaskHandler for MysqlTaskHandler {
    async fn ensure_databases_are_created(
        &self,
        client: Client,
        site: &StagingSite,
        configs: &BTreeMap<String, ServiceConfigSpec>,
    ) -> crate::Result<bool> {
        let ns = site.namespace().unwrap_or_default();
        let api: Api<crate::apis::task_types::MysqlDatabase> = Api::namespaced(client, &ns);
        let mut all_ready = true;

        for (service_name, service) in &site.spec.services {
            if service.mysql_environment.is_empty() {
                continue;
            }
            let Some(config) = configs.get(service_name) else { continue };
            let object_name = make_object_name(&site.name_any(), &[&config.short_name, "mysql"]);
            let spec = MysqlDatabaseSpec {
                environment_config: EnvironmentConfig {
                    site_name: site.name_any(),
                    service_name: service_name.clone(),
                    environment: service.mysql_environment.clone(),
                },
                database_name: make_database_name(&site.spec.db_name, &config.short_name),
                username: make_username(&site.spec.username, &config.short_name),
                password: site.spec.password.clone(),
            };

            let identity = DatabaseIdentity {
                username: spec.username.clone(),
                password: spec.password.clone(),
                database: spec.database_name.clone(),
            };
            self.driver.reconcile(&identity).await.map_err(|e| {
                ControllerError::DatabaseCreationError {
                    database_type: DatabaseType::Mysql,
                    site: site.name_any(),
                    service: service_name.clone(),
                    environment: service.mysql_environment.clone(),
                    reason: Some(e.to_string()),
                }
            })?;

            let object = crate::apis::task_types::MysqlDatabase {
                metadata: ObjectMeta {
                    name: Some(object_name.clone()),
                    namespace: Some(ns.clone()),
                    labels: Some(child_labels(site, service_name, &service.mysql_environment, labels::MYSQL_ENVIRONMENT)),
                    owner_references: Some(vec![owner_ref(site)]),
                    ..Default::default()
                },
                spec,
                status: Some(MysqlDatabaseStatus { state: JobState::Complete }),
            };

            upsert(&api, &object_name, object).await?;
        }

        // any existing child whose service was removed from the site is torn down
        let keep: Vec<String> = site
            .spec
            .services
            .iter()
            .filter(|(name, s)| !s.mysql_environment.is_empty() && configs.contains_key(*name))
            .map(|(name, _)| make_object_name(&site.name_any(), &[&configs[name].short_name, "mysql"]))
            .collect();
        let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
        for existing in api.list(&list_params).await?.items {
            let name = existing.name_any();
            if !keep.contains(&name) {
                let identity = DatabaseIdentity {
                    username: existing.spec.username.clone(),
                    password: String::new(),
                    database: existing.spec.database_name.clone(),
                };
                self.driver.delete(&identity).await?;
                api.delete(&name, &Default::default()).await?;
            } else if !matches!(existing.status.map(|s| s.state), Some(JobState::Complete)) {
                all_ready = false;
            }
        }

        Ok(all_ready)
    }

    async fn delete_databases(&self, client: Client, site: &StagingSite) -> crate::Result<()> {
        let ns = site.namespace().unwrap_or_default();
        let api: Api<crate::apis::task_types::MysqlDatabase> = Api::namespaced(client, &ns);
        let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
        for existing in api.list(&list_params).await?.items {
            let identity = DatabaseIdentity {
                username: existing.spec.username.clone(),
                password: String::new(),
                database: existing.spec.database_name.clone(),
            };
            self.driver.delete(&identity).await?;
            api.delete(&existing.name_any(), &Default::default()).await?;
        }
        Ok(())
    }
}

pub struct MongoTaskHandler {
    pub driver: MongoDriver,
}

#[async_trait]
impl TaskHandler for MongoTaskHandler {
    async fn ensure_databases_are_created(
        &self,
        client: Client,
        site: &StagingSite,
        configs: &BTreeMap<String, ServiceConfigSpec>,
    ) -> crate::Result<bool> {
        let ns = site.namespace().unwrap_or_default();
        let api: Api<crate::apis::task_types::MongoDatabase> = Api::namespaced(client, &ns);
        let mut all_ready = true;

        for (service_name, service) in &site.spec.services {
            if service.mongo_environment.is_empty() {
                continue;
            }
            let Some(config) = configs.get(service_name) else { continue };
            let object_name = make_object_name(&site.name_any(), &[&config.short_name, "mongo"]);
            let spec = MongoDatabaseSpec {
                environment_config: EnvironmentConfig {
                    site_name: site.name_any(),
                    service_name: service_name.clone(),
                    environment: service.mongo_environment.clone(),
                },
                database_name: make_database_name(&site.spec.db_name, &config.short_name),
                username: make_username(&site.spec.username, &config.short_name),
                password: site.spec.password.clone(),
            };

            let identity = DatabaseIdentity {
                username: spec.username.clone(),
                password: spec.password.clone(),
                database: spec.database_name.clone(),
            };
            self.driver.reconcile(&identity).await.map_err(|e| ControllerError::DatabaseCreationError {
                database_type: DatabaseType::Mongo,
                site: site.name_any(),
                service: service_name.clone(),
                environment: service.mongo_environment.clone(),
                reason: Some(e.to_string()),
            })?;

            let object = crate::apis::task_types::MongoDatabase {
                metadata: ObjectMeta {
                    name: Some(object_name.clone()),
                    namespace: Some(ns.clone()),
                    labels: Some(child_labels(site, service_name, &service.mongo_environment, labels::MONGO_ENVIRONMENT)),
                    owner_references: Some(vec![owner_ref(site)]),
                    ..Default::default()
                },
                spec,
                status: Some(MongoDatabaseStatus { state: JobState::Complete }),
            };
            upsert(&api, &object_name, object).await?;
        }

        let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
        let keep: Vec<String> = site
            .spec
            .services
            .iter()
            .filter(|(name, s)| !s.mongo_environment.is_empty() && configs.contains_key(*name))
            .map(|(name, _)| make_object_name(&site.name_any(), &[&configs[name].short_name, "mongo"]))
            .collect();
        for existing in api.list(&list_params).await?.items {
            let name = existing.name_any();
            if !keep.contains(&name) {
                let identity = DatabaseIdentity {
                    username: existing.spec.username.clone(),
                    password: String::new(),
                    database: existing.spec.database_name.clone(),
                };
                self.driver.delete(&identity).await?;
                api.delete(&name, &Default::default()).await?;
            } else if !matches!(existing.status.map(|s| s.state), Some(JobState::Complete)) {
                all_ready = false;
            }
        }

        Ok(all_ready)
    }

    async fn delete_databases(&self, client: Client, site: &StagingSite) -> crate::Result<()> {
        let ns = site.namespace().unwrap_or_default();
        let api: Api<crate::apis::task_types::MongoDatabase> = Api::namespaced(client, &ns);
        let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
        for existing in api.list(&list_params).await?.items {
            let identity = DatabaseIdentity {
                username: existing.spec.username.clone(),
                password: String::new(),
                database: existing.spec.database_name.clone(),
            };
            self.driver.delete(&identity).await?;
            api.delete(&existing.name_any(), &Default::default()).await?;
        }
        Ok(())
    }
}

/// The one task handler whose behavior differs from its siblings: slot
/// numbers come from [`slot_allocator`], not the site's spec.
pub struct RedisTaskHandler {
    pub driver: RedisDriver,
    pub config: crate::apis::dbconfig_types::RedisConfigSpec,
}

#[async_trait]
impl TaskHandler for RedisTaskHandler {
    async fn ensure_databases_are_created(
        &self,
        client: Client,
        site: &StagingSite,
        configs: &BTreeMap<String, ServiceConfigSpec>,
    ) -> crate::Result<bool> {
        let ns = site.namespace().unwrap_or_default();
        let api: Api<crate::apis::task_types::RedisDatabase> = Api::namespaced(client, &ns);
        let mut all_ready = true;

        for (service_name, service) in &site.spec.services {
            if service.redis_environment.is_empty() {
                continue;
            }
            let Some(config) = configs.get(service_name) else { continue };
            let object_name = make_object_name(&site.name_any(), &[&config.short_name, "redis"]);
            let environment_config = EnvironmentConfig {
                site_name: site.name_any(),
                service_name: service_name.clone(),
                environment: service.redis_environment.clone(),
            };

            let existing = match api.get(&object_name).await {
                Ok(existing) => Some(existing),
                Err(kube::Error::Api(e)) if e.code == 404 => None,
                Err(e) => return Err(e.into()),
            };
            let already_matches = existing.as_ref().map(|e| {
                e.spec.matches(&RedisDatabaseSpec {
                    environment_config: environment_config.clone(),
                    database_number: e.spec.database_number,
                })
            }).unwrap_or(false);
            let already_complete =
                already_matches && matches!(existing.as_ref().and_then(|e| e.status.as_ref()).map(|s| &s.state), Some(JobState::Complete));

            let database_number = if already_matches {
                existing.as_ref().unwrap().spec.database_number
            } else {
                let list_params =
                    ListParams::default().labels(&format!("{}={}", labels::REDIS_ENVIRONMENT, service.redis_environment));
                let siblings: Vec<RedisDatabaseSpec> =
                    api.list(&list_params).await?.items.into_iter().map(|o| o.spec).collect();
                slot_allocator::first_free_database(&self.config, &siblings).map_err(|e| {
                    ControllerError::DatabaseCreationError {
                        database_type: DatabaseType::Redis,
                        site: site.name_any(),
                        service: service_name.clone(),
                        environment: service.redis_environment.clone(),
                        reason: Some(e.to_string()),
                    }
                })?
            };

            // idempotent: a slot already assigned and marked Complete is not re-flushed on every tick
            if !already_complete {
                let identity = DatabaseIdentity {
                    username: String::new(),
                    password: String::new(),
                    database: database_number.to_string(),
                };
                self.driver.reconcile(&identity).await.map_err(|e| ControllerError::DatabaseCreationError {
                    database_type: DatabaseType::Redis,
                    site: site.name_any(),
                    service: service_name.clone(),
                    environment: service.redis_environment.clone(),
                    reason: Some(e.to_string()),
                })?;
            }

            let object = crate::apis::task_types::RedisDatabase {
                metadata: ObjectMeta {
                    name: Some(object_name.clone()),
                    namespace: Some(ns.clone()),
                    labels: Some(child_labels(site, service_name, &service.redis_environment, labels::REDIS_ENVIRONMENT)),
                    owner_references: Some(vec![owner_ref(site)]),
                    ..Default::default()
                },
                spec: RedisDatabaseSpec { environment_config, database_number },
                status: Some(RedisDatabaseStatus { state: JobState::Complete }),
            };
            upsert(&api, &object_name, object).await?;
        }

        let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
        let keep: Vec<String> = site
            .spec
            .services
            .iter()
            .filter(|(name, s)| !s.redis_environment.is_empty() && configs.contains_key(*name))
            .map(|(name, _)| make_object_name(&site.name_any(), &[&configs[name].short_name, "redis"]))
            .collect();
        for existing in api.list(&list_params).await?.items {
            let name = existing.name_any();
            if !keep.contains(&name) {
                let identity = DatabaseIdentity {
                    username: String::new(),
                    password: String::new(),
                    database: existing.spec.database_number.to_string(),
                };
                self.driver.delete(&identity).await?;
                api.delete(&name, &Default::default()).await?;
            } else if !matches!(existing.status.map(|s| s.state), Some(JobState::Complete)) {
                all_ready = false;
            }
        }

        Ok(all_ready)
    }

    async fn delete_databases(&self, client: Client, site: &StagingSite) -> crate::Result<()> {
        let ns = site.namespace().unwrap_or_default();
        let api: Api<crate::apis::task_types::RedisDatabase> = Api::namespaced(client, &ns);
        let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
        for existing in api.list(&list_params).await?.items {
            let identity = DatabaseIdentity {
                username: String::new(),
                password: String::new(),
                database: existing.spec.database_number.to_string(),
            };
            self.driver.delete(&identity).await?;
            api.delete(&existing.name_any(), &Default::default()).await?;
        }
        Ok(())
    }
}

pub(crate) async fn upsert<K>(api: &Api<K>, name: &str, object: K) -> crate::Result<()>
where
    K: kube::Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let patch = Patch::Apply(&object);
    let params = PatchParams::apply("kube-stager").force();
    match api.patch(name, &params, &patch).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => {
            api.create(&PostParams::default(), &object).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
