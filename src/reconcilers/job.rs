//! Db-init / db-migration / backup job reconcilers, grounded in
//! `dbinitjob_controller.go` and `internal/controllers/job/backup_controller.go`.
//!
//! All three share one state machine (`"" -> Pending -> Running ->
//! Complete|Failed`, absorbing) over a single owned batch [`Job`]; this
//! module factors that machine into [`drive_batch_job`] and has each of the
//! three job kinds supply only what differs: which pod-spec template field
//! feeds the batch job, and (for migration) the image-tag-change trigger.

use crate::apis::dbconfig_types::{MongoConfigSpec, MysqlConfigSpec};
use crate::apis::job_types::{
    Backup, BackupSpec, BackupStatus, BackupStatusDetail, BackupType, DbInitJob, DbInitJobSpec, DbInitJobStatus,
    DbMigrationJob, DbMigrationJobSpec, DbMigrationJobStatus,
};
use crate::apis::serviceconfig_types::ServiceConfigSpec;
use crate::apis::site_types::{StagingSite, StagingSiteService, StagingSiteStatus};
use crate::apis::task_types::JobState;
use crate::config::JobConfig;
use crate::errors::ControllerError;
use crate::naming::{make_database_name, make_object_name, make_username, shorten_readable};
use crate::template::{SiteTemplateValues, TemplateValueSource};
use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use crate::reconcilers::task::upsert;
use kube::api::{Api, ListParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;

/// Outcome of one [`drive_batch_job`] step: the job's new state, its
/// (possibly freshly stamped) deadline, and the updated not-found counter.
pub struct JobStep {
    pub state: JobState,
    pub deadline: Option<DateTime<Utc>>,
    pub job_not_found_count: u32,
}

fn restart_policy_on_failure(spec: &mut PodSpec) {
    if spec.restart_policy.as_deref() != Some("Never") {
        spec.restart_policy = Some("OnFailure".to_owned());
    }
}

fn build_batch_job(
    name: &str,
    namespace: &str,
    labels: BTreeMap<String, String>,
    owner: k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference,
    mut pod_spec: PodSpec,
    job_config: &JobConfig,
) -> Job {
    restart_policy_on_failure(&mut pod_spec);
    Job {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            active_deadline_seconds: Some(job_config.deadline_seconds),
            backoff_limit: Some(job_config.backoff_limit),
            ttl_seconds_after_finished: Some(job_config.ttl_seconds),
            template: k8s_openapi::api::core::v1::PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        status: None,
    }
}

fn job_condition_true(job: &Job, condition_type: &str) -> bool {
    job.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| conds.iter().any(|c| c.type_ == condition_type && c.status == "True"))
        .unwrap_or(false)
}

/// Drives one owned batch [`Job`] through the shared state machine.
///
/// **Redesign applied** (spec's Open Question on `DbInitMaxJobFailedLoadLimit`):
/// the original increments its not-found counter on every cache-indexed read
/// that misses, which can't tell "the informer hasn't caught up yet" from
/// "the job is truly gone". [`Api::get`] here always hits the apiserver
/// directly rather than a local lister cache, so a 404 already means the
/// object doesn't exist cluster-side right now; the counter still exists (to
/// absorb a job deleted-and-not-yet-recreated for a few ticks) but no longer
/// needs a separate warm-up distinction.
async fn drive_batch_job(
    api: &Api<Job>,
    name: &str,
    desired: &Job,
    state: JobState,
    deadline: Option<DateTime<Utc>>,
    job_not_found_count: u32,
    deadline_seconds: i64,
    max_not_found: u32,
    now: DateTime<Utc>,
) -> crate::Result<JobStep> {
    if state.is_final() {
        return Ok(JobStep { state, deadline, job_not_found_count });
    }

    let deadline = deadline.or_else(|| Some(now + chrono::Duration::seconds(deadline_seconds)));

    if matches!(state, JobState::Pending) {
        match api.get(name).await {
            Ok(_) => Ok(JobStep { state: JobState::Running, deadline, job_not_found_count: 0 }),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                let params = PatchParams::apply("kube-stager").force();
                api.patch(name, &params, &Patch::Apply(desired)).await.or_else(|e| match e {
                    kube::Error::Api(e) if e.code == 409 => Ok(Default::default()),
                    e => Err(e),
                })?;
                Ok(JobStep { state: JobState::Running, deadline, job_not_found_count: 0 })
            }
            Err(e) => Err(e.into()),
        }
    } else {
        // Running
        match api.get(name).await {
            Ok(job) => {
                if job_condition_true(&job, "Complete") {
                    Ok(JobStep { state: JobState::Complete, deadline, job_not_found_count: 0 })
                } else if job_condition_true(&job, "Failed") {
                    Ok(JobStep { state: JobState::Failed, deadline, job_not_found_count: 0 })
                } else if deadline.map(|d| now > d).unwrap_or(false) {
                    Ok(JobStep { state: JobState::Failed, deadline, job_not_found_count: 0 })
                } else {
                    Ok(JobStep { state: JobState::Running, deadline, job_not_found_count: 0 })
                }
            }
            Err(kube::Error::Api(e)) if e.code == 404 => {
                let count = job_not_found_count + 1;
                if count > max_not_found {
                    Ok(JobStep { state: JobState::Failed, deadline, job_not_found_count: count })
                } else {
                    let params = PatchParams::apply("kube-stager").force();
                    api.patch(name, &params, &Patch::Apply(desired)).await.or_else(|e| match e {
                        kube::Error::Api(e) if e.code == 409 => Ok(Default::default()),
                        e => Err(e),
                    })?;
                    Ok(JobStep { state: JobState::Running, deadline, job_not_found_count: count })
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn owner_ref(site: &StagingSite) -> k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
    site.controller_owner_ref(&()).expect("StagingSite is namespaced, has a uid")
}

async fn load_mysql_config(client: &Client, ns: &str, environment: &str) -> crate::Result<MysqlConfigSpec> {
    let api: Api<crate::apis::dbconfig_types::MysqlConfig> = Api::namespaced(client.clone(), ns);
    Ok(api.get(environment).await?.spec)
}

async fn load_mongo_config(client: &Client, ns: &str, environment: &str) -> crate::Result<MongoConfigSpec> {
    let api: Api<crate::apis::dbconfig_types::MongoConfig> = Api::namespaced(client.clone(), ns);
    Ok(api.get(environment).await?.spec)
}

async fn db_init_template_values(
    client: &Client,
    ns: &str,
    site: &StagingSite,
    service_name: &str,
    service: &StagingSiteService,
    config: &ServiceConfigSpec,
    configs: &BTreeMap<String, ServiceConfigSpec>,
) -> crate::Result<SiteTemplateValues> {
    let mut values =
        SiteTemplateValues::new(site, service_name, service, config).with_peer_services(site, configs, ns, service_name);
    let init_source = if service.db_init_source_environment_name.is_empty() {
        "master"
    } else {
        &service.db_init_source_environment_name
    };
    values = values.with_init_source(init_source);

    if !service.mysql_environment.is_empty() {
        let cfg = load_mysql_config(client, ns, &service.mysql_environment).await?;
        values = values.with_mysql(
            &cfg,
            &make_database_name(&site.spec.db_name, &config.short_name),
            &make_username(&site.spec.username, &config.short_name),
            &site.spec.password,
        );
    }
    if !service.mongo_environment.is_empty() {
        let cfg = load_mongo_config(client, ns, &service.mongo_environment).await?;
        values = values.with_mongo(
            &cfg,
            &make_database_name(&site.spec.db_name, &config.short_name),
            &make_username(&site.spec.username, &config.short_name),
            &site.spec.password,
        );
    }
    Ok(values)
}

/// Whether a service needs a db-init/db-migration job at all: it only makes
/// sense for services that actually own a database.
fn service_has_database(service: &StagingSiteService) -> bool {
    !service.mysql_environment.is_empty() || !service.mongo_environment.is_empty()
}

/// Reconciles every `DbInitJob` the site's services require. Returns whether
/// all of them have reached `Complete`.
pub async fn ensure_db_init_jobs(
    client: Client,
    site: &StagingSite,
    configs: &BTreeMap<String, ServiceConfigSpec>,
    job_config: &JobConfig,
    max_not_found: u32,
    now: DateTime<Utc>,
) -> crate::Result<bool> {
    let ns = site.namespace().unwrap_or_default();
    let crd_api: Api<DbInitJob> = Api::namespaced(client.clone(), &ns);
    let job_api: Api<Job> = Api::namespaced(client.clone(), &ns);
    let mut all_complete = true;

    for (service_name, service) in &site.spec.services {
        if !service_has_database(service) {
            continue;
        }
        let Some(config) = configs.get(service_name) else {
            continue;
        };
        let Some(pod_spec) = &config.db_init_pod_spec else {
            continue;
        };

        let object_name = make_object_name(&site.name_any(), &[&config.short_name, "dbinit"]);
        let existing = crd_api.get_opt(&object_name).await?;

        let spec = DbInitJobSpec {
            site_name: site.name_any(),
            service_name: service_name.clone(),
            mysql_environment: service.mysql_environment.clone(),
            mongo_environment: service.mongo_environment.clone(),
            db_init_source: if service.db_init_source_environment_name.is_empty() {
                "master".to_owned()
            } else {
                service.db_init_source_environment_name.clone()
            },
            database_name: make_database_name(&site.spec.db_name, &config.short_name),
            username: make_username(&site.spec.username, &config.short_name),
            password: site.spec.password.clone(),
            deadline_seconds: job_config.deadline_seconds,
        };

        let mut status = existing.as_ref().and_then(|e| e.status.clone()).unwrap_or_default();
        if existing.is_none() {
            status.state = JobState::Pending;
        }

        if status.state.is_final() {
            if !matches!(status.state, JobState::Complete) {
                all_complete = false;
            }
            continue;
        }

        let values = db_init_template_values(&client, &ns, site, service_name, service, config, configs).await?;
        let templated_pod = crate::template::replace_in_spec(pod_spec, "DbInitJob", &[&values])?;

        let batch_job_name = shorten_readable(&format!("dbinit-{}", object_name), 50);
        let mut labels = BTreeMap::new();
        labels.insert(crate::labels::TYPE.to_owned(), "dbinit".to_owned());
        labels.insert(crate::labels::JOB_NAME.to_owned(), object_name.clone());
        labels.insert(crate::labels::SITE.to_owned(), site.name_any());
        labels.insert(crate::labels::SERVICE.to_owned(), service_name.clone());

        let crd_owner = match &existing {
            Some(e) => e.controller_owner_ref(&()).expect("DbInitJob is namespaced, has a uid"),
            None => owner_ref(site),
        };
        let batch_job = build_batch_job(&batch_job_name, &ns, labels, crd_owner, templated_pod, job_config);

        let deadline = status.deadline_timestamp.as_ref().map(|t| t.0);
        let step = drive_batch_job(
            &job_api,
            &batch_job_name,
            &batch_job,
            status.state.clone(),
            deadline,
            status.job_not_found_count,
            job_config.deadline_seconds,
            max_not_found,
            now,
        )
        .await?;

        let new_status = DbInitJobStatus {
            state: step.state.clone(),
            job_not_found_count: step.job_not_found_count,
            deadline_timestamp: step.deadline.map(Time),
        };

        let object = DbInitJob {
            metadata: ObjectMeta {
                name: Some(object_name.clone()),
                namespace: Some(ns.clone()),
                labels: Some(BTreeMap::from([
                    (crate::labels::SITE.to_owned(), site.name_any()),
                    (crate::labels::SERVICE.to_owned(), service_name.clone()),
                ])),
                owner_references: Some(vec![owner_ref(site)]),
                ..Default::default()
            },
            spec,
            status: Some(new_status),
        };
        upsert(&crd_api, &object_name, object).await?;

        if matches!(step.state, JobState::Failed) {
            return Err(ControllerError::DatabaseInitError {
                site: site.name_any(),
                service: service_name.clone(),
                reason: Some("init job did not reach Complete before its deadline".to_owned()),
            }
            .into());
        }
        if !matches!(step.state, JobState::Complete) {
            all_complete = false;
        }
    }

    Ok(all_complete)
}

/// Reconciles every `DbMigrationJob`, including the image-tag-change
/// trigger: a final job whose recorded `last_migrated_image_tag` no longer
/// matches the service's current `image_tag` is reset to `Pending` and its
/// batch job deleted, so a new migration run is spawned against the new
/// image.
pub async fn ensure_db_migration_jobs(
    client: Client,
    site: &StagingSite,
    configs: &BTreeMap<String, ServiceConfigSpec>,
    job_config: &JobConfig,
    max_not_found: u32,
    now: DateTime<Utc>,
) -> crate::Result<bool> {
    let ns = site.namespace().unwrap_or_default();
    let crd_api: Api<DbMigrationJob> = Api::namespaced(client.clone(), &ns);
    let job_api: Api<Job> = Api::namespaced(client.clone(), &ns);
    let mut all_complete = true;

    for (service_name, service) in &site.spec.services {
        if !service_has_database(service) {
            continue;
        }
        let Some(config) = configs.get(service_name) else {
            continue;
        };
        let Some(pod_spec) = &config.migration_job_pod_spec else {
            continue;
        };

        let object_name = make_object_name(&site.name_any(), &[&config.short_name, "migration"]);
        let existing = crd_api.get_opt(&object_name).await?;
        let mut status = existing.as_ref().and_then(|e| e.status.clone()).unwrap_or_default();
        let batch_job_name = shorten_readable(&format!("migration-{}", object_name), 50);

        if existing.is_none() {
            status.state = JobState::Pending;
        } else if status.state.is_final() && status.last_migrated_image_tag != service.image_tag {
            match job_api.delete(&batch_job_name, &Default::default()).await {
                Ok(_) => {}
                Err(kube::Error::Api(e)) if e.code == 404 => {}
                Err(e) => return Err(e.into()),
            }
            status = DbMigrationJobStatus {
                state: JobState::Pending,
                last_migrated_image_tag: service.image_tag.clone(),
                job_not_found_count: 0,
                deadline_timestamp: None,
            };
        }

        if status.state.is_final() {
            if !matches!(status.state, JobState::Complete) {
                all_complete = false;
            }
            continue;
        }

        let values = SiteTemplateValues::new(site, service_name, service, config).with_peer_services(site, configs, &ns, service_name);
        let templated_pod = crate::template::replace_in_spec(pod_spec, "DbMigrationJob", &[&values])?;

        let mut labels = BTreeMap::new();
        labels.insert(crate::labels::TYPE.to_owned(), "migration".to_owned());
        labels.insert(crate::labels::JOB_NAME.to_owned(), object_name.clone());
        labels.insert(crate::labels::SITE.to_owned(), site.name_any());
        labels.insert(crate::labels::SERVICE.to_owned(), service_name.clone());

        let crd_owner = match &existing {
            Some(e) => e.controller_owner_ref(&()).expect("DbMigrationJob is namespaced, has a uid"),
            None => owner_ref(site),
        };
        let batch_job = build_batch_job(&batch_job_name, &ns, labels, crd_owner, templated_pod, job_config);

        let deadline = status.deadline_timestamp.as_ref().map(|t| t.0);
        let step = drive_batch_job(
            &job_api,
            &batch_job_name,
            &batch_job,
            status.state.clone(),
            deadline,
            status.job_not_found_count,
            job_config.deadline_seconds,
            max_not_found,
            now,
        )
        .await?;

        let new_status = DbMigrationJobStatus {
            state: step.state.clone(),
            last_migrated_image_tag: status.last_migrated_image_tag.clone(),
            job_not_found_count: step.job_not_found_count,
            deadline_timestamp: step.deadline.map(Time),
        };

        let spec = DbMigrationJobSpec {
            site_name: site.name_any(),
            service_name: service_name.clone(),
            image_tag: service.image_tag.clone(),
            deadline_seconds: job_config.deadline_seconds,
        };
        let object = DbMigrationJob {
            metadata: ObjectMeta {
                name: Some(object_name.clone()),
                namespace: Some(ns.clone()),
                labels: Some(BTreeMap::from([
                    (crate::labels::SITE.to_owned(), site.name_any()),
                    (crate::labels::SERVICE.to_owned(), service_name.clone()),
                ])),
                owner_references: Some(vec![owner_ref(site)]),
                ..Default::default()
            },
            spec,
            status: Some(new_status),
        };
        upsert(&crd_api, &object_name, object).await?;

        if matches!(step.state, JobState::Failed) {
            return Err(ControllerError::DatabaseMigrationError {
                site: site.name_any(),
                service: service_name.clone(),
                reason: Some("migration job did not reach Complete before its deadline".to_owned()),
            }
            .into());
        }
        if !matches!(step.state, JobState::Complete) {
            all_complete = false;
        }
    }

    Ok(all_complete)
}

/// Services eligible for a backup run: `include_in_backups` and a
/// `backup_pod_spec` configured.
fn backup_eligible<'a>(
    site: &'a StagingSite,
    configs: &'a BTreeMap<String, ServiceConfigSpec>,
) -> Vec<(&'a String, &'a StagingSiteService, &'a ServiceConfigSpec)> {
    site.spec
        .services
        .iter()
        .filter(|(_, s)| s.include_in_backups)
        .filter_map(|(name, s)| configs.get(name).map(|c| (name, s, c)))
        .filter(|(_, _, c)| c.backup_pod_spec.is_some())
        .collect()
}

/// Creates (if absent) the `Backup` object driving one backup run for
/// `site`, named per spec's 4.9c derivation.
pub async fn get_or_create_backup(
    client: Client,
    site: &StagingSite,
    backup_type: BackupType,
    now: DateTime<Utc>,
) -> crate::Result<Backup> {
    let ns = site.namespace().unwrap_or_default();
    let api: Api<Backup> = Api::namespaced(client, &ns);
    let name = match backup_type {
        BackupType::Scheduled => shorten_readable(&format!("sched-{}-{}", site.name_any(), now.timestamp()), 63),
        BackupType::Final => shorten_readable(&format!("final-{}", site.name_any()), 63),
        BackupType::Manual => shorten_readable(&format!("manual-{}-{}", site.name_any(), now.timestamp()), 63),
    };
    if let Some(existing) = api.get_opt(&name).await? {
        return Ok(existing);
    }

    let backup = Backup {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(ns.clone()),
            labels: Some(BTreeMap::from([(crate::labels::SITE.to_owned(), site.name_any())])),
            owner_references: Some(vec![owner_ref(site)]),
            ..Default::default()
        },
        spec: BackupSpec { site_name: site.name_any(), backup_type },
        status: Some(BackupStatus::default()),
    };
    api.create(&PostParams::default(), &backup).await?;
    Ok(backup)
}

/// Drives every backup-enabled service's job substate forward and rolls the
/// aggregate state up onto the `Backup` object, returning whether the whole
/// backup has reached a final state.
///
/// **Open Question resolved**: unlike the original's
/// `getNewBackupJob`/`createJob` (which swallows the
/// `SetControllerReference` failure and returns the object anyway), any
/// error claiming/creating a child batch job here is propagated — an
/// un-owned backup Job the apiserver then orphans is worse than a retried
/// reconcile.
pub async fn reconcile_backup(
    client: Client,
    backup: &Backup,
    site: &StagingSite,
    configs: &BTreeMap<String, ServiceConfigSpec>,
    job_config: &JobConfig,
    max_not_found: u32,
    now: DateTime<Utc>,
) -> crate::Result<BackupStatus> {
    let ns = site.namespace().unwrap_or_default();
    let job_api: Api<Job> = Api::namespaced(client.clone(), &ns);
    let mut status = backup.status.clone().unwrap_or_default();
    let owner = backup.controller_owner_ref(&()).expect("Backup is namespaced, has a uid");

    let services = backup_eligible(site, configs);
    if services.is_empty() {
        status.detail.state = JobState::Complete;
        return Ok(status);
    }

    let mut any_failed = false;
    let mut all_complete = true;

    for (service_name, service, config) in services {
        let pod_spec = config.backup_pod_spec.as_ref().expect("filtered by backup_eligible");
        let mut detail = status.services.get(service_name.as_str()).cloned().unwrap_or_default();
        if detail.job_started_at.is_none() {
            detail.job_started_at = Some(Time(now));
        }

        if detail.state.is_final() {
            any_failed |= matches!(detail.state, JobState::Failed);
            all_complete &= matches!(detail.state, JobState::Complete);
            status.services.insert(service_name.clone(), detail);
            continue;
        }

        let values = SiteTemplateValues::new(site, service_name, service, config).with_peer_services(site, configs, &ns, service_name);
        let templated_pod = crate::template::replace_in_spec(pod_spec, "Backup", &[&values])?;

        let batch_job_name = shorten_readable(&format!("backup-{}-{}", backup.name_any(), service_name), 50);
        let mut labels = BTreeMap::new();
        labels.insert(crate::labels::TYPE.to_owned(), "backup".to_owned());
        labels.insert(crate::labels::JOB_NAME.to_owned(), backup.name_any());
        labels.insert(crate::labels::SITE.to_owned(), site.name_any());
        labels.insert(crate::labels::SERVICE.to_owned(), service_name.clone());

        let batch_job = build_batch_job(&batch_job_name, &ns, labels, owner.clone(), templated_pod, job_config);

        let step = drive_batch_job(
            &job_api,
            &batch_job_name,
            &batch_job,
            detail.state.clone(),
            None,
            0,
            job_config.deadline_seconds,
            max_not_found,
            now,
        )
        .await?;

        detail.state = step.state.clone();
        if step.state.is_final() {
            detail.job_finished_at = Some(Time(now));
        }
        any_failed |= matches!(step.state, JobState::Failed);
        all_complete &= matches!(step.state, JobState::Complete);
        status.services.insert(service_name.clone(), detail);
    }

    status.detail.state = if any_failed {
        JobState::Failed
    } else if all_complete {
        JobState::Complete
    } else {
        JobState::Running
    };
    if status.detail.job_started_at.is_none() {
        status.detail.job_started_at = Some(Time(now));
    }
    if status.detail.state.is_final() && status.detail.job_finished_at.is_none() {
        status.detail.job_finished_at = Some(Time(now));
    }

    Ok(status)
}

/// Claims controller ownership over any `Backup` naming `site` that has
/// none (e.g. a manually created one), and garbage-collects all but the 3
/// most recently started finished Backups, grounded in
/// `stagingsite_controller.go`'s unnamed backup-housekeeping step.
///
/// **Open Question resolved**: the original swallows the ownership-claim
/// update error (`return isChanged, nil`); this rewrite propagates it. Also
/// mirrors the original's short-circuit: a tick that claims any Backup
/// skips retention and lets the next reconcile handle it.
pub async fn reconcile_backup_housekeeping(
    client: Client,
    site: &StagingSite,
    status: &mut StagingSiteStatus,
) -> crate::Result<()> {
    let ns = site.namespace().unwrap_or_default();
    let api: Api<Backup> = Api::namespaced(client, &ns);
    let backups: Vec<Backup> = api
        .list(&ListParams::default())
        .await?
        .items
        .into_iter()
        .filter(|b| b.spec.site_name == site.name_any())
        .collect();

    let mut finished = Vec::new();
    let mut claimed_any = false;

    for backup in backups {
        if let Some(s) = &backup.status {
            if matches!(s.detail.state, JobState::Complete) {
                if let Some(finished_at) = &s.detail.job_finished_at {
                    let newer = status.last_backup_time.as_ref().map(|t| t.0 < finished_at.0).unwrap_or(true);
                    if newer {
                        status.last_backup_time = Some(finished_at.clone());
                    }
                }
            }
            if s.detail.state.is_final() {
                finished.push(backup.clone());
            }
        }

        let is_owned = backup.metadata.owner_references.as_ref().map(|o| o.iter().any(|r| r.controller.unwrap_or(false))).unwrap_or(false);
        if !is_owned {
            let owner = site.controller_owner_ref(&()).expect("StagingSite is namespaced, has a uid");
            let mut owners = backup.metadata.owner_references.clone().unwrap_or_default();
            owners.push(owner);
            let patch = serde_json::json!({ "metadata": { "ownerReferences": owners } });
            api.patch(&backup.name_any(), &PatchParams::default(), &Patch::Merge(&patch)).await?;
            claimed_any = true;
        }
    }

    if claimed_any || finished.len() <= 3 {
        return Ok(());
    }

    // `jobStartedAt` sorts ascending (oldest first) with nil sorted last: a
    // backup we never recorded a start time for is not preferentially culled.
    finished.sort_by_key(|b| {
        let started = b.status.as_ref().and_then(|s| s.detail.job_started_at.clone()).map(|t| t.0);
        (started.is_none(), started)
    });
    for backup in finished.iter().take(finished.len() - 3) {
        api.delete(&backup.name_any(), &Default::default()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_job_name_is_shortened_and_namespaced_by_kind() {
        let name = shorten_readable(&format!("dbinit-{}", "a".repeat(60)), 50);
        assert!(name.len() <= 50);
    }
}
