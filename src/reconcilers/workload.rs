//! Deployment reconciler, grounded in `deployment_controller.go` and the
//! teacher's `statefulset.rs` apply-patch idiom (generalized from a
//! StatefulSet-per-CoreDB to one Deployment per site service).

use crate::apis::serviceconfig_types::ServiceConfigSpec;
use crate::apis::site_types::{StagingSite, StagingSiteService, WorkloadHealth};
use crate::labels;
use crate::naming::make_object_name;
use crate::template::{SiteTemplateValues, TemplateValueSource};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{Api, ListParams, ObjectMeta, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;

fn selector_labels(site: &StagingSite, service_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::SITE.to_owned(), site.name_any()),
        (labels::SERVICE.to_owned(), service_name.to_owned()),
    ])
}

/// Applies `service.resource_overrides` onto the matching container by name,
/// leaving containers without an override untouched.
fn apply_resource_overrides(pod_spec: &mut PodSpec, overrides: &BTreeMap<String, k8s_openapi::api::core::v1::ResourceRequirements>) {
    for container in &mut pod_spec.containers {
        if let Some(resources) = overrides.get(&container.name) {
            container.resources = Some(resources.clone());
        }
    }
}

/// Appends `service.extra_envs` (sorted by key, for deterministic diffs) onto
/// every container in the pod spec.
fn apply_extra_envs(pod_spec: &mut PodSpec, extra_envs: &BTreeMap<String, String>) {
    if extra_envs.is_empty() {
        return;
    }
    for container in &mut pod_spec.containers {
        let env = container.env.get_or_insert_with(Vec::new);
        for (name, value) in extra_envs {
            env.push(k8s_openapi::api::core::v1::EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                value_from: None,
            });
        }
    }
}

fn build_deployment(
    object_name: &str,
    ns: &str,
    site: &StagingSite,
    service_name: &str,
    service: &StagingSiteService,
    mut pod_spec: PodSpec,
) -> Deployment {
    apply_resource_overrides(&mut pod_spec, &service.resource_overrides);
    apply_extra_envs(&mut pod_spec, &service.extra_envs);
    let match_labels = selector_labels(site, service_name);

    Deployment {
        metadata: ObjectMeta {
            name: Some(object_name.to_owned()),
            namespace: Some(ns.to_owned()),
            labels: Some(match_labels.clone()),
            owner_references: Some(vec![site.controller_owner_ref(&()).expect("StagingSite is namespaced, has a uid")]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(service.replicas),
            selector: LabelSelector { match_labels: Some(match_labels.clone()), ..Default::default() },
            template: k8s_openapi::api::core::v1::PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(match_labels), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// `status.readyReplicas == spec.replicas` -> Healthy, grounded in 4.8's
/// literal health definition; any observed-but-mismatched status ->
/// Unhealthy; no status observed yet (deployment not yet created/reconciled
/// by the API server) -> Incomplete.
fn workload_health(desired_replicas: i32, status: Option<&DeploymentStatus>) -> WorkloadHealth {
    match status {
        Some(status) if status.ready_replicas.unwrap_or(0) == desired_replicas => WorkloadHealth::Healthy,
        Some(_) => WorkloadHealth::Unhealthy,
        None => WorkloadHealth::Incomplete,
    }
}

/// Reconciles every enabled service's Deployment and rolls the individual
/// results up into one site-wide [`WorkloadHealth`], along with the
/// per-service statuses to record on `StagingSiteStatus.services`.
pub async fn ensure_workloads(
    client: Client,
    site: &StagingSite,
    configs: &BTreeMap<String, ServiceConfigSpec>,
) -> crate::Result<(WorkloadHealth, BTreeMap<String, DeploymentStatus>)> {
    let ns = site.namespace().unwrap_or_default();
    let api: Api<Deployment> = Api::namespaced(client, &ns);
    let mut statuses = BTreeMap::new();
    let mut overall = WorkloadHealth::Healthy;

    for (service_name, service) in &site.spec.services {
        let Some(config) = configs.get(service_name) else {
            continue;
        };
        let object_name = make_object_name(&site.name_any(), &[&config.short_name]);

        let values = SiteTemplateValues::new(site, service_name, service, config)
            .with_extra_envs(&service.extra_envs)
            .with_peer_services(site, configs, &ns, service_name);
        let templated_pod = crate::template::replace_in_spec(&config.deployment_pod_spec, "Deployment", &[&values])?;

        let deployment = build_deployment(&object_name, &ns, site, service_name, service, templated_pod);
        let params = PatchParams::apply("kube-stager").force();
        api.patch(&object_name, &params, &Patch::Apply(&deployment)).await?;

        let existing_status = api.get_opt(&object_name).await?.and_then(|d| d.status);
        let health = workload_health(service.replicas, existing_status.as_ref());
        if let Some(status) = existing_status {
            statuses.insert(service_name.clone(), status);
        }

        overall = match (overall.clone(), health) {
            (_, WorkloadHealth::Unhealthy) | (WorkloadHealth::Unhealthy, _) => WorkloadHealth::Unhealthy,
            (_, WorkloadHealth::Incomplete) | (WorkloadHealth::Incomplete, _) => WorkloadHealth::Incomplete,
            _ => WorkloadHealth::Healthy,
        };
    }

    // remove deployments for services no longer declared on the site
    let keep: Vec<String> = site
        .spec
        .services
        .keys()
        .filter_map(|name| configs.get(name))
        .map(|config| make_object_name(&site.name_any(), &[&config.short_name]))
        .collect();
    let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
    for existing in api.list(&list_params).await?.items {
        let name = existing.name_any();
        if !keep.contains(&name) {
            api.delete(&name, &Default::default()).await?;
        }
    }

    Ok((overall, statuses))
}

/// Deletes every Deployment owned by `site`, used by the finalizer path.
pub async fn delete_workloads(client: Client, site: &StagingSite) -> crate::Result<()> {
    let ns = site.namespace().unwrap_or_default();
    let api: Api<Deployment> = Api::namespaced(client, &ns);
    let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
    for existing in api.list(&list_params).await?.items {
        api.delete(&existing.name_any(), &Default::default()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_requires_ready_replicas_to_match_desired() {
        let status = DeploymentStatus { ready_replicas: Some(3), ..Default::default() };
        assert_eq!(workload_health(3, Some(&status)), WorkloadHealth::Healthy);
    }

    #[test]
    fn no_observed_status_is_incomplete() {
        assert_eq!(workload_health(2, None), WorkloadHealth::Incomplete);
    }

    #[test]
    fn mismatched_ready_replicas_is_unhealthy() {
        let status = DeploymentStatus { ready_replicas: Some(1), ..Default::default() };
        assert_eq!(workload_health(2, Some(&status)), WorkloadHealth::Unhealthy);
    }
}
