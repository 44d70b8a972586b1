//! Service/Ingress reconciler, grounded in `service_controller.go` /
//! `ingress_controller.go` and the teacher's `service.rs` apply-patch idiom.
//!
//! A disabled site (`status.enabled == false`) has all of its networking
//! objects removed rather than updated in place, matching the original's
//! "disable tears down the public surface area, keeps the data" behavior.

use crate::apis::serviceconfig_types::ServiceConfigSpec;
use crate::apis::site_types::StagingSite;
use crate::labels;
use crate::naming::make_object_name;
use crate::template::{SiteTemplateValues, TemplateValueSource};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, ListParams, ObjectMeta, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;

fn owner_ref(site: &StagingSite) -> k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
    site.controller_owner_ref(&()).expect("StagingSite is namespaced, has a uid")
}

async fn delete_by_site_label<K>(api: &Api<K>, site: &StagingSite) -> crate::Result<()>
where
    K: kube::Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
    K::DynamicType: Default,
{
    let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));
    for existing in api.list(&list_params).await?.items {
        api.delete(&existing.name_any(), &Default::default()).await?;
    }
    Ok(())
}

/// Reconciles the Service and Ingress for one service in `site`, or tears
/// both down when `site_enabled` is false.
pub async fn ensure_networking(
    client: Client,
    site: &StagingSite,
    site_enabled: bool,
    service_name: &str,
    service: &crate::apis::site_types::StagingSiteService,
    config: &ServiceConfigSpec,
    configs: &BTreeMap<String, ServiceConfigSpec>,
) -> crate::Result<()> {
    let ns = site.namespace().unwrap_or_default();
    let svc_api: Api<Service> = Api::namespaced(client.clone(), &ns);
    let ingress_api: Api<Ingress> = Api::namespaced(client, &ns);

    let svc_name = make_object_name(&site.name_any(), &[&config.short_name]);
    let ingress_name = make_object_name(&site.name_any(), &[&config.short_name]);

    if !site_enabled {
        if svc_api.get_opt(&svc_name).await?.is_some() {
            svc_api.delete(&svc_name, &Default::default()).await?;
        }
        if ingress_api.get_opt(&ingress_name).await?.is_some() {
            ingress_api.delete(&ingress_name, &Default::default()).await?;
        }
        return Ok(());
    }

    let values = SiteTemplateValues::new(site, service_name, service, config).with_peer_services(site, configs, &ns, service_name);
    let child_labels = BTreeMap::from([
        (labels::SITE.to_owned(), site.name_any()),
        (labels::SERVICE.to_owned(), service_name.to_owned()),
    ]);

    if let Some(service_spec) = &config.service_spec {
        let templated_spec = crate::template::replace_in_spec(service_spec, "Service", &[&values])?;
        let object = Service {
            metadata: ObjectMeta {
                name: Some(svc_name.clone()),
                namespace: Some(ns.clone()),
                labels: Some(child_labels.clone()),
                owner_references: Some(vec![owner_ref(site)]),
                ..Default::default()
            },
            spec: Some(templated_spec),
            status: None,
        };
        let params = PatchParams::apply("kube-stager").force();
        svc_api.patch(&svc_name, &params, &Patch::Apply(&object)).await?;
    }

    if let Some(ingress_spec) = &config.ingress_spec {
        let templated_spec = crate::template::replace_in_spec(ingress_spec, "Ingress", &[&values])?;
        let annotations = crate::template::replace_in_string_map(&config.ingress_annotations, "Ingress", &[&values])?;
        let object = Ingress {
            metadata: ObjectMeta {
                name: Some(ingress_name.clone()),
                namespace: Some(ns.clone()),
                labels: Some(child_labels),
                annotations: Some(annotations),
                owner_references: Some(vec![owner_ref(site)]),
                ..Default::default()
            },
            spec: Some(templated_spec),
            status: None,
        };
        let params = PatchParams::apply("kube-stager").force();
        ingress_api.patch(&ingress_name, &params, &Patch::Apply(&object)).await?;
    }

    Ok(())
}

/// Deletes every Service and Ingress owned by `site`, used by the finalizer
/// path.
pub async fn delete_networking(client: Client, site: &StagingSite) -> crate::Result<()> {
    let ns = site.namespace().unwrap_or_default();
    let svc_api: Api<Service> = Api::namespaced(client.clone(), &ns);
    let ingress_api: Api<Ingress> = Api::namespaced(client, &ns);
    delete_by_site_label(&svc_api, site).await?;
    delete_by_site_label(&ingress_api, site).await?;
    Ok(())
}

/// Deletes Service/Ingress objects whose `service` label names a service the
/// site no longer declares, grounded in `ensureServicesAreUpToDate`'s
/// `servicesToDelete` diff pass.
pub async fn sweep_orphaned_networking(client: Client, site: &StagingSite) -> crate::Result<()> {
    let ns = site.namespace().unwrap_or_default();
    let svc_api: Api<Service> = Api::namespaced(client.clone(), &ns);
    let ingress_api: Api<Ingress> = Api::namespaced(client, &ns);
    let list_params = ListParams::default().labels(&format!("{}={}", labels::SITE, site.name_any()));

    for existing in svc_api.list(&list_params).await?.items {
        let declared = existing.labels().get(labels::SERVICE).map(|s| site.spec.services.contains_key(s)).unwrap_or(false);
        if !declared {
            svc_api.delete(&existing.name_any(), &Default::default()).await?;
        }
    }
    for existing in ingress_api.list(&list_params).await?.items {
        let declared = existing.labels().get(labels::SERVICE).map(|s| site.spec.services.contains_key(s)).unwrap_or(false);
        if !declared {
            ingress_api.delete(&existing.name_any(), &Default::default()).await?;
        }
    }
    Ok(())
}
