//! ConfigMap reconciler, grounded in the teacher's `configmap.rs`
//! apply-patch idiom. Data is sourced from `ServiceConfig.config_maps`
//! after template substitution, one ConfigMap per declared name.

use crate::apis::serviceconfig_types::ServiceConfigSpec;
use crate::apis::site_types::StagingSite;
use crate::labels;
use crate::naming::make_object_name;
use crate::template::{self, TemplateValueSource};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, ObjectMeta, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::debug;

pub async fn reconcile_config_maps(
    client: Client,
    site: &StagingSite,
    service_name: &str,
    config: &ServiceConfigSpec,
    values: &dyn TemplateValueSource,
) -> crate::Result<()> {
    let ns = site.namespace().unwrap_or_default();
    let api: Api<ConfigMap> = Api::namespaced(client, &ns);
    let owner = site.controller_owner_ref(&()).expect("StagingSite is namespaced, has a uid");

    for (cm_name, data) in &config.config_maps {
        let object_name = make_object_name(&site.name_any(), &[&config.short_name, cm_name]);
        let resolved = template::replace_in_string_map(data, "ConfigMap", &[values])?;

        let cm_labels = BTreeMap::from([
            (labels::SITE.to_owned(), site.name_any()),
            (labels::SERVICE.to_owned(), service_name.to_owned()),
            (labels::TYPE.to_owned(), cm_name.clone()),
        ]);
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some(object_name.clone()),
                namespace: Some(ns.clone()),
                labels: Some(cm_labels),
                owner_references: Some(vec![owner.clone()]),
                ..Default::default()
            },
            data: Some(resolved),
            ..Default::default()
        };

        let patch_params = PatchParams::apply("kube-stager").force();
        api.patch(&object_name, &patch_params, &Patch::Apply(&cm)).await?;
        debug!("Reconciled configmap {object_name} for {service_name} in site {}", site.name_any());
    }

    Ok(())
}
