use projgen_domain::{
    APIS_TYPE, ApiActivationProperties, BILLING_TYPE, BUCKET_TYPE, BillingLinkProperties,
    BucketExportSettings, BucketProperties, Context, PROJECT_TYPE, ParentReference,
    ProjectResourceProperties, ResourceDescriptor, ResourceProperties, SERVICE_ACCOUNTS_TYPE,
    SET_EXPORT_BUCKET_ACTION, ServiceAccountsProperties, SetExportBucketProperties,
};
use tracing::debug;

use crate::api_names::ApiNameResolver;
use crate::error::BuildError;
use crate::graph::ResourceGraph;
use crate::policy::merge_owner_binding;

pub const APIS_RESOURCE: &str = "apis";
pub const SERVICE_ACCOUNTS_RESOURCE: &str = "service-accounts";
pub const SET_EXPORT_BUCKET_RESOURCE: &str = "set-export-bucket";
pub const COMPUTE_API: &str = "compute.googleapis.com";
pub const STORAGE_COMPONENT_API: &str = "storage-component.googleapis.com";

/// Build the resource graph for a single project.
///
/// Emits the project, its billing link, the API activation and service account
/// sub-deployments, and, when `bucket-export-settings` is set, the usage export
/// bucket and the action pointing the project at it.
///
/// API resource names come from `resolver` and are referenced whether or not
/// the API appears in `apis`. The project id may coincide with a fixed
/// resource name such as `apis`; references to it then resolve to the project.
///
/// # Errors
///
/// Returns an error when `bucket-export-settings` neither creates a bucket nor
/// names one.
pub fn build_graph(
    context: &Context,
    resolver: &dyn ApiNameResolver,
) -> Result<ResourceGraph, BuildError> {
    let properties = &context.properties;
    let project_id = context.env.name.as_str();
    let billing_name = format!("billing_{project_id}");
    let mut graph = ResourceGraph::new();
    graph.share_name(project_id);

    let project = ResourceDescriptor::typed(
        project_id,
        PROJECT_TYPE,
        ResourceProperties::Project(ProjectResourceProperties {
            name: project_id.to_string(),
            project_id: project_id.to_string(),
            parent: ParentReference::organization(properties.organization_id.clone()),
        }),
    )
    .with_access_control(merge_owner_binding(&context.env, properties));
    emit(&mut graph, project, Vec::new())?;

    let billing = ResourceDescriptor::typed(
        billing_name.clone(),
        BILLING_TYPE,
        ResourceProperties::BillingLink(BillingLinkProperties {
            name: format!("projects/{project_id}"),
            billing_account_name: properties.billing_account_name.clone(),
        }),
    )
    .with_dependencies(vec![project_id.to_string()]);
    emit(&mut graph, billing, Vec::new())?;

    let apis = ResourceDescriptor::typed(
        APIS_RESOURCE,
        APIS_TYPE,
        ResourceProperties::ApiActivation(ApiActivationProperties {
            project: project_id.to_string(),
            billing: billing_name,
            apis: properties.apis.clone(),
            concurrent_api_activation: properties.concurrent_api_activation,
        }),
    );
    let activated = properties
        .apis
        .iter()
        .map(|api| resolver.resolve(project_id, api))
        .collect();
    emit(&mut graph, apis, activated)?;

    let service_accounts = ResourceDescriptor::typed(
        SERVICE_ACCOUNTS_RESOURCE,
        SERVICE_ACCOUNTS_TYPE,
        ResourceProperties::ServiceAccounts(ServiceAccountsProperties {
            project: project_id.to_string(),
            service_accounts: properties.service_accounts.clone(),
        }),
    );
    emit(&mut graph, service_accounts, Vec::new())?;

    if let Some(settings) = properties
        .bucket_export_settings
        .as_ref()
        .filter(|settings| !settings.is_empty())
    {
        emit_usage_export(&mut graph, project_id, settings, resolver)?;
    }

    Ok(graph)
}

fn emit_usage_export(
    graph: &mut ResourceGraph,
    project_id: &str,
    settings: &BucketExportSettings,
    resolver: &dyn ApiNameResolver,
) -> Result<(), BuildError> {
    let compute_api = resolver.resolve(project_id, COMPUTE_API);
    graph.declare_external(compute_api.clone());
    let mut action_dependency = vec![project_id.to_string(), compute_api];

    let bucket_name = if settings.creates_bucket() {
        let bucket_name = format!("{project_id}-export-bucket");
        let storage_api = resolver.resolve(project_id, STORAGE_COMPONENT_API);
        graph.declare_external(storage_api.clone());
        let bucket = ResourceDescriptor::typed(
            bucket_name.clone(),
            BUCKET_TYPE,
            ResourceProperties::Bucket(BucketProperties {
                project: project_id.to_string(),
                name: bucket_name.clone(),
            }),
        )
        .with_dependencies(vec![project_id.to_string(), storage_api]);
        emit(graph, bucket, Vec::new())?;
        action_dependency.push(bucket_name.clone());
        bucket_name
    } else {
        settings
            .bucket_name
            .clone()
            .ok_or_else(|| BuildError::MissingProperty {
                key: "bucket-export-settings.bucket-name".to_string(),
            })?
    };

    let action = ResourceDescriptor::action(
        SET_EXPORT_BUCKET_RESOURCE,
        SET_EXPORT_BUCKET_ACTION,
        ResourceProperties::SetExportBucket(SetExportBucketProperties {
            project: project_id.to_string(),
            bucket_name: format!("gs://{bucket_name}"),
        }),
    )
    .with_dependencies(action_dependency);
    emit(graph, action, Vec::new())
}

fn emit(
    graph: &mut ResourceGraph,
    descriptor: ResourceDescriptor,
    exports: Vec<String>,
) -> Result<(), BuildError> {
    debug!(
        name = %descriptor.name,
        kind = descriptor.kind.tag(),
        depends_on = ?descriptor.depends_on(),
        "emitting resource"
    );
    graph.insert_with_exports(descriptor, exports)?;
    Ok(())
}
