use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod context;
mod policy;
mod resource;

pub use context::{
    BucketExportSettings, Context, ContextProperties, DeploymentEnv, IamPolicy, OrganizationId,
    ProjectNumber,
};
pub use policy::{Binding, OWNER_ROLE, Policy};
pub use resource::{
    APIS_TYPE, AccessControl, ApiActivationProperties, BILLING_TYPE, BillingLinkProperties,
    BUCKET_TYPE, BucketProperties, GraphManifest, PROJECT_TYPE, ParentReference,
    ProjectResourceProperties, ResourceDescriptor, ResourceKind, ResourceMetadata,
    ResourceProperties, SERVICE_ACCOUNTS_TYPE, SET_EXPORT_BUCKET_ACTION, ServiceAccountsProperties,
    SetExportBucketProperties,
};

/// Result of generating one context file during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOutcome {
    pub context: PathBuf,
    pub project_id: Option<String>,
    pub manifest: Option<GraphManifest>,
    pub execution_order: Vec<String>,
    pub error: Option<String>,
}

impl ContextOutcome {
    #[must_use]
    pub fn failed(context: PathBuf, error: String) -> Self {
        Self {
            context,
            project_id: None,
            manifest: None,
            execution_order: Vec::new(),
            error: Some(error),
        }
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.manifest
            .as_ref()
            .map_or(0, |manifest| manifest.resources.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub discovered_contexts: Vec<PathBuf>,
    pub outcomes: Vec<ContextOutcome>,
    pub errors: Vec<String>,
}

impl GenerationReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.outcomes.iter().any(|outcome| outcome.error.is_some())
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.error.is_some())
            .count()
    }
}
