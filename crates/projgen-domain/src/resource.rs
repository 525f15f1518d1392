use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::OrganizationId;
use crate::policy::Policy;

pub const PROJECT_TYPE: &str = "cloudresourcemanager.v1.project";
pub const BILLING_TYPE: &str = "deploymentmanager.v2.virtual.projectBillingInfo";
pub const APIS_TYPE: &str = "apis.py";
pub const SERVICE_ACCOUNTS_TYPE: &str = "service-accounts.py";
pub const BUCKET_TYPE: &str = "gcp-types/storage-v1:buckets";
pub const SET_EXPORT_BUCKET_ACTION: &str =
    "gcp-types/compute-v1:compute.projects.setUsageExportBucket";

/// Whether a descriptor creates an object (`type`) or runs an imperative call
/// (`action`). Serialized as a single `type`/`action` key on the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Type(String),
    Action(String),
}

impl ResourceKind {
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Type(tag) | Self::Action(tag) => tag,
        }
    }

    #[must_use]
    pub const fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: ResourceKind,
    pub properties: ResourceProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,
    #[serde(
        rename = "accessControl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_control: Option<AccessControl>,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn typed(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        properties: ResourceProperties,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Type(type_tag.into()),
            properties,
            metadata: None,
            access_control: None,
        }
    }

    #[must_use]
    pub fn action(
        name: impl Into<String>,
        action: impl Into<String>,
        properties: ResourceProperties,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Action(action.into()),
            properties,
            metadata: None,
            access_control: None,
        }
    }

    #[must_use]
    pub fn with_dependencies(mut self, depends_on: Vec<String>) -> Self {
        self.metadata = Some(ResourceMetadata { depends_on });
        self
    }

    #[must_use]
    pub fn with_access_control(mut self, policy: Policy) -> Self {
        self.access_control = Some(AccessControl {
            gcp_iam_policy: policy,
        });
        self
    }

    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map_or(&[], |metadata| metadata.depends_on.as_slice())
    }

    #[must_use]
    pub fn policy(&self) -> Option<&Policy> {
        self.access_control
            .as_ref()
            .map(|access_control| &access_control.gcp_iam_policy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceMetadata {
    #[serde(rename = "dependsOn")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    #[serde(rename = "gcpIamPolicy")]
    pub gcp_iam_policy: Policy,
}

/// Typed property blocks, one per descriptor shape the builder emits.
///
/// Every variant denies unknown fields so that untagged decoding picks the
/// right shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceProperties {
    Project(ProjectResourceProperties),
    BillingLink(BillingLinkProperties),
    ApiActivation(ApiActivationProperties),
    ServiceAccounts(ServiceAccountsProperties),
    Bucket(BucketProperties),
    SetExportBucket(SetExportBucketProperties),
}

impl ResourceProperties {
    /// Short human label for the descriptor shape.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Project(_) => "project",
            Self::BillingLink(_) => "billing link",
            Self::ApiActivation(_) => "api activation",
            Self::ServiceAccounts(_) => "service accounts",
            Self::Bucket(_) => "bucket",
            Self::SetExportBucket(_) => "set export bucket",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectResourceProperties {
    pub name: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub parent: ParentReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: OrganizationId,
}

impl ParentReference {
    #[must_use]
    pub fn organization(id: OrganizationId) -> Self {
        Self {
            kind: "organization".to_string(),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingLinkProperties {
    /// `projects/<project id>`.
    pub name: String,
    #[serde(rename = "billingAccountName")]
    pub billing_account_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiActivationProperties {
    pub project: String,
    pub billing: String,
    pub apis: Vec<String>,
    pub concurrent_api_activation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceAccountsProperties {
    pub project: String,
    #[serde(rename = "service-accounts")]
    pub service_accounts: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketProperties {
    pub project: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetExportBucketProperties {
    pub project: String,
    /// `gs://` URI of the usage-export bucket.
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
}

/// The structure the deployment orchestrator consumes: `{"resources": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphManifest {
    pub resources: Vec<ResourceDescriptor>,
}

impl GraphManifest {
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.resources
            .iter()
            .map(|resource| resource.depends_on().len())
            .sum()
    }
}
