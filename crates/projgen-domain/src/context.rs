use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::Binding;

/// Input handed to the graph builder by the deployment orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub env: DeploymentEnv,
    pub properties: ContextProperties,
}

/// Environment fields the orchestrator fills in for every deployment.
///
/// Keys other than `name` and `project_number` are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEnv {
    pub name: String,
    pub project_number: ProjectNumber,
}

/// Numeric project identifier of the deploying project.
///
/// Manifests carry it either as a string or as a bare integer; both are kept as
/// text because it is only ever spliced into identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "NumericOrText", into = "String")]
pub struct ProjectNumber(String);

impl ProjectNumber {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<NumericOrText> for ProjectNumber {
    fn from(value: NumericOrText) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for ProjectNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ProjectNumber> for String {
    fn from(value: ProjectNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for ProjectNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for ProjectNumber {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for ProjectNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum NumericOrText {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl fmt::Display for NumericOrText {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => value.fmt(formatter),
            Self::Unsigned(value) => value.fmt(formatter),
            Self::Signed(value) => value.fmt(formatter),
        }
    }
}

/// Organization id exactly as the caller wrote it.
///
/// The project's `parent.id` echoes this value, so a numeric id stays numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrganizationId {
    Text(String),
    Numeric(u64),
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => value.fmt(formatter),
            Self::Numeric(value) => value.fmt(formatter),
        }
    }
}

impl From<&str> for OrganizationId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextProperties {
    #[serde(rename = "organization-id")]
    pub organization_id: OrganizationId,
    #[serde(rename = "billing-account-name")]
    pub billing_account_name: String,
    pub apis: Vec<String>,
    pub concurrent_api_activation: bool,
    /// Forwarded verbatim to the service-account expander.
    #[serde(rename = "service-accounts")]
    pub service_accounts: Vec<Value>,
    #[serde(
        rename = "iam-policy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub iam_policy: Option<IamPolicy>,
    #[serde(
        rename = "bucket-export-settings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bucket_export_settings: Option<BucketExportSettings>,
}

/// Caller-supplied policy. Only `bindings` takes part in the owner merge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Vec<Binding>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketExportSettings {
    #[serde(
        rename = "create-bucket",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub create_bucket: Option<bool>,
    #[serde(
        rename = "bucket-name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bucket_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BucketExportSettings {
    /// An empty settings object disables the export feature just like an
    /// absent one does.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create_bucket.is_none() && self.bucket_name.is_none() && self.extra.is_empty()
    }

    #[must_use]
    pub fn creates_bucket(&self) -> bool {
        self.create_bucket.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::{BucketExportSettings, Context, OrganizationId, ProjectNumber};

    fn minimal_context() -> serde_json::Value {
        json!({
            "env": {"name": "demo", "project_number": 42, "deployment": "d"},
            "properties": {
                "organization-id": "1234",
                "billing-account-name": "billingAccounts/0000",
                "apis": ["compute.googleapis.com"],
                "concurrent_api_activation": false,
                "service-accounts": []
            }
        })
    }

    #[test]
    fn project_number_accepts_integers_and_strings() {
        let context: Context = serde_json::from_value(minimal_context()).expect("context");
        assert_eq!(context.env.project_number, ProjectNumber::new("42"));

        let text: ProjectNumber = serde_json::from_value(json!("987")).expect("string number");
        assert_eq!(text.as_str(), "987");
    }

    #[test]
    fn organization_id_keeps_its_json_shape() {
        let numeric: OrganizationId = serde_json::from_value(json!(55)).expect("numeric");
        assert_eq!(serde_json::to_value(&numeric).expect("encode"), json!(55));

        let text: OrganizationId = serde_json::from_value(json!("55")).expect("text");
        assert_eq!(serde_json::to_value(&text).expect("encode"), json!("55"));
    }

    #[test]
    fn optional_properties_default_to_absent() {
        let context: Context = serde_json::from_value(minimal_context()).expect("context");
        assert!(context.properties.iam_policy.is_none());
        assert!(context.properties.bucket_export_settings.is_none());
    }

    #[test]
    fn export_settings_emptiness_tracks_every_key() {
        let empty: BucketExportSettings = serde_json::from_value(json!({})).expect("empty");
        assert!(empty.is_empty());
        assert!(!empty.creates_bucket());

        let unknown: BucketExportSettings =
            serde_json::from_value(json!({"region": "eu"})).expect("unknown key");
        assert!(!unknown.is_empty());

        let create: BucketExportSettings =
            serde_json::from_value(json!({"create-bucket": true})).expect("create");
        assert!(create.creates_bucket());
    }
}
