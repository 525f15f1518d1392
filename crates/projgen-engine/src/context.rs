use std::fs;
use std::path::Path;

use projgen_domain::Context;
use serde_json::{Map, Value};

use crate::error::ContextError;

const REQUIRED_ENV_KEYS: [&str; 2] = ["name", "project_number"];
const REQUIRED_PROPERTY_KEYS: [&str; 5] = [
    "organization-id",
    "billing-account-name",
    "apis",
    "concurrent_api_activation",
    "service-accounts",
];

/// Extensions recognised as context files.
pub const CONTEXT_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Decode a context, naming the first required key that is absent.
///
/// # Errors
///
/// Returns [`ContextError::MissingProperty`] with a dotted key path when a
/// required key is absent, and [`ContextError::InvalidProperty`] when a value
/// has the wrong shape.
pub fn context_from_value(value: Value) -> Result<Context, ContextError> {
    let Some(root) = value.as_object() else {
        return Err(ContextError::NotAnObject {
            key: "context".to_string(),
        });
    };
    require_keys(root, "env", &REQUIRED_ENV_KEYS)?;
    require_keys(root, "properties", &REQUIRED_PROPERTY_KEYS)?;

    serde_json::from_value(value).map_err(|source| ContextError::InvalidProperty { source })
}

fn require_keys(
    root: &Map<String, Value>,
    section: &str,
    keys: &[&str],
) -> Result<(), ContextError> {
    let Some(value) = root.get(section) else {
        return Err(ContextError::MissingProperty {
            key: section.to_string(),
        });
    };
    let Some(object) = value.as_object() else {
        return Err(ContextError::NotAnObject {
            key: section.to_string(),
        });
    };

    match keys.iter().find(|key| !object.contains_key(**key)) {
        Some(key) => Err(ContextError::MissingProperty {
            key: format!("{section}.{key}"),
        }),
        None => Ok(()),
    }
}

/// Read a JSON or YAML context file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, has an unsupported
/// extension, or does not describe a valid context.
pub fn load_context(path: &Path) -> Result<Context, ContextError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let raw = fs::read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = match extension.as_deref() {
        Some("json") => serde_json::from_str(&raw).map_err(|source| ContextError::ParseJson {
            path: path.to_path_buf(),
            source,
        })?,
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&raw).map_err(|source| ContextError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => {
            return Err(ContextError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    context_from_value(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::fs;

    use serde_json::json;

    use super::{context_from_value, load_context};
    use crate::error::ContextError;

    fn valid() -> serde_json::Value {
        json!({
            "env": {"name": "demo", "project_number": "42"},
            "properties": {
                "organization-id": "1",
                "billing-account-name": "billingAccounts/0",
                "apis": [],
                "concurrent_api_activation": false,
                "service-accounts": []
            }
        })
    }

    fn missing_key(mut value: serde_json::Value, section: &str, key: &str) -> String {
        value[section]
            .as_object_mut()
            .expect("section object")
            .remove(key);
        match context_from_value(value) {
            Err(ContextError::MissingProperty { key }) => key,
            other => format!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn decodes_valid_context() {
        let context = context_from_value(valid()).expect("context");
        assert_eq!(context.env.name, "demo");
        assert_eq!(context.env.project_number.as_str(), "42");
    }

    #[test]
    fn names_each_missing_required_key() {
        assert_eq!(missing_key(valid(), "env", "name"), "env.name");
        assert_eq!(
            missing_key(valid(), "env", "project_number"),
            "env.project_number"
        );
        for key in [
            "organization-id",
            "billing-account-name",
            "apis",
            "concurrent_api_activation",
            "service-accounts",
        ] {
            assert_eq!(
                missing_key(valid(), "properties", key),
                format!("properties.{key}")
            );
        }
    }

    #[test]
    fn missing_section_is_named() {
        let error = context_from_value(json!({"env": {"name": "x", "project_number": "1"}}))
            .expect_err("must fail");
        assert!(matches!(error, ContextError::MissingProperty { ref key } if key == "properties"));
    }

    #[test]
    fn wrongly_typed_value_is_invalid() {
        let mut value = valid();
        value["properties"]["apis"] = json!("compute.googleapis.com");
        let error = context_from_value(value).expect_err("must fail");
        assert!(matches!(error, ContextError::InvalidProperty { .. }));
    }

    #[test]
    fn loads_json_and_yaml_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let json_path = temp.path().join("project.json");
        fs::write(&json_path, valid().to_string()).expect("write json");
        let yaml_path = temp.path().join("project.yaml");
        fs::write(
            &yaml_path,
            "env:\n  name: demo\n  project_number: 42\nproperties:\n  organization-id: \"1\"\n  billing-account-name: billingAccounts/0\n  apis: [compute.googleapis.com]\n  concurrent_api_activation: true\n  service-accounts: []\n",
        )
        .expect("write yaml");

        let from_json = load_context(&json_path).expect("json context");
        let from_yaml = load_context(&yaml_path).expect("yaml context");
        assert_eq!(from_json.env.name, from_yaml.env.name);
        assert_eq!(from_yaml.env.project_number.as_str(), "42");
        assert_eq!(from_yaml.properties.apis, vec!["compute.googleapis.com"]);
    }

    #[test]
    fn rejects_unknown_extension() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("project.toml");
        fs::write(&path, "").expect("write");
        let error = load_context(&path).expect_err("must fail");
        assert!(matches!(error, ContextError::UnsupportedFormat { .. }));
    }
}
