use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize {subject} as JSON")]
    JsonSerialize {
        subject: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize {subject} as YAML")]
    YamlSerialize {
        subject: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
}
