use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("missing required property `{key}`")]
    MissingProperty { key: String },
    #[error("`{key}` must be an object")]
    NotAnObject { key: String },
    #[error("invalid context: {source}")]
    InvalidProperty {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read context: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported context format (expected .json, .yaml or .yml): {path}")]
    UnsupportedFormat { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("resource `{name}` is declared more than once")]
    DuplicateResource { name: String },
    #[error("resource `{resource}` depends on unknown resource `{dependency}`")]
    DanglingDependency { resource: String, dependency: String },
    #[error("{message}")]
    Invariant { message: String },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing required property `{key}`")]
    MissingProperty { key: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("context root does not exist: {root}")]
    RootDoesNotExist { root: PathBuf },
    #[error("context root must be a directory: {root}")]
    RootIsNotDirectory { root: PathBuf },
    #[error("failed while walking context directory")]
    Walk {
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to canonicalize context path: {path}")]
    CanonicalizePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("no contexts found under {folder} (expected .json, .yaml or .yml files)")]
    NoContexts { folder: PathBuf },
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Build(#[from] BuildError),
}
