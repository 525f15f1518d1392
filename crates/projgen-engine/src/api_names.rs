/// Maps an API identifier to the name of the resource that activates it.
///
/// Dependency edges on activated APIs (for example `compute.googleapis.com`)
/// point at these names.
pub trait ApiNameResolver: Send + Sync {
    fn resolve(&self, project_id: &str, api: &str) -> String;
}

/// Naming used by the `apis.py` expander: `<project id>-<api>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectScopedApiNames;

impl ApiNameResolver for ProjectScopedApiNames {
    fn resolve(&self, project_id: &str, api: &str) -> String {
        format!("{project_id}-{api}")
    }
}
