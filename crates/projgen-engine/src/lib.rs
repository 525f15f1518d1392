mod api_names;
mod builder;
mod context;
mod discovery;
mod error;
mod graph;
mod pipeline;
mod policy;

pub use api_names::{ApiNameResolver, ProjectScopedApiNames};
pub use builder::{
    APIS_RESOURCE, COMPUTE_API, SERVICE_ACCOUNTS_RESOURCE, SET_EXPORT_BUCKET_RESOURCE,
    STORAGE_COMPONENT_API, build_graph,
};
pub use context::{CONTEXT_EXTENSIONS, context_from_value, load_context};
pub use discovery::discover_contexts;
pub use error::{BuildError, ContextError, DiscoveryError, GraphError, PipelineError};
pub use graph::ResourceGraph;
pub use pipeline::{generate_for_file, generate_for_folder};
pub use policy::{merge_owner_binding, owner_identity};
