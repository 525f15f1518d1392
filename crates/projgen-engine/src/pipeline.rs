use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use projgen_domain::{ContextOutcome, GenerationReport};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    ApiNameResolver, PipelineError, ResourceGraph, build_graph, discover_contexts, load_context,
};

/// Load a context file and build its resource graph.
///
/// # Errors
///
/// Returns an error when the context cannot be loaded or the graph cannot be
/// built.
pub fn generate_for_file(
    path: &Path,
    resolver: &dyn ApiNameResolver,
) -> std::result::Result<ResourceGraph, PipelineError> {
    let context = load_context(path)?;
    let graph = build_graph(&context, resolver)?;
    info!(
        context = %path.display(),
        project = %context.env.name,
        resources = graph.len(),
        "built resource graph"
    );
    Ok(graph)
}

/// Build graphs for every context file under a folder.
///
/// Contexts are processed in parallel. A context that fails to load or build
/// is recorded in its outcome and does not stop the others.
///
/// # Errors
///
/// Returns an error when discovery fails or no context files are found.
pub fn generate_for_folder(
    folder: &Path,
    resolver: &dyn ApiNameResolver,
) -> std::result::Result<GenerationReport, PipelineError> {
    let contexts = discover_contexts(folder)?;
    if contexts.is_empty() {
        return Err(PipelineError::NoContexts {
            folder: folder.to_path_buf(),
        });
    }

    let outcomes: Vec<ContextOutcome> = contexts
        .par_iter()
        .map(|path| generate_outcome(path, resolver))
        .collect();

    let report = GenerationReport {
        errors: duplicate_project_errors(&outcomes),
        discovered_contexts: contexts,
        outcomes,
    };
    info!(
        contexts = report.outcomes.len(),
        failed = report.failed_count(),
        "batch generation finished"
    );
    Ok(report)
}

fn generate_outcome(path: &Path, resolver: &dyn ApiNameResolver) -> ContextOutcome {
    let graph = match generate_for_file(path, resolver) {
        Ok(graph) => graph,
        Err(error) => {
            warn!(context = %path.display(), %error, "context failed");
            return ContextOutcome::failed(path.to_path_buf(), error.to_string());
        }
    };

    let execution_order = match graph.execution_order() {
        Ok(order) => order,
        Err(error) => return ContextOutcome::failed(path.to_path_buf(), error.to_string()),
    };
    let project_id = graph
        .resources()
        .first()
        .map(|project| project.name.clone());

    ContextOutcome {
        context: path.to_path_buf(),
        project_id,
        manifest: Some(graph.into_manifest()),
        execution_order,
        error: None,
    }
}

// Two contexts creating the same project would collide at deploy time.
fn duplicate_project_errors(outcomes: &[ContextOutcome]) -> Vec<String> {
    let mut owners: BTreeMap<&str, Vec<&PathBuf>> = BTreeMap::new();
    for outcome in outcomes {
        if let Some(project_id) = &outcome.project_id {
            owners
                .entry(project_id.as_str())
                .or_default()
                .push(&outcome.context);
        }
    }

    owners
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(project_id, paths)| {
            let listed = paths
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("project `{project_id}` is generated by multiple contexts: {listed}")
        })
        .collect()
}
