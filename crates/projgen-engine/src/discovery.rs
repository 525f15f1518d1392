use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::context::CONTEXT_EXTENSIONS;
use crate::error::DiscoveryError;

/// Directories that hold generated output rather than contexts.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Recursively discover context files (`*.json`, `*.yaml`, `*.yml`) under a
/// root directory.
///
/// Hidden entries (`.git`, editor backups) and `target` or `node_modules`
/// directories are skipped. The root is always walked.
///
/// # Errors
///
/// Returns an error if `root` is invalid, directory walking fails, or a context
/// path cannot be canonicalized.
pub fn discover_contexts(root: &Path) -> std::result::Result<Vec<PathBuf>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::RootDoesNotExist {
            root: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(DiscoveryError::RootIsNotDirectory {
            root: root.to_path_buf(),
        });
    }

    let mut contexts = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));
    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Walk { source })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(extension) = entry.path().extension().and_then(|ext| ext.to_str()) else {
            continue;
        };

        if !CONTEXT_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
        {
            continue;
        }

        let canonical =
            fs::canonicalize(entry.path()).map_err(|source| DiscoveryError::CanonicalizePath {
                path: entry.path().to_path_buf(),
                source,
            })?;
        contexts.push(canonical);
    }

    contexts.sort();
    Ok(contexts)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::fs;

    use super::discover_contexts;
    use crate::error::DiscoveryError;

/// Directories that hold generated output rather than contexts.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

    #[test]
    fn finds_only_context_files_in_sorted_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("a")).expect("mkdir");
        fs::create_dir_all(root.join("z/nested")).expect("mkdir");
        fs::write(root.join("z/nested/two.yaml"), "").expect("write");
        fs::write(root.join("a/one.json"), "").expect("write");
        fs::write(root.join("a/three.YML"), "").expect("write");
        fs::write(root.join("a/ignore.txt"), "").expect("write");

        let contexts = discover_contexts(root).expect("discover");
        assert_eq!(contexts.len(), 3);
        assert!(contexts[0].ends_with("a/one.json"));
        assert!(contexts[1].ends_with("a/three.YML"));
        assert!(contexts[2].ends_with("z/nested/two.yaml"));
    }

    #[test]
    fn skips_hidden_entries_and_output_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join(".contexts");
        for dir in [".git", "target/out", "team"] {
            fs::create_dir_all(root.join(dir)).expect("mkdir");
        }
        fs::write(root.join(".git/config.json"), "").expect("write");
        fs::write(root.join("target/out/rendered.yaml"), "").expect("write");
        fs::write(root.join("team/.draft.yaml"), "").expect("write");
        fs::write(root.join("team/target.yaml"), "").expect("write");
        fs::write(root.join("team/alpha.json"), "").expect("write");

        let contexts = discover_contexts(&root).expect("discover");
        assert_eq!(contexts.len(), 2);
        assert!(contexts[0].ends_with("team/alpha.json"));
        assert!(contexts[1].ends_with("team/target.yaml"));
    }

    #[test]
    fn rejects_missing_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = discover_contexts(&temp.path().join("absent")).expect_err("must fail");
        assert!(matches!(error, DiscoveryError::RootDoesNotExist { .. }));
    }
}
