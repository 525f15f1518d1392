use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

static BUILD_PROJGEN: OnceLock<Result<(), String>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub command_line: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    #[must_use]
    pub fn transcript(&self) -> String {
        format!(
            "$ {}\n[exit: {}]\n[stdout]\n{}[stderr]\n{}",
            self.command_line, self.exit_code, self.stdout, self.stderr
        )
    }
}

/// Run `projgen <subcommand> <target> <flags...>` as an external process.
///
/// `NO_PAGER=1` is always set and `RUST_LOG` cleared to keep output
/// deterministic for assertions.
///
/// # Errors
///
/// Returns an error if building/running the `projgen` binary fails.
pub fn run_projgen(
    subcommand: &str,
    target: &Path,
    flags: &[&str],
    env_overrides: &[(String, String)],
) -> Result<RunResult, String> {
    ensure_projgen_built()?;
    let bin = projgen_bin()?;

    let mut command = Command::new(bin);
    command.env("NO_PAGER", "1");
    command.env_remove("RUST_LOG");
    command.arg(subcommand);
    command.arg(target);
    command.args(flags);

    let mut command_parts = vec![
        "projgen".to_string(),
        subcommand.to_string(),
        target.display().to_string(),
    ];
    command_parts.extend(flags.iter().map(|flag| (*flag).to_string()));

    for (name, value) in env_overrides {
        command.env(name, value);
    }

    let output = command
        .output()
        .map_err(|error| format!("failed to run projgen {subcommand}: {error}"))?;

    Ok(RunResult {
        command_line: command_parts.join(" "),
        exit_code: output.status.code().unwrap_or(1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Write a text file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directories or file contents cannot be written.
pub fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// A YAML context with every required key. Each line of `extra` is nested
/// under `properties`.
#[must_use]
pub fn context_yaml(name: &str, project_number: &str, extra: &str) -> String {
    let mut yaml = format!(
        "env:\n  name: {name}\n  project_number: \"{project_number}\"\nproperties:\n  organization-id: \"424242\"\n  billing-account-name: billingAccounts/000000-AAAAAA-BBBBBB\n  apis:\n    - compute.googleapis.com\n    - storage-component.googleapis.com\n  concurrent_api_activation: true\n  service-accounts:\n    - accountId: deployer\n      displayName: Deployer\n"
    );
    for line in extra.lines() {
        yaml.push_str("  ");
        yaml.push_str(line);
        yaml.push('\n');
    }
    yaml
}

fn ensure_projgen_built() -> Result<(), String> {
    match BUILD_PROJGEN.get_or_init(|| {
        let status = Command::new("cargo")
            .arg("build")
            .arg("-q")
            .arg("-p")
            .arg("projgen")
            .status()
            .map_err(|error| format!("failed to build projgen binary: {error}"))?;

        if status.success() {
            Ok(())
        } else {
            Err(format!(
                "failed to build projgen binary: cargo exited with status {status}"
            ))
        }
    }) {
        Ok(()) => Ok(()),
        Err(error) => Err(error.clone()),
    }
}

fn projgen_bin() -> Result<PathBuf, String> {
    let mut path = std::env::current_exe()
        .map_err(|error| format!("failed to determine current executable: {error}"))?;
    if !path.pop() {
        return Err("failed to resolve test executable directory".to_string());
    }
    if path.ends_with("deps") {
        let _ = path.pop();
    }
    Ok(path.join(format!("projgen{}", std::env::consts::EXE_SUFFIX)))
}
