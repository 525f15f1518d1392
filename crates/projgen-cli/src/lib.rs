// Target-specific transitive dependency split (mio/crossterm stack) is accepted for now.
#![allow(clippy::multiple_crate_versions)]

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use minus::{ExitStrategy, Pager, page_all};
use projgen_engine::{
    ProjectScopedApiNames, generate_for_file, generate_for_folder, load_context,
    merge_owner_binding,
};
use projgen_report::{
    ColorChoice, OutputFormat, RenderOptions, render_generation, render_manifest, render_policy,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod error;

pub use error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "projgen",
    about = "Generate deployment resource graphs for cloud projects"
)]
struct Cli {
    /// Log level for diagnostics on stderr (overridden by `RUST_LOG`).
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the resource graph for one context file.
    Generate {
        context: PathBuf,
        #[command(flatten)]
        render: RenderFlags,
    },
    /// Print the IAM policy the project resource will carry.
    Policy {
        context: PathBuf,
        #[command(flatten)]
        render: RenderFlags,
    },
    /// Build resource graphs for every context file under a folder.
    Batch {
        folder: PathBuf,
        #[command(flatten)]
        render: RenderFlags,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Args)]
struct RenderFlags {
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,
    #[arg(long)]
    verbose: bool,
}

impl RenderFlags {
    fn render_options(&self, target: &str) -> RenderOptions {
        RenderOptions {
            color: self.color.into(),
            verbose: self.verbose,
            target: Some(target.to_string()),
        }
    }
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

impl From<ColorArg> for ColorChoice {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

impl LogLevel {
    const fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Run the CLI using process arguments.
///
/// # Errors
///
/// Returns an error when argument parsing fails (excluding help/version) or command
/// execution fails.
pub fn run() -> std::result::Result<i32, CliError> {
    run_from(std::env::args_os())
}

fn run_from<I, T>(args: I) -> std::result::Result<i32, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(error.into()),
        },
    };
    init_logging(cli.log_level);
    let resolver = ProjectScopedApiNames;

    match cli.command {
        Commands::Generate { context, render } => {
            let graph = generate_for_file(&context, &resolver)?;
            debug!(order = ?graph.execution_order().ok(), "execution order");
            let target = context.display().to_string();
            let rendered = render_manifest(
                &graph.into_manifest(),
                render.format.into(),
                &render.render_options(&target),
            )?;
            emit_output(&rendered, render.format.into());
            Ok(0)
        }
        Commands::Policy { context, render } => {
            let loaded = load_context(&context)?;
            let policy = merge_owner_binding(&loaded.env, &loaded.properties);
            let target = loaded.env.name.clone();
            let rendered = render_policy(
                &policy,
                render.format.into(),
                &render.render_options(&target),
            )?;
            emit_output(&rendered, render.format.into());
            Ok(0)
        }
        Commands::Batch { folder, render } => {
            let report = generate_for_folder(&folder, &resolver)?;
            let target = folder.display().to_string();
            let rendered = render_generation(
                &report,
                render.format.into(),
                &render.render_options(&target),
            )?;
            emit_output(&rendered, render.format.into());
            Ok(i32::from(report.has_errors()))
        }
    }
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    // A subscriber may already be installed when the CLI runs in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn emit_output(rendered: &str, format: OutputFormat) {
    if !format.is_structured() && should_use_pager() && page_output(rendered).is_ok() {
        return;
    }

    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
}

fn should_use_pager() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_PAGER").is_none()
}

fn page_output(rendered: &str) -> std::result::Result<(), minus::MinusError> {
    let pager = Pager::new();
    pager.set_exit_strategy(ExitStrategy::PagerQuit)?;
    pager.set_text(rendered)?;
    page_all(pager)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::run_from;
    use crate::CliError;

    fn write_context(path: &Path, name: &str) {
        let context = json!({
            "env": {"name": name, "project_number": "7"},
            "properties": {
                "organization-id": "1",
                "billing-account-name": "billingAccounts/0",
                "apis": ["compute.googleapis.com"],
                "concurrent_api_activation": false,
                "service-accounts": [],
                "bucket-export-settings": {"bucket-name": "usage"}
            }
        });
        fs::write(path, context.to_string()).expect("write context");
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(run_from(["projgen", "--help"]).expect("help"), 0);
    }

    #[test]
    fn unknown_subcommand_is_an_argument_error() {
        let error = run_from(["projgen", "deploy"]).expect_err("must fail");
        assert!(matches!(error, CliError::ArgumentParse(_)));
    }

    #[test]
    fn generate_and_policy_succeed_for_valid_context() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.json");
        write_context(&path, "demo");
        let path = path.to_string_lossy().into_owned();

        let code = run_from(["projgen", "generate", &path, "--format", "json"]).expect("generate");
        assert_eq!(code, 0);
        let code = run_from(["projgen", "policy", &path, "--color", "never"]).expect("policy");
        assert_eq!(code, 0);
    }

    #[test]
    fn missing_property_surfaces_as_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.json");
        fs::write(&path, r#"{"env": {"name": "demo", "project_number": "1"}, "properties": {}}"#)
            .expect("write");
        let path = path.to_string_lossy().into_owned();

        let error = run_from(["projgen", "generate", &path]).expect_err("must fail");
        assert!(error.to_string().contains("properties.organization-id"));
    }

    #[test]
    fn batch_with_failed_context_exits_one() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_context(&temp.path().join("a.json"), "alpha");
        fs::write(temp.path().join("b.json"), "{}").expect("write");
        let folder = temp.path().to_string_lossy().into_owned();

        let code = run_from(["projgen", "batch", &folder, "--format", "json"]).expect("batch");
        assert_eq!(code, 1);
    }
}
