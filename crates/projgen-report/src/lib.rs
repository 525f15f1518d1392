use std::fmt::Write;
use std::io::{self, IsTerminal};

use console::Style;
use projgen_domain::{
    ContextOutcome, GenerationReport, GraphManifest, Policy, ResourceDescriptor,
};
use serde::Serialize;

mod error;
mod options;

pub use error::ReportError;
pub use options::{ColorChoice, OutputFormat, RenderOptions};

/// Render a resource graph manifest in the requested output format.
///
/// # Errors
///
/// Returns an error if JSON or YAML serialization fails.
pub fn render_manifest(
    manifest: &GraphManifest,
    format: OutputFormat,
    options: &RenderOptions,
) -> std::result::Result<String, ReportError> {
    match format {
        OutputFormat::Text => Ok(render_manifest_text(manifest, options)),
        structured => serialize("manifest", manifest, structured),
    }
}

/// Render a merged IAM policy in the requested output format.
///
/// # Errors
///
/// Returns an error if JSON or YAML serialization fails.
pub fn render_policy(
    policy: &Policy,
    format: OutputFormat,
    options: &RenderOptions,
) -> std::result::Result<String, ReportError> {
    match format {
        OutputFormat::Text => Ok(render_policy_text(policy, options)),
        structured => serialize("policy", policy, structured),
    }
}

/// Render a batch generation report in the requested output format.
///
/// # Errors
///
/// Returns an error if JSON or YAML serialization fails.
pub fn render_generation(
    report: &GenerationReport,
    format: OutputFormat,
    options: &RenderOptions,
) -> std::result::Result<String, ReportError> {
    match format {
        OutputFormat::Text => Ok(render_generation_text(report, options)),
        structured => serialize("generation report", report, structured),
    }
}

fn serialize<T: Serialize>(
    subject: &'static str,
    value: &T,
    format: OutputFormat,
) -> std::result::Result<String, ReportError> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|source| ReportError::YamlSerialize { subject, source }),
        OutputFormat::Json | OutputFormat::Text => serde_json::to_string_pretty(value)
            .map_err(|source| ReportError::JsonSerialize { subject, source }),
    }
}

// ---------------------------------------------------------------------------
// Manifest text
// ---------------------------------------------------------------------------

fn render_manifest_text(manifest: &GraphManifest, options: &RenderOptions) -> String {
    let mut output = String::new();
    let style = TextStyle::new(options.color);

    append_header(&mut output, "generate", options.target.as_deref(), &style);

    if manifest.resources.is_empty() {
        let _ = writeln!(output, "  Nothing to do.");
        return output;
    }

    let _ = writeln!(output);
    for resource in &manifest.resources {
        append_resource_lines(&mut output, resource, "  ", options, &style);
    }

    let _ = writeln!(output);
    let tally = GraphTally::from_manifest(manifest);
    let _ = writeln!(output, "{}", tally.format(&style));

    output
}

fn append_resource_lines(
    output: &mut String,
    resource: &ResourceDescriptor,
    indent: &str,
    options: &RenderOptions,
    style: &TextStyle,
) {
    let (symbol, label) = if resource.kind.is_action() {
        (
            style.action_symbol("~"),
            TextStyle::pad_label(&style.action_label(resource.properties.label())),
        )
    } else {
        (
            style.add_symbol("+"),
            TextStyle::pad_label(&style.add_label(resource.properties.label())),
        )
    };
    let _ = writeln!(
        output,
        "{indent}{symbol} {label}{}",
        style.primary_text(&resource.name)
    );

    let nested = format!("{indent}    ");
    if options.verbose {
        let kind = if resource.kind.is_action() {
            "action"
        } else {
            "type"
        };
        let _ = writeln!(
            output,
            "{nested}{}",
            style.dim(&format!("{kind}: {}", resource.kind.tag()))
        );
    }

    if !resource.depends_on().is_empty() {
        let _ = writeln!(
            output,
            "{nested}{}",
            style.dim(&format!("after: {}", resource.depends_on().join(", ")))
        );
    }

    if options.verbose
        && let Some(policy) = resource.policy()
    {
        for binding in &policy.bindings {
            let _ = writeln!(
                output,
                "{nested}{}",
                style.dim(&format!("{}: {}", binding.role, binding.members.join(", ")))
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Policy text
// ---------------------------------------------------------------------------

fn render_policy_text(policy: &Policy, options: &RenderOptions) -> String {
    let mut output = String::new();
    let style = TextStyle::new(options.color);

    append_header(&mut output, "policy", options.target.as_deref(), &style);

    if policy.bindings.is_empty() {
        let _ = writeln!(output, "  No bindings.");
        return output;
    }

    let _ = writeln!(output);
    for binding in &policy.bindings {
        let _ = writeln!(output, "  {}", style.primary_text(&binding.role));
        for member in &binding.members {
            let _ = writeln!(output, "    {member}");
        }
        if options.verbose && !binding.extra.is_empty() {
            let keys = binding
                .extra
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "    {}", style.dim(&format!("also: {keys}")));
        }
    }

    let members: usize = policy
        .bindings
        .iter()
        .map(|binding| binding.members.len())
        .sum();
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} {} {}, {} {}",
        style.tally_label("Policy:"),
        policy.bindings.len(),
        plural(policy.bindings.len(), "binding", "bindings"),
        members,
        plural(members, "member", "members"),
    );

    output
}

// ---------------------------------------------------------------------------
// Batch text
// ---------------------------------------------------------------------------

fn render_generation_text(report: &GenerationReport, options: &RenderOptions) -> String {
    let mut output = String::new();
    let style = TextStyle::new(options.color);

    append_header(&mut output, "batch", options.target.as_deref(), &style);

    if report.outcomes.is_empty() {
        let _ = writeln!(output, "  Nothing to do.");
        append_errors(&mut output, &report.errors, &style);
        return output;
    }

    let _ = writeln!(output);
    append_errors(&mut output, &report.errors, &style);
    for outcome in &report.outcomes {
        append_outcome_lines(&mut output, outcome, options, &style);
    }

    let _ = writeln!(output);
    let generated = report.outcomes.len() - report.failed_count();
    let mut parts = Vec::new();
    if generated > 0 {
        parts.push(style.add_label(&format!("{generated} generated")));
    }
    if report.failed_count() > 0 {
        parts.push(style.error_label(&format!("{} failed", report.failed_count())));
    }
    let _ = writeln!(output, "{} {}", style.tally_label("Batch:"), parts.join(", "));

    output
}

fn append_outcome_lines(
    output: &mut String,
    outcome: &ContextOutcome,
    options: &RenderOptions,
    style: &TextStyle,
) {
    let context = outcome.context.display().to_string();
    if let Some(error) = &outcome.error {
        let _ = writeln!(
            output,
            "  {} {}{}",
            style.error_symbol("!"),
            TextStyle::pad_label(&style.error_label("failed")),
            style.primary_text(&context)
        );
        let _ = writeln!(output, "    {} {error}", style.error_prefix("error:"));
        return;
    }

    let project = outcome.project_id.as_deref().unwrap_or("-");
    let _ = writeln!(
        output,
        "  {} {}{} {}",
        style.add_symbol("+"),
        TextStyle::pad_label(&style.add_label(project)),
        style.primary_text(&context),
        style.dim(&format!(
            "({} {})",
            outcome.resource_count(),
            plural(outcome.resource_count(), "resource", "resources")
        ))
    );

    if options.verbose
        && let Some(manifest) = &outcome.manifest
    {
        for resource in &manifest.resources {
            append_resource_lines(output, resource, "      ", options, style);
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn append_header(output: &mut String, command: &str, target: Option<&str>, style: &TextStyle) {
    let _ = write!(output, "{}", style.header_command(command));
    if let Some(t) = target {
        let _ = write!(output, " {}", style.header_target(t));
    }
    let _ = writeln!(output);
}

fn append_errors(output: &mut String, errors: &[String], style: &TextStyle) {
    if errors.is_empty() {
        return;
    }
    for e in errors {
        let _ = writeln!(output, "  {} {e}", style.error_prefix("error:"));
    }
    let _ = writeln!(output);
}

const fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

// ---------------------------------------------------------------------------
// Graph Tally
// ---------------------------------------------------------------------------

struct GraphTally {
    typed: usize,
    actions: usize,
    edges: usize,
}

impl GraphTally {
    fn from_manifest(manifest: &GraphManifest) -> Self {
        let actions = manifest
            .resources
            .iter()
            .filter(|resource| resource.kind.is_action())
            .count();
        Self {
            typed: manifest.resources.len() - actions,
            actions,
            edges: manifest.edge_count(),
        }
    }

    fn format(&self, style: &TextStyle) -> String {
        let mut parts = vec![style.add_label(&format!("{} to create", self.typed))];
        if self.actions > 0 {
            parts.push(style.action_label(&format!(
                "{} {}",
                self.actions,
                plural(self.actions, "action", "actions")
            )));
        }
        parts.push(style.dim(&format!(
            "{} dependency {}",
            self.edges,
            plural(self.edges, "edge", "edges")
        )));
        format!("{} {}", style.tally_label("Graph:"), parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// TextStyle
// ---------------------------------------------------------------------------

const LABEL_WIDTH: usize = 18;

#[derive(Debug, Clone)]
struct TextStyle {
    color_enabled: bool,
    // Symbols
    add_sym_style: Style,
    action_sym_style: Style,
    error_sym_style: Style,
    // Labels
    add_label_style: Style,
    action_label_style: Style,
    error_label_style: Style,
    // Content
    primary_style: Style,
    dim_style: Style,
    // Header
    header_cmd_style: Style,
    header_target_style: Style,
    // Prefixes
    error_prefix_style: Style,
    // Tally
    tally_label_style: Style,
}

impl TextStyle {
    fn new(choice: ColorChoice) -> Self {
        let enabled = should_color(choice);
        Self {
            color_enabled: enabled,
            add_sym_style: Style::new().green().bold(),
            action_sym_style: Style::new().cyan().bold(),
            error_sym_style: Style::new().red().bold(),
            add_label_style: Style::new().green(),
            action_label_style: Style::new().cyan(),
            error_label_style: Style::new().red(),
            primary_style: Style::new().white(),
            dim_style: Style::new().dim(),
            header_cmd_style: Style::new().white().bold(),
            header_target_style: Style::new().dim(),
            error_prefix_style: Style::new().red().bold(),
            tally_label_style: Style::new().white().bold(),
        }
    }

    fn paint<T: std::fmt::Display>(&self, style: &Style, text: T) -> String {
        if self.color_enabled {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn pad_label(painted: &str) -> String {
        // Compute visible length (strip ANSI codes)
        let visible_len = console::measure_text_width(painted);
        if visible_len < LABEL_WIDTH {
            format!("{painted}{}", " ".repeat(LABEL_WIDTH - visible_len))
        } else {
            format!("{painted} ")
        }
    }

    // Symbols
    fn add_symbol(&self, s: &str) -> String {
        self.paint(&self.add_sym_style, s)
    }
    fn action_symbol(&self, s: &str) -> String {
        self.paint(&self.action_sym_style, s)
    }
    fn error_symbol(&self, s: &str) -> String {
        self.paint(&self.error_sym_style, s)
    }

    // Labels
    fn add_label(&self, s: &str) -> String {
        self.paint(&self.add_label_style, s)
    }
    fn action_label(&self, s: &str) -> String {
        self.paint(&self.action_label_style, s)
    }
    fn error_label(&self, s: &str) -> String {
        self.paint(&self.error_label_style, s)
    }

    // Content
    fn primary_text(&self, s: &str) -> String {
        self.paint(&self.primary_style, s)
    }
    fn dim(&self, s: &str) -> String {
        self.paint(&self.dim_style, s)
    }

    // Header
    fn header_command(&self, s: &str) -> String {
        self.paint(&self.header_cmd_style, s)
    }
    fn header_target(&self, s: &str) -> String {
        self.paint(&self.header_target_style, s)
    }

    // Prefixes
    fn error_prefix(&self, s: &str) -> String {
        self.paint(&self.error_prefix_style, s)
    }

    // Tally
    fn tally_label(&self, s: &str) -> String {
        self.paint(&self.tally_label_style, s)
    }
}

fn should_color(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stdout().is_terminal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
