/// Output encoding. `Json` and `Yaml` emit the exact structure the deployment
/// orchestrator consumes; `Text` is a human summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    #[must_use]
    pub const fn is_structured(self) -> bool {
        !matches!(self, Self::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: ColorChoice,
    /// Show type tags and policy members in text output.
    pub verbose: bool,
    pub target: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            verbose: false,
            target: None,
        }
    }
}
