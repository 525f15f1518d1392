use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    ArgumentParse(#[from] clap::Error),
    #[error(transparent)]
    Context(#[from] projgen_engine::ContextError),
    #[error(transparent)]
    Pipeline(#[from] projgen_engine::PipelineError),
    #[error(transparent)]
    Report(#[from] projgen_report::ReportError),
}
