//! CLI errors.

use thiserror::Error;

/// Errors of a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading, processing or checking the model failed.
    ///
    /// Constraint violations are shown verbatim.
    #[error("{0}")]
    Core(#[from] ormdoc_core::Error),

    /// Rendering JSON output failed.
    #[error("cannot render output: {0}")]
    Output(#[from] serde_json::Error),
}
