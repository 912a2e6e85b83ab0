use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the pipeline core.
///
/// Callers branch on the variant: `NotFound` and `Assembly` abort the
/// current account and let the batch continue, everything else terminates
/// the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    #[error("clip assembly failed: {0}")]
    Assembly(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn tool(tool: &str, detail: impl Into<String>) -> Self {
        PipelineError::ExternalTool {
            tool: tool.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether the error only affects the account currently being
    /// processed, leaving the rest of the batch viable.
    pub fn is_per_account(&self) -> bool {
        matches!(
            self,
            PipelineError::NotFound(_)
                | PipelineError::Assembly(_)
                | PipelineError::ExternalTool { .. }
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
