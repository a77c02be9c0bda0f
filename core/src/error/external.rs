use std::process::ExitStatus;

use thiserror::Error;

/// Errors from handing a build to a system `make`.
#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("failed to write temporary makefile: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

impl ExternalError {
    /// The child's exit code, when it ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { status, .. } => status.code(),
            _ => None,
        }
    }
}
