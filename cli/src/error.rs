use std::path::PathBuf;

use makex_core::{ExternalError, MakeError, ParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("makex: {}: {source}", .path.display())]
    ReadMakefile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("makex: {0}")]
    Parse(#[from] ParseError),

    #[error("makex: {0}")]
    Make(#[from] MakeError),

    #[error("makex: {0}")]
    External(#[from] ExternalError),

    #[error("makex: {0}")]
    Io(#[from] std::io::Error),
}
