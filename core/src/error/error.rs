use thiserror::Error;

use super::parse::ParseError;

/// Errors raised while planning or running a build.
#[derive(Error, Debug)]
pub enum MakeError {
    #[error("no rule to make target {target:?}{}", needed_by_suffix(.needed_by))]
    UndefinedTarget {
        target: String,
        needed_by: Option<String>,
    },

    #[error("circular dependency for target {target:?}: [{}]", .deps.join(" "))]
    CircularDependency { target: String, deps: Vec<String> },

    #[error("{} failed in level {level}: {}", count_targets(.failures.len()), join_failures(.failures))]
    LevelFailed {
        level: usize,
        failures: Vec<RecipeFailure>,
    },

    #[error("build cancelled")]
    Cancelled,

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl MakeError {
    pub fn undefined(target: impl Into<String>) -> Self {
        Self::UndefinedTarget {
            target: target.into(),
            needed_by: None,
        }
    }

    /// True for errors detected before any recipe was started.
    pub fn is_planning(&self) -> bool {
        matches!(
            self,
            Self::UndefinedTarget { .. } | Self::CircularDependency { .. } | Self::Parse(_)
        )
    }
}

/// A single target whose recipe did not complete.
#[derive(Error, Debug, Clone)]
#[error("target {target:?}: command `{command}` failed: {reason}")]
pub struct RecipeFailure {
    pub target: String,
    /// Text of the command that failed.
    pub command: String,
    /// Exit status or spawn error.
    pub reason: String,
    /// Merged stdout/stderr captured up to the failure.
    pub output: String,
}

fn needed_by_suffix(needed_by: &Option<String>) -> String {
    match needed_by {
        Some(parent) => format!(", needed by {parent:?}"),
        None => String::new(),
    }
}

fn count_targets(n: usize) -> String {
    if n == 1 {
        "1 target".to_string()
    } else {
        format!("{n} targets")
    }
}

fn join_failures(failures: &[RecipeFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
