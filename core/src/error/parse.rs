use thiserror::Error;

/// Errors raised while turning makefile text into rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: rule with multiple targets is not supported")]
    MultipleTargets { line: usize },

    #[error("line {line}: rule has no target")]
    MissingTarget { line: usize },

    #[error("line {line}: indented recipe not inside a rule")]
    RecipeOutsideRule { line: usize },
}
