use crate::error::RecipeFailure;

/// What happened to one target in a level.
#[derive(Debug, Clone)]
pub struct TargetResult {
    pub target: String,
    pub outcome: TargetOutcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub enum TargetOutcome {
    Built,
    Failed(RecipeFailure),
    /// Never started because the build was cancelled first.
    Skipped,
}

impl TargetResult {
    pub fn built(target: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            target: target.into(),
            outcome: TargetOutcome::Built,
            duration_ms,
        }
    }

    pub fn failed(failure: RecipeFailure, duration_ms: u64) -> Self {
        Self {
            target: failure.target.clone(),
            outcome: TargetOutcome::Failed(failure),
            duration_ms,
        }
    }

    pub fn skipped(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            outcome: TargetOutcome::Skipped,
            duration_ms: 0,
        }
    }
}

/// Summary of a completed build.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub levels: usize,
    /// Targets whose recipes ran, in completion order.
    pub built: Vec<String>,
    pub duration_ms: u64,
}
