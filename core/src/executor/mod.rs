//! Level-by-level build execution.
//!
//! # Architecture
//!
//! ```text
//! Plan::levels_needing_build() -> Vec<Vec<String>>
//!   ↓
//! ExecutionEngine::execute_levels()          one level at a time
//!   ↓
//! execute_level_parallel()                   Semaphore(jobs) + FuturesUnordered
//!   ↓
//! run_recipes()                              <shell> -c <line>, output captured
//!   ↓
//! BuildSummary | MakeError::LevelFailed | MakeError::Cancelled
//! ```

mod cancel;
mod engine;
mod output;
mod progress;
mod recipe;
mod scheduler;
pub mod types;

pub use cancel::Cancellation;
pub use engine::ExecutionEngine;
pub use output::{
    emit_command, emit_failure, emit_level_end, emit_level_start, emit_plan, emit_run_end,
    write_dry_run, LogSink, SharedBuffer,
};
pub use progress::ProgressMonitor;
pub use recipe::{run_recipes, CAPTURE_BYTES, OUTPUT_DRAIN_TIMEOUT};
pub use scheduler::execute_level_parallel;
pub use types::{BuildSummary, TargetOutcome, TargetResult};
