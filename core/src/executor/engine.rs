use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::Config;
use crate::error::{MakeError, RecipeFailure};
use crate::makefile::RuleIndex;

use super::output::{emit_failure, emit_level_end, emit_level_start, emit_plan, emit_run_end};
use super::progress::ProgressMonitor;
use super::recipe::run_recipes;
use super::scheduler::execute_level_parallel;
use super::types::{BuildSummary, TargetOutcome, TargetResult};

/// Runs planned levels against a makefile.
pub struct ExecutionEngine<'a> {
    config: &'a Config,
    rules: &'a RuleIndex<'a>,
    phony: &'a HashSet<String>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(config: &'a Config, rules: &'a RuleIndex<'a>, phony: &'a HashSet<String>) -> Self {
        Self {
            config,
            rules,
            phony,
        }
    }

    /// Levels run one after another; targets within a level run in parallel.
    ///
    /// Stops after the first level with a failure, once every target already
    /// dispatched in that level has finished.
    #[tracing::instrument(name = "build", skip_all, fields(levels = levels.len(), jobs = self.config.jobs()))]
    pub async fn execute_levels(&self, levels: &[Vec<String>]) -> Result<BuildSummary, MakeError> {
        let start = Instant::now();
        let total_targets: usize = levels.iter().map(Vec::len).sum();
        let progress = Mutex::new(ProgressMonitor::new(
            total_targets,
            self.config.progress && !self.config.verbose,
        ));
        let cancel = &self.config.cancel;

        emit_plan(self.config, levels);

        let mut built = Vec::with_capacity(total_targets);
        for (level, targets) in levels.iter().enumerate() {
            if cancel.is_cancelled() {
                finish(&progress, false);
                return Err(MakeError::Cancelled);
            }

            emit_level_start(self.config, level, targets);
            if let Ok(monitor) = progress.lock() {
                monitor.update_level(level, levels.len());
            }

            let level_start = Instant::now();
            let results = execute_level_parallel(targets, self.config.jobs(), cancel, |target| {
                self.build_target(target, &progress)
            })
            .await;

            let mut failures: Vec<RecipeFailure> = Vec::new();
            for result in results {
                match result.outcome {
                    TargetOutcome::Built => built.push(result.target),
                    TargetOutcome::Failed(failure) => failures.push(failure),
                    TargetOutcome::Skipped => {}
                }
            }
            emit_level_end(level, failures.len(), level_start.elapsed().as_millis() as u64);

            if cancel.is_cancelled() {
                finish(&progress, false);
                return Err(MakeError::Cancelled);
            }
            if !failures.is_empty() {
                finish(&progress, false);
                failures.sort_by_key(|f| targets.iter().position(|t| *t == f.target));
                return Err(MakeError::LevelFailed { level, failures });
            }
        }

        finish(&progress, true);
        let duration_ms = start.elapsed().as_millis() as u64;
        emit_run_end(built.len(), duration_ms);

        Ok(BuildSummary {
            levels: levels.len(),
            built,
            duration_ms,
        })
    }

    async fn build_target(&self, target: String, progress: &Mutex<ProgressMonitor>) -> TargetResult {
        let start = Instant::now();
        if let Ok(mut monitor) = progress.lock() {
            monitor.start_target(&target);
        }

        let recipes = self
            .rules
            .get(target.as_str())
            .map(|rule| rule.recipes.as_slice())
            .unwrap_or(&[]);
        let outcome = run_recipes(self.config, &target, recipes).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Ok(mut monitor) = progress.lock() {
            monitor.finish_target(&target, outcome.is_ok(), duration_ms);
        }

        match outcome {
            Ok(()) => {
                tracing::debug!(name = %target, duration_ms, "target built");
                TargetResult::built(target, duration_ms)
            }
            Err(failure) => {
                if !self.config.cancel.is_cancelled() {
                    emit_failure(self.config, &failure);
                }
                self.remove_partial_output(&target);
                TargetResult::failed(failure, duration_ms)
            }
        }
    }

    /// Deletes what a failed recipe left behind, unless the target is phony.
    fn remove_partial_output(&self, target: &str) {
        if self.phony.contains(target) {
            return;
        }
        let fs = &self.config.fs;
        match fs.exists(target) {
            Ok(false) => {}
            Ok(true) => {
                if let Err(e) = fs.remove(target) {
                    tracing::warn!(name = %target, error = %e, "CleanupFailure: could not remove target");
                } else {
                    tracing::debug!(name = %target, "removed output of failed target");
                }
            }
            Err(e) => {
                tracing::warn!(name = %target, error = %e, "CleanupFailure: could not stat target");
            }
        }
    }
}

fn finish(progress: &Mutex<ProgressMonitor>, success: bool) {
    if let Ok(monitor) = progress.lock() {
        monitor.finish(success);
    }
}
