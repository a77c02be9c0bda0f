use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use super::cancel::Cancellation;
use super::types::TargetResult;

/// Runs one level with at most `max_concurrency` targets in flight.
///
/// Returns once every target has finished (the level barrier). Targets that
/// would start after `cancel` fires are reported as skipped.
pub async fn execute_level_parallel<F, Fut>(
    targets: &[String],
    max_concurrency: usize,
    cancel: &Cancellation,
    executor_fn: F,
) -> Vec<TargetResult>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = TargetResult>,
{
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut futs = FuturesUnordered::new();

    for target in targets {
        let sem = sem.clone();
        let run = executor_fn(target.clone());
        let target = target.clone();

        futs.push(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return TargetResult::skipped(target);
            };
            if cancel.is_cancelled() {
                return TargetResult::skipped(target);
            }
            run.await
        });
    }

    let mut results = Vec::with_capacity(targets.len());
    while let Some(result) = futs.next().await {
        results.push(result);
    }
    results
}
