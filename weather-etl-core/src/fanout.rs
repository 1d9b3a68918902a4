//! Bounded fan-out/fan-in over a list of independent jobs.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `job` once per item with at most `concurrency` jobs in flight, and
/// wait for all of them.
///
/// Successes and failures are collected separately; their order follows
/// completion, not input. A failing job never cancels its siblings. A
/// `concurrency` of zero is treated as one.
pub async fn run_all<T, R, E, F, Fut>(items: Vec<T>, concurrency: usize, job: F) -> (Vec<R>, Vec<E>)
where
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let slots = Arc::new(Semaphore::new(concurrency.max(1)));
    let job = Arc::new(job);
    let mut tasks = JoinSet::new();

    for item in items {
        let slots = Arc::clone(&slots);
        let job = Arc::clone(&job);
        tasks.spawn(async move {
            // The semaphore lives in this function and is never closed.
            let _permit = slots.acquire_owned().await.ok();
            job(item).await
        });
    }

    let mut results = Vec::new();
    let mut errors = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(err)) => errors.push(err),
            Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
            Err(join_err) => tracing::error!(error = %join_err, "fan-out task cancelled"),
        }
    }

    (results, errors)
}
