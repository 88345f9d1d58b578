//! Bounded-concurrency batch processing: run the same per-holder operation
//! across a holder list without letting an unbounded fan-out of RPC calls
//! overwhelm the endpoint, via `futures::stream::StreamExt::buffer_unordered`
//! for driving many independent async units of work with a fixed concurrency
//! cap.

use futures::stream::{self, StreamExt};

/// Concurrency cap for batch operations, kept as a small explicit constant
/// rather than letting it default to "as many as `holders.len()`".
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig { concurrency: 8 }
    }
}

/// A per-holder outcome: a failure for one holder never aborts the batch, it
/// is simply recorded alongside the holder it belongs to.
pub struct BatchResult<T, E> {
    pub holder_index: usize,
    pub outcome: Result<T, E>,
}

/// Runs `op` once per item in `items`, with at most `config.concurrency`
/// invocations in flight at a time, preserving each result's originating
/// index so callers can re-associate it with the holder that produced it.
pub async fn run_batch<I, T, E, F, Fut>(items: &[I], config: BatchConfig, op: F) -> Vec<BatchResult<T, E>>
where
    I: Sync,
    F: Fn(usize, &I) -> Fut + Sync,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    stream::iter(items.iter().enumerate())
        .map(|(index, item)| {
            let op = &op;
            async move {
                BatchResult {
                    holder_index: index,
                    outcome: op(index, item).await,
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await
}
