//! Chunked processing engine.
//!
//! Drives an async batch transform over a large ordered slice, yielding to the
//! scheduler after every batch so a single-threaded runtime stays responsive.
//!
//! # Cancellation
//!
//! Cancellation is cooperative: the token is checked before each batch, never
//! during one. A cancelled run returns everything produced by the batches that
//! completed, flagged `cancelled`. A token cancelled before the call runs zero
//! batches.
//!
//! # Failure
//!
//! A transform error aborts the run and is returned as-is. Nothing is retried
//! and no partial result is returned; that is what distinguishes a failure
//! from a cancellation.

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Progress sink, called with `(batches_completed, total_batches)`.
pub type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + Send + 'a>;

/// Batch size, cancellation and progress wiring for one run.
pub struct ChunkOptions<'a> {
    batch_size: usize,
    cancellation: Option<CancellationToken>,
    on_progress: Option<ProgressFn<'a>>,
}

impl<'a> ChunkOptions<'a> {
    /// A batch size of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            cancellation: None,
            on_progress: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: FnMut(usize, usize) + Send + 'a,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Outcome of a completed or cancelled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult<T> {
    /// Concatenated transform outputs, in batch order.
    pub results: Vec<T>,
    pub cancelled: bool,
    pub batches_processed: usize,
    pub total_batches: usize,
}

/// Number of batches needed for `len` items.
pub fn total_batches(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

/// Run `transform` over `items` in batches.
///
/// Per batch: check cancellation, await the transform, append its output,
/// yield to the scheduler, then report progress. The transform may grow,
/// shrink or reorder its batch; its output is appended as returned.
pub async fn run_chunks<'a, TIn, TOut, E, F, Fut>(
    items: &'a [TIn],
    options: ChunkOptions<'_>,
    mut transform: F,
) -> Result<ChunkResult<TOut>, E>
where
    F: FnMut(&'a [TIn]) -> Fut,
    Fut: Future<Output = Result<Vec<TOut>, E>>,
{
    let ChunkOptions {
        batch_size,
        cancellation,
        mut on_progress,
    } = options;

    let total_batches = total_batches(items.len(), batch_size);
    let mut results = Vec::new();
    let mut batches_processed = 0;

    log::debug!(
        "chunked run: {} items in {} batches of {}",
        items.len(),
        total_batches,
        batch_size
    );

    for batch in items.chunks(batch_size) {
        if cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            log::info!(
                "chunked run cancelled after {}/{} batches ({} results kept)",
                batches_processed,
                total_batches,
                results.len()
            );
            return Ok(ChunkResult {
                results,
                cancelled: true,
                batches_processed,
                total_batches,
            });
        }

        let output = transform(batch).await?;
        log::trace!(
            "batch {}/{}: {} items in, {} results out",
            batches_processed + 1,
            total_batches,
            batch.len(),
            output.len()
        );
        results.extend(output);
        batches_processed += 1;

        tokio::task::yield_now().await;

        if let Some(on_progress) = on_progress.as_mut() {
            on_progress(batches_processed, total_batches);
        }
    }

    Ok(ChunkResult {
        results,
        cancelled: false,
        batches_processed,
        total_batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn test_total_batches() {
        assert_eq!(total_batches(0, 500), 0);
        assert_eq!(total_batches(1, 500), 1);
        assert_eq!(total_batches(500, 500), 1);
        assert_eq!(total_batches(1001, 500), 3);
        assert_eq!(total_batches(10, 0), 10);
    }

    #[tokio::test]
    async fn test_zero_batch_size_runs_one_item_batches() {
        let items = [1, 2, 3];
        let result = run_chunks(&items, ChunkOptions::new(0), |batch: &[i32]| {
            let len = batch.len();
            async move { Ok::<_, Infallible>(vec![len]) }
        })
        .await
        .unwrap();

        assert_eq!(result.results, vec![1, 1, 1]);
        assert_eq!(result.total_batches, 3);
    }

    #[tokio::test]
    async fn test_transform_may_expand_and_reorder() {
        let items = [1, 2, 3, 4, 5];
        let result = run_chunks(&items, ChunkOptions::new(2), |batch: &[i32]| {
            let mut out: Vec<i32> = batch.iter().flat_map(|n| [*n, *n * 10]).collect();
            out.reverse();
            async move { Ok::<_, Infallible>(out) }
        })
        .await
        .unwrap();

        assert_eq!(result.results, vec![20, 2, 10, 1, 40, 4, 30, 3, 50, 5]);
        assert!(!result.cancelled);
        assert_eq!(result.batches_processed, 3);
    }
}
