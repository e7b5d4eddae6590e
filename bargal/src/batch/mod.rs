//! Batch execution with bounded retries.
//!
//! Every item is attempted before anything is reported; failed items are
//! retried as a group in later passes.

#[cfg(test)]
mod tests;

use crate::error::Error;

/// An item that still failed after the last pass.
#[derive(Debug)]
pub struct BatchFailure<'a, T> {
    pub item: &'a T,
    /// Error of the last attempt.
    pub error: Error,
    pub attempts: usize,
}

#[derive(Debug)]
pub struct BatchReport<'a, T, R> {
    /// Successful items with their results, in completion order.
    pub succeeded: Vec<(&'a T, R)>,
    /// Failed items, in input order.
    pub failed: Vec<BatchFailure<'a, T>>,
}

impl<T, R> BatchReport<'_, T, R> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Applies `op` to every item, then re-runs it over the items that failed.
///
/// At most `passes` passes are made (at least one). Only the surviving
/// failure set is retried; a pass with no failures ends the run early.
pub fn run_batch<'a, T, R>(
    items: &'a [T],
    passes: usize,
    mut op: impl FnMut(&T) -> Result<R, Error>,
) -> BatchReport<'a, T, R> {
    let passes = passes.max(1);
    let mut succeeded = Vec::with_capacity(items.len());
    let mut pending: Vec<usize> = (0..items.len()).collect();
    let mut failures: Vec<(usize, Error)> = Vec::new();

    for pass in 1..=passes {
        if pending.is_empty() {
            break;
        }
        tracing::info!("Batch pass {}/{}: {} item(s)", pass, passes, pending.len());

        failures.clear();
        for index in pending.drain(..) {
            match op(&items[index]) {
                Ok(result) => succeeded.push((&items[index], result)),
                Err(error) => {
                    tracing::warn!("Item {} failed on pass {}: {}", index, pass, error);
                    failures.push((index, error));
                }
            }
        }
        pending.extend(failures.iter().map(|(index, _)| *index));
    }

    // Survivors were attempted on every pass.
    let failed = failures
        .into_iter()
        .map(|(index, error)| BatchFailure {
            item: &items[index],
            error,
            attempts: passes,
        })
        .collect::<Vec<_>>();

    tracing::info!(
        "Batch finished: {} succeeded, {} failed",
        succeeded.len(),
        failed.len()
    );
    BatchReport { succeeded, failed }
}
