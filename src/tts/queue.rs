use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::interface::TtsError;

/// Concurrency gate for backend calls.
///
/// Avoids hitting API rate limits by limiting the number of concurrent
/// synthesis requests that reach the backend.
pub struct BackendQueue {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BackendQueue {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Run `task` once a permit is acquired.
    pub async fn run<Fut, T>(&self, task: Fut) -> Result<T, TtsError>
    where
        Fut: Future<Output = Result<T, TtsError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("Queue error: {}", e)))?;
        task.await
    }

    /// Number of currently available permits (free slots).
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
