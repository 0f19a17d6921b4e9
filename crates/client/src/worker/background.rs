//! Fire-and-forget cache writes with an awaitable handle.

use fuec_core::{CacheDb, Error, Request, Response};
use tokio::task::JoinHandle;

/// A cache write running on its own task.
///
/// The response it persists has already been handed to the caller. Dropping
/// the handle detaches the task; awaiting [`BackgroundWrite::finished`]
/// observes its result. Failures are logged by the task itself.
#[derive(Debug)]
pub struct BackgroundWrite {
    handle: JoinHandle<Result<(), Error>>,
}

impl BackgroundWrite {
    pub(crate) fn spawn(store: CacheDb, generation: String, request: Request, response: Response) -> Self {
        let handle = tokio::spawn(async move {
            let result = store.put_entry(&generation, &request, &response).await;
            match &result {
                Ok(()) => tracing::debug!(generation = %generation, url = %request.url, "response cached"),
                Err(e) => tracing::warn!(
                    generation = %generation,
                    url = %request.url,
                    error = %e,
                    "cache write failed; delivered response unaffected"
                ),
            }
            result
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the write to complete.
    pub async fn finished(self) -> Result<(), Error> {
        self.handle.await.map_err(|e| Error::TaskFailed(e.to_string()))?
    }
}
