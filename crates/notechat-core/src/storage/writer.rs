//! Fire-and-forget persistence.
//!
//! Store mutations never wait for storage. Each new value is queued on an
//! unbounded channel drained by one background task, so writes land in the
//! order they were submitted and an older snapshot can never overwrite a
//! newer one.

use std::future::Future;

use tokio::sync::{mpsc, oneshot};

use crate::error::Result;

enum WriteCommand<T> {
    Write(T),
    Flush(oneshot::Sender<()>),
}

/// Ordered, best-effort background writer.
///
/// Write failures are logged and dropped; there are no retries. A value
/// submitted before a crash may never reach storage, in which case the
/// previously written value stays in place.
pub struct BackgroundWriter<T> {
    label: &'static str,
    sender: mpsc::UnboundedSender<WriteCommand<T>>,
}

impl<T: Send + 'static> BackgroundWriter<T> {
    /// Spawns the writer task on the current tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `label` - Name used in log lines
    /// * `write` - Performs a single write of one submitted value
    pub fn spawn<F, Fut>(label: &'static str, write: F) -> Self
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WriteCommand<T>>();

        tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                match command {
                    WriteCommand::Write(value) => {
                        if let Err(e) = write(value).await {
                            tracing::warn!("[BackgroundWriter:{}] Write dropped: {}", label, e);
                        }
                    }
                    WriteCommand::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            tracing::debug!("[BackgroundWriter:{}] Channel closed, writer stopped", label);
        });

        Self { label, sender }
    }

    /// Queues a value for writing and returns immediately.
    pub fn submit(&self, value: T) {
        if self.sender.send(WriteCommand::Write(value)).is_err() {
            tracing::warn!(
                "[BackgroundWriter:{}] Writer task is gone, write dropped",
                self.label
            );
        }
    }

    /// Waits until every value submitted before this call has been written
    /// (or dropped after a failed write).
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(WriteCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}
