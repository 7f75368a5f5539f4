use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{
    models::{Post, ScoredPost, UserId},
    repositories::UserPostsWriter,
};

/// Message for asynchronous shown-posts writes
struct ShownPostsMessage {
    user_id: UserId,
    posts: Vec<Post>,
}

/// Records which posts were shown to a user without delaying the response
///
/// Only the first `top_k` posts of a result count as shown. Writes are queued to
/// a background task; failures are logged and dropped.
#[derive(Clone)]
pub struct ShownPostsHandler {
    write_tx: mpsc::UnboundedSender<ShownPostsMessage>,
    top_k: usize,
}

/// Handle for gracefully shutting down the shown-posts writer
pub struct ShownPostsWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ShownPostsWriterHandle {
    /// Signals the writer task and waits until queued writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Shown posts writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Shown posts writer task did not finish cleanly");
        }
    }
}

impl ShownPostsHandler {
    /// Creates the handler and spawns its background writer task
    pub fn new(writer: Arc<dyn UserPostsWriter>, top_k: usize) -> (Self, ShownPostsWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::writer_task(writer, write_rx, shutdown_rx).await;
        });

        (
            Self { write_tx, top_k },
            ShownPostsWriterHandle { shutdown_tx, task },
        )
    }

    async fn writer_task(
        writer: Arc<dyn UserPostsWriter>,
        mut write_rx: mpsc::UnboundedReceiver<ShownPostsMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Shown posts writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    Self::write(writer.as_ref(), msg).await;
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shown posts writer shutting down, flushing queued writes");
                    while let Ok(msg) = write_rx.try_recv() {
                        Self::write(writer.as_ref(), msg).await;
                    }
                    tracing::info!("Shown posts writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write(writer: &dyn UserPostsWriter, msg: ShownPostsMessage) {
        let user_id = msg.user_id;
        if let Err(e) = writer.write(user_id, msg.posts).await {
            tracing::error!(error = %e, user_id, "Failed to record shown posts");
        }
    }

    /// Queues the top posts of a result as shown to `user_id`
    pub fn handle(&self, user_id: UserId, result: &[ScoredPost]) {
        let posts: Vec<Post> = result
            .iter()
            .take(self.top_k)
            .map(|scored| scored.post.clone())
            .collect();
        if posts.is_empty() {
            return;
        }

        if let Err(e) = self.write_tx.send(ShownPostsMessage { user_id, posts }) {
            tracing::error!(error = %e, user_id, "Failed to queue shown posts");
        }
    }
}
