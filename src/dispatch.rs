use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::db::Database;

/// Payload for a notification that has not been written yet.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub user_id: i32,
    pub kind: &'static str,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
}

/// Best-effort notification side channel.
///
/// `notify` never blocks and never fails: drafts go through a bounded queue
/// and a full or closed queue drops the draft, bumps a counter and logs.
/// Only the writer task touches the database, so no notification outcome can
/// reach the transaction that triggered it. There are no retries.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<NotificationDraft>,
    dropped: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Start a dispatcher with a bounded queue and a writer task draining
    /// into `db`. The writer exits once every clone of the dispatcher is
    /// dropped and the queue is empty.
    pub fn spawn(db: Database, queue_depth: usize) -> (Dispatcher, JoinHandle<()>) {
        let (dispatcher, rx) = Dispatcher::channel(queue_depth);
        let failed = Arc::clone(&dispatcher.failed);
        let handle = tokio::spawn(write_loop(db, rx, failed));
        (dispatcher, handle)
    }

    fn channel(queue_depth: usize) -> (Dispatcher, mpsc::Receiver<NotificationDraft>) {
        let (tx, rx) = mpsc::channel(queue_depth);
        let dispatcher = Dispatcher {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        };
        (dispatcher, rx)
    }

    /// Queue a notification. Detached side effect: the caller gets no
    /// acknowledgment and no error.
    pub fn notify(&self, draft: NotificationDraft) {
        if let Err(err) = self.tx.try_send(draft) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, "notification dropped before dispatch");
        }
    }

    /// Drafts dropped because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drafts the writer failed to persist.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

async fn write_loop(
    db: Database,
    mut rx: mpsc::Receiver<NotificationDraft>,
    failed: Arc<AtomicU64>,
) {
    while let Some(draft) = rx.recv().await {
        if let Err(err) = db.create_notification(&draft).await {
            failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                user_id = draft.user_id,
                kind = draft.kind,
                error = %err,
                "failed to persist notification"
            );
        }
    }
}
