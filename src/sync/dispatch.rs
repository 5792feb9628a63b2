//! Fire-and-forget delivery of remote writes.
//!
//! `submit` returns immediately. Writes go through one queue drained by a
//! single worker, so the mirror sees them in submission order. Each write is
//! attempted once and any failure goes to the [`FailureSink`]. Callers never
//! see it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::errors::AppError;
use crate::remote::{RemoteMirror, RemoteOp, RemoteTable};

/// Receives remote writes that failed.
pub trait FailureSink: Send + Sync {
    fn report(&self, op: &RemoteOp, error: &AppError);
}

/// Default sink: a warning in the log.
pub struct LogSink;

impl FailureSink for LogSink {
    fn report(&self, op: &RemoteOp, error: &AppError) {
        tracing::warn!("Remote {} failed: {}", op, error);
    }
}

#[derive(Clone)]
pub struct RemoteDispatcher {
    mirror: Option<Arc<dyn RemoteMirror>>,
    queue: Option<mpsc::UnboundedSender<RemoteOp>>,
}

impl RemoteDispatcher {
    /// Spawns the delivery worker when a mirror is configured. The worker stops
    /// once every clone of the dispatcher is dropped.
    pub fn new(mirror: Option<Arc<dyn RemoteMirror>>, sink: Arc<dyn FailureSink>) -> Self {
        let queue = mirror.as_ref().map(|mirror| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(Self::drain_loop(Arc::clone(mirror), sink, rx));
            tx
        });
        Self { mirror, queue }
    }

    pub fn is_online(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn mirror(&self) -> Option<&Arc<dyn RemoteMirror>> {
        self.mirror.as_ref()
    }

    /// Queue a write without waiting for it. Offline, this is a no-op.
    pub fn submit(&self, op: RemoteOp) {
        let Some(queue) = &self.queue else {
            tracing::trace!("Offline, skipping remote {}", op);
            return;
        };
        if let Err(mpsc::error::SendError(op)) = queue.send(op) {
            tracing::warn!("Remote worker stopped, dropping {}", op);
        }
    }

    async fn drain_loop(
        mirror: Arc<dyn RemoteMirror>,
        sink: Arc<dyn FailureSink>,
        mut rx: mpsc::UnboundedReceiver<RemoteOp>,
    ) {
        while let Some(op) = rx.recv().await {
            match op.apply(mirror.as_ref()).await {
                Ok(()) => tracing::debug!("Remote {} succeeded", op),
                Err(e) => sink.report(&op, &e),
            }
        }
        tracing::debug!("Remote worker finished");
    }

    pub fn insert<T: Serialize>(&self, table: RemoteTable, id: i64, row: &T) {
        if let Some(row) = self.encode(table, id, row) {
            self.submit(RemoteOp::Insert { table, id, row });
        }
    }

    pub fn update<T: Serialize>(&self, table: RemoteTable, id: i64, row: &T) {
        if let Some(row) = self.encode(table, id, row) {
            self.submit(RemoteOp::Update { table, id, row });
        }
    }

    pub fn delete(&self, table: RemoteTable, id: i64) {
        self.submit(RemoteOp::Delete { table, id });
    }

    fn encode<T: Serialize>(&self, table: RemoteTable, id: i64, row: &T) -> Option<serde_json::Value> {
        if !self.is_online() {
            return None;
        }
        match serde_json::to_value(row) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Failed to encode {}#{} for the mirror: {}", table, id, e);
                None
            }
        }
    }
}
