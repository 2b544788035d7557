//! In-memory transport for tests

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

use super::client::{LinkStatus, Transport};
use crate::types::{AccountServerError, Result};

/// Records every publish and reports a settable link status
pub struct RecordingTransport {
    status: AtomicU8,
    fail_publish: AtomicBool,
    held: Mutex<Option<(String, Arc<Notify>)>>,
    published: Mutex<Vec<(String, Bytes)>>,
    tx: mpsc::UnboundedSender<(String, Bytes)>,
}

impl RecordingTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, Bytes)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            status: AtomicU8::new(0),
            fail_publish: AtomicBool::new(false),
            held: Mutex::new(None),
            published: Mutex::new(Vec::new()),
            tx,
        });
        (transport, rx)
    }

    pub fn set_status(&self, status: LinkStatus) {
        let raw = match status {
            LinkStatus::Connected => 0,
            LinkStatus::Reconnecting => 1,
            LinkStatus::Disconnected => 2,
        };
        self.status.store(raw, Ordering::SeqCst);
    }

    pub fn fail_publishes(&self) {
        self.fail_publish.store(true, Ordering::SeqCst);
    }

    /// Block publishes to `subject` until the returned handle is notified
    pub fn hold(&self, subject: &str) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.held.lock().unwrap() = Some((subject.to_string(), Arc::clone(&release)));
        release
    }

    pub fn published(&self) -> Vec<(String, Bytes)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn status(&self) -> LinkStatus {
        match self.status.load(Ordering::SeqCst) {
            0 => LinkStatus::Connected,
            1 => LinkStatus::Reconnecting,
            _ => LinkStatus::Disconnected,
        }
    }

    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        let release = self
            .held
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(held, _)| *held == subject)
            .map(|(_, release)| Arc::clone(release));
        if let Some(release) = release {
            release.notified().await;
        }

        if self.fail_publish.load(Ordering::SeqCst) {
            let _ = self.tx.send((subject, payload));
            return Err(AccountServerError::Nats("Publish failed: connection closed".into()));
        }
        self.published
            .lock()
            .unwrap()
            .push((subject.clone(), payload.clone()));
        let _ = self.tx.send((subject, payload));
        Ok(())
    }
}
