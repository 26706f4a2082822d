//! In-process prompt collection.
//!
//! Behaves like the hosted store from the client's point of view: every write
//! fans out a full snapshot to all live subscriptions. Failure injection and
//! call counters make it the test double for the rest of the crate.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{RemoteCollection, Snapshot, SnapshotEvent, SUBSCRIPTION_BUFFER};
use crate::error::{Error, Result};
use crate::models::{NewPrompt, Prompt, PromptDocument, PromptId};
use crate::util::lock;

const BROADCAST_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    changes: broadcast::Sender<SnapshotEvent>,
    create_calls: AtomicUsize,
    increment_calls: AtomicUsize,
}

#[derive(Default)]
struct State {
    documents: BTreeMap<PromptId, PromptDocument>,
    sequence: u64,
    fail_creates: Option<String>,
    fail_increments: Option<String>,
    create_delay: Option<Duration>,
}

impl State {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            sequence: self.sequence,
            prompts: self
                .documents
                .iter()
                .map(|(id, document)| document.clone().into_prompt(id.clone()))
                .collect(),
        }
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCollection {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                changes,
                create_calls: AtomicUsize::new(0),
                increment_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Write a document directly, as another client would.
    pub fn insert(&self, id: impl Into<PromptId>, document: PromptDocument) {
        self.mutate(|state| {
            state.documents.insert(id.into(), document);
        });
    }

    /// Current stored vote counter for a document.
    pub fn votes(&self, id: &PromptId) -> Option<i64> {
        lock(&self.inner.state)
            .documents
            .get(id)
            .map(|document| document.votes.unwrap_or(0))
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make subsequent creates fail with `message`, or succeed again with `None`.
    pub fn fail_creates(&self, message: Option<&str>) {
        lock(&self.inner.state).fail_creates = message.map(str::to_string);
    }

    /// Make subsequent vote increments fail with `message`, or succeed again with `None`.
    pub fn fail_increments(&self, message: Option<&str>) {
        lock(&self.inner.state).fail_increments = message.map(str::to_string);
    }

    /// Delay every create by `delay` before it is applied.
    pub fn delay_creates(&self, delay: Option<Duration>) {
        lock(&self.inner.state).create_delay = delay;
    }

    /// Terminate every live subscription with an error.
    pub fn fail_subscriptions(&self, message: &str) {
        let _ = self
            .inner
            .changes
            .send(SnapshotEvent::Failed(message.to_string()));
    }

    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    pub fn increment_calls(&self) -> usize {
        self.inner.increment_calls.load(Ordering::SeqCst)
    }

    fn mutate(&self, apply: impl FnOnce(&mut State)) {
        let mut state = lock(&self.inner.state);
        apply(&mut state);
        state.sequence += 1;
        // Sent under the lock so subscribers see sequences in order.
        let _ = self
            .inner
            .changes
            .send(SnapshotEvent::Snapshot(state.snapshot()));
    }
}

impl RemoteCollection for MemoryCollection {
    async fn fetch_all(&self) -> Result<Vec<Prompt>> {
        Ok(lock(&self.inner.state).snapshot().prompts)
    }

    fn subscribe(&self, cancel: CancellationToken) -> mpsc::Receiver<SnapshotEvent> {
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let (initial, mut changes) = {
            let state = lock(&self.inner.state);
            (state.snapshot(), self.inner.changes.subscribe())
        };

        tokio::spawn(async move {
            if sender.send(SnapshotEvent::Snapshot(initial)).await.is_err() {
                return;
            }
            loop {
                let event = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    event = changes.recv() => event,
                };
                match event {
                    Ok(event) => {
                        let failed = matches!(event, SnapshotEvent::Failed(_));
                        if sender.send(event).await.is_err() || failed {
                            break;
                        }
                    }
                    // Every event is a full snapshot, so skipped ones are superseded.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("memory subscription skipped {skipped} snapshots");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        receiver
    }

    async fn create(&self, prompt: &NewPrompt) -> Result<PromptId> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, failure) = {
            let state = lock(&self.inner.state);
            (state.create_delay, state.fail_creates.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = failure {
            return Err(Error::Remote(message));
        }

        let id = PromptId::new(Uuid::now_v7().simple().to_string());
        let document = prompt.to_document();
        self.insert(id.clone(), document);
        Ok(id)
    }

    async fn increment_votes(&self, id: &PromptId, delta: i64) -> Result<()> {
        self.inner.increment_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.inner.state).fail_increments.clone() {
            return Err(Error::Remote(message));
        }
        if !lock(&self.inner.state).documents.contains_key(id) {
            return Err(Error::NotFound(id.to_string()));
        }

        self.mutate(|state| {
            if let Some(document) = state.documents.get_mut(id) {
                document.votes = Some(document.votes.unwrap_or(0) + delta);
            }
        });
        Ok(())
    }
}
