//! Local mirror of the remote prompt collection.
//!
//! Every delivery from the subscription replaces the mirrored records
//! wholesale. Readers observe the mirror through a `watch` channel, so a
//! multi-record remote change is always seen as one update.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::models::{Prompt, PromptId};
use crate::remote::{RemoteCollection, Snapshot, SnapshotEvent};

/// Connection status shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Online,
    Error,
}

/// Everything a reader of the mirror can observe.
#[derive(Debug, Clone)]
pub struct MirrorState {
    pub prompts: Arc<HashMap<PromptId, Prompt>>,
    pub status: ConnectionStatus,
    pub error: Option<String>,
    /// True until the first snapshot or error arrives
    pub loading: bool,
    /// Generation of the current subscription; deliveries from older ones are dropped
    pub epoch: u64,
    /// Sequence of the last applied snapshot on the current subscription
    pub sequence: Option<u64>,
    /// Number of snapshots applied over the mirror's lifetime
    pub revision: u64,
}

impl Default for MirrorState {
    fn default() -> Self {
        Self {
            prompts: Arc::new(HashMap::new()),
            status: ConnectionStatus::Connecting,
            error: None,
            loading: true,
            epoch: 0,
            sequence: None,
            revision: 0,
        }
    }
}

#[derive(Clone)]
pub struct PromptMirror {
    state: Arc<watch::Sender<MirrorState>>,
}

impl Default for PromptMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptMirror {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(MirrorState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Current state of the mirror.
    pub fn state(&self) -> MirrorState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<MirrorState> {
        self.state.subscribe()
    }

    pub fn prompt(&self, id: &PromptId) -> Option<Prompt> {
        self.state.borrow().prompts.get(id).cloned()
    }

    /// Open a subscription on `remote` that feeds this mirror.
    ///
    /// The mirror keeps its records but goes back to `Connecting` until the
    /// first delivery. The returned [`Subscription`] must be kept alive; dropping
    /// it stops deliveries.
    pub fn subscribe<R: RemoteCollection>(&self, remote: &R) -> Subscription {
        let mut epoch = 0;
        self.state.send_modify(|state| {
            state.status = ConnectionStatus::Connecting;
            state.error = None;
            state.loading = true;
            // Sequences restart with every subscription.
            state.epoch += 1;
            state.sequence = None;
            epoch = state.epoch;
        });

        let cancel = CancellationToken::new();
        let mut events = remote.subscribe(cancel.child_token());
        let mirror = self.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            tracing::info!("Prompt subscription opened");
            loop {
                let event = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Some(event) => {
                        mirror.apply_in(epoch, event);
                    }
                    None => {
                        tracing::info!("Prompt subscription ended by transport");
                        break;
                    }
                }
            }
            tracing::debug!("Prompt subscription task finished");
        });

        Subscription {
            cancel,
            task: Some(task),
        }
    }

    /// Apply one delivery to the current subscription. Returns whether the mirror changed.
    pub fn apply(&self, event: SnapshotEvent) -> bool {
        let epoch = self.state.borrow().epoch;
        self.apply_in(epoch, event)
    }

    /// Apply a delivery made by the subscription of generation `epoch`.
    fn apply_in(&self, epoch: u64, event: SnapshotEvent) -> bool {
        match event {
            SnapshotEvent::Snapshot(snapshot) => self.replace(epoch, snapshot),
            SnapshotEvent::Failed(message) => self.state.send_if_modified(|state| {
                if state.epoch != epoch {
                    tracing::debug!("Ignoring failure from replaced subscription {epoch}");
                    return false;
                }
                tracing::warn!("Prompt subscription failed: {}", message);
                state.status = ConnectionStatus::Error;
                state.error = Some(message);
                state.loading = false;
                true
            }),
        }
    }

    /// Wait until the first snapshot or a subscription error has been applied.
    pub async fn wait_until_loaded(&self) -> Result<MirrorState> {
        let mut receiver = self.watch();
        let state = receiver
            .wait_for(|state| !state.loading)
            .await
            .map_err(|_| Error::SubscriptionClosed)?;
        Ok(state.clone())
    }

    fn replace(&self, epoch: u64, snapshot: Snapshot) -> bool {
        let Snapshot { sequence, prompts } = snapshot;
        self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                tracing::debug!("Discarding snapshot {sequence} from replaced subscription {epoch}");
                return false;
            }
            if state.sequence.is_some_and(|last| sequence <= last) {
                tracing::debug!("Discarding stale snapshot {sequence}");
                return false;
            }

            let prompts = prompts
                .into_iter()
                .map(|prompt| (prompt.id.clone(), prompt))
                .collect::<HashMap<_, _>>();
            tracing::debug!("Applied snapshot {} with {} prompts", sequence, prompts.len());

            state.prompts = Arc::new(prompts);
            state.status = ConnectionStatus::Online;
            state.error = None;
            state.loading = false;
            state.sequence = Some(sequence);
            state.revision += 1;
            true
        })
    }
}

/// Handle owning a live subscription; revoked on [`Subscription::unsubscribe`] or drop.
pub struct Subscription {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop deliveries and wait for the pump task to finish.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        tracing::info!("Prompt subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
