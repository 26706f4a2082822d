//! Optimistic like/unlike voting.
//!
//! A toggle flips the local liked set first, then sends a relative `+1`/`-1`
//! to the remote counter and reverts the flip if that fails. Each prompt moves
//! through [`VotePhase`]:
//!
//! ```text
//! Idle -> Pending -> Committed  -> (settle delay) -> Idle
//!                 \-> RolledBack -> (settle delay) -> Idle
//! ```
//!
//! While a prompt is in any phase other than `Idle` further toggles on it are
//! ignored. A snapshot that was in flight before a rollback may briefly show
//! the prompt with the pre-rollback vote count; the next snapshot corrects it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_SETTLE_DELAY_MS;
use crate::models::PromptId;
use crate::preferences::{LikeStore, PreferenceBackend};
use crate::remote::RemoteCollection;
use crate::util::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePhase {
    Idle,
    /// Remote increment in flight
    Pending,
    /// Remote increment succeeded; settling
    Committed,
    /// Remote increment failed and the local flip was reverted; settling
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Another vote on the same prompt has not settled yet.
    Ignored,
    Committed { liked: bool },
    RolledBack { liked: bool, error: String },
}

impl ToggleOutcome {
    /// Liked state after the toggle, `None` when the toggle was ignored.
    pub const fn liked(&self) -> Option<bool> {
        match self {
            Self::Ignored => None,
            Self::Committed { liked } | Self::RolledBack { liked, .. } => Some(*liked),
        }
    }
}

pub struct VoteController<R: RemoteCollection, B: PreferenceBackend> {
    remote: R,
    likes: Arc<LikeStore<B>>,
    phases: Arc<Mutex<HashMap<PromptId, VotePhase>>>,
    settle_delay: Duration,
    cancel: CancellationToken,
}

impl<R: RemoteCollection, B: PreferenceBackend> VoteController<R, B> {
    pub fn new(remote: R, likes: Arc<LikeStore<B>>) -> Self {
        Self {
            remote,
            likes,
            phases: Arc::new(Mutex::new(HashMap::new())),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn phase(&self, id: &PromptId) -> VotePhase {
        lock(&self.phases)
            .get(id)
            .copied()
            .unwrap_or(VotePhase::Idle)
    }

    /// Whether `id` is in the pending set (in flight or settling).
    pub fn is_pending(&self, id: &PromptId) -> bool {
        lock(&self.phases).contains_key(id)
    }

    pub fn is_liked(&self, id: &PromptId) -> bool {
        self.likes.contains(id)
    }

    /// Toggle the like state of `id`.
    pub async fn toggle(&self, id: &PromptId) -> ToggleOutcome {
        {
            let mut phases = lock(&self.phases);
            if phases.contains_key(id) {
                tracing::debug!("Ignoring toggle for {}: vote not settled", id);
                return ToggleOutcome::Ignored;
            }
            phases.insert(id.clone(), VotePhase::Pending);
        }

        let was_liked = self.likes.contains(id);
        let liked = !was_liked;
        tracing::debug!("Toggling like for {}, currently liked: {}", id, was_liked);
        self.set_liked(id, liked);

        let delta = if liked { 1 } else { -1 };
        let (phase, outcome) = match self.remote.increment_votes(id, delta).await {
            Ok(()) => (VotePhase::Committed, ToggleOutcome::Committed { liked }),
            Err(error) => {
                tracing::warn!("Error updating votes for {}: {}", id, error);
                self.set_liked(id, was_liked);
                (
                    VotePhase::RolledBack,
                    ToggleOutcome::RolledBack {
                        liked: was_liked,
                        error: error.to_string(),
                    },
                )
            }
        };

        lock(&self.phases).insert(id.clone(), phase);
        self.schedule_release(id.clone());
        outcome
    }

    /// Stop pending settle timers; prompts they held stay blocked.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn set_liked(&self, id: &PromptId, liked: bool) {
        if let Err(error) = self.likes.set(id, liked) {
            tracing::warn!("Failed to persist liked prompts: {}", error);
        }
    }

    fn schedule_release(&self, id: PromptId) {
        let phases = Arc::clone(&self.phases);
        let cancel = self.cancel.clone();
        let delay = self.settle_delay;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    lock(&phases).remove(&id);
                }
            }
        });
    }
}

impl<R: RemoteCollection, B: PreferenceBackend> Drop for VoteController<R, B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
