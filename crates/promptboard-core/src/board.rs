//! Composition root tying the mirror, voting and submission to one remote.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::mirror::{ConnectionStatus, MirrorState, PromptMirror, Subscription};
use crate::models::{Prompt, PromptDraft, PromptId};
use crate::preferences::{LikeStore, PreferenceBackend};
use crate::remote::RemoteCollection;
use crate::submission::SubmissionGateway;
use crate::util::lock;
use crate::view::{self, ViewQuery};
use crate::votes::{ToggleOutcome, VoteController};

/// A prompt as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedPrompt {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub liked: bool,
    /// A vote on this prompt is in flight or settling
    pub voting: bool,
}

/// Everything the prompt library needs, built around one injected remote.
pub struct PromptBoard<R: RemoteCollection, B: PreferenceBackend> {
    remote: R,
    mirror: PromptMirror,
    likes: Arc<LikeStore<B>>,
    votes: VoteController<R, B>,
    submissions: SubmissionGateway<R>,
    subscription: Mutex<Option<Subscription>>,
}

impl<R: RemoteCollection, B: PreferenceBackend> PromptBoard<R, B> {
    /// Build the board. Liked prompts are loaded from `preferences` once, here.
    pub fn new(remote: R, preferences: B, config: &ClientConfig) -> Self {
        let likes = Arc::new(LikeStore::load(preferences));
        let votes = VoteController::new(remote.clone(), Arc::clone(&likes))
            .with_settle_delay(config.settle_delay());
        let submissions =
            SubmissionGateway::new(remote.clone()).with_timeout(config.submit_timeout());

        Self {
            remote,
            mirror: PromptMirror::new(),
            likes,
            votes,
            submissions,
            subscription: Mutex::new(None),
        }
    }

    /// Start mirroring the remote collection, replacing any live subscription.
    pub fn connect(&self) {
        let subscription = self.mirror.subscribe(&self.remote);
        if lock(&self.subscription).replace(subscription).is_some() {
            tracing::debug!("Replaced existing prompt subscription");
        }
    }

    /// Release the live subscription, if any.
    pub async fn disconnect(&self) {
        let subscription = lock(&self.subscription).take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
        }
    }

    pub const fn mirror(&self) -> &PromptMirror {
        &self.mirror
    }

    pub fn state(&self) -> MirrorState {
        self.mirror.state()
    }

    pub fn status(&self) -> (ConnectionStatus, Option<String>) {
        let state = self.mirror.state();
        (state.status, state.error)
    }

    pub async fn wait_until_loaded(&self) -> Result<MirrorState> {
        self.mirror.wait_until_loaded().await
    }

    /// Filtered, ordered view of the mirror with per-user flags.
    pub fn listing(&self, query: &ViewQuery) -> Vec<ListedPrompt> {
        let state = self.mirror.state();
        view::select(state.prompts.values(), query)
            .into_iter()
            .map(|prompt| ListedPrompt {
                liked: self.likes.contains(&prompt.id),
                voting: self.votes.is_pending(&prompt.id),
                prompt: prompt.clone(),
            })
            .collect()
    }

    /// A single mirrored prompt with per-user flags.
    pub fn prompt(&self, id: &PromptId) -> Option<ListedPrompt> {
        self.mirror.prompt(id).map(|prompt| ListedPrompt {
            liked: self.likes.contains(&prompt.id),
            voting: self.votes.is_pending(&prompt.id),
            prompt,
        })
    }

    pub async fn toggle_like(&self, id: &PromptId) -> ToggleOutcome {
        self.votes.toggle(id).await
    }

    pub async fn submit(&self, draft: &mut PromptDraft) -> Result<PromptId> {
        self.submissions.submit(draft).await
    }

    pub fn liked(&self) -> Vec<PromptId> {
        self.likes.liked()
    }

    pub const fn votes(&self) -> &VoteController<R, B> {
        &self.votes
    }
}

impl<R: RemoteCollection, B: PreferenceBackend> Drop for PromptBoard<R, B> {
    fn drop(&mut self) {
        self.votes.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PromptDocument};
    use crate::preferences::MemoryPreferenceBackend;
    use crate::remote::MemoryCollection;
    use crate::view::SortOrder;
    use pretty_assertions::assert_eq;

    fn board(
        remote: &MemoryCollection,
        preferences: MemoryPreferenceBackend,
    ) -> PromptBoard<MemoryCollection, MemoryPreferenceBackend> {
        PromptBoard::new(remote.clone(), preferences, &ClientConfig::default())
    }

    #[tokio::test]
    async fn listing_reflects_mirror_and_liked_set() {
        let remote = MemoryCollection::new();
        remote.insert(
            "a",
            PromptDocument {
                votes: Some(2),
                ..Default::default()
            },
        );
        remote.insert(
            "b",
            PromptDocument {
                votes: Some(9),
                ..Default::default()
            },
        );
        let board = board(&remote, MemoryPreferenceBackend::with_raw(r#"["b"]"#));
        board.connect();
        board.wait_until_loaded().await.unwrap();

        let query = ViewQuery {
            sort: SortOrder::Popular,
            ..Default::default()
        };
        let listing = board.listing(&query);
        assert_eq!(
            listing
                .iter()
                .map(|item| (item.prompt.id.to_string(), item.liked))
                .collect::<Vec<_>>(),
            vec![("b".to_string(), true), ("a".to_string(), false)]
        );
        assert_eq!(board.status(), (ConnectionStatus::Online, None));

        let single = board.prompt(&PromptId::from("b")).unwrap();
        assert!(single.liked);
        assert_eq!(single.prompt.votes, 9);
        assert!(board.prompt(&PromptId::from("missing")).is_none());
        board.disconnect().await;
    }

    #[tokio::test]
    async fn submitted_prompt_arrives_through_subscription() {
        let remote = MemoryCollection::new();
        let board = board(&remote, MemoryPreferenceBackend::default());
        board.connect();
        board.wait_until_loaded().await.unwrap();
        assert!(board.state().prompts.is_empty());

        let mut watcher = board.mirror().watch();
        let mut draft = PromptDraft::new("Write tests", "Cover the edge cases", "lin", Some(Category::Test));
        let id = board.submit(&mut draft).await.unwrap();

        let state = watcher
            .wait_for(|state| state.prompts.contains_key(&id))
            .await
            .unwrap()
            .clone();
        let prompt = &state.prompts[&id];
        assert_eq!(prompt.category, Some(Category::Test));
        assert_eq!(prompt.votes, 0);
        assert!(prompt.created_at.is_some());
        board.disconnect().await;
    }

    #[tokio::test]
    async fn toggle_marks_prompt_voting_until_settled() {
        let remote = MemoryCollection::new();
        remote.insert("a", PromptDocument::default());
        let board = board(&remote, MemoryPreferenceBackend::default());
        board.connect();
        board.wait_until_loaded().await.unwrap();

        let id = PromptId::from("a");
        assert_eq!(
            board.toggle_like(&id).await,
            ToggleOutcome::Committed { liked: true }
        );
        let listing = board.listing(&ViewQuery::default());
        assert!(listing[0].liked);
        assert!(listing[0].voting);
        assert_eq!(board.liked(), vec![id]);
    }
}
