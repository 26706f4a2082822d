//! Validated prompt submission.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_SUBMIT_TIMEOUT_MS;
use crate::error::{Error, Result};
use crate::models::{NewPrompt, PromptDraft, PromptId};
use crate::remote::RemoteCollection;

/// Forwards new prompts to the remote collection.
///
/// The gateway never touches the mirror; a created prompt shows up once the
/// subscription delivers it.
#[derive(Clone)]
pub struct SubmissionGateway<R: RemoteCollection> {
    remote: R,
    timeout: Duration,
}

impl<R: RemoteCollection> SubmissionGateway<R> {
    pub const fn new(remote: R) -> Self {
        Self {
            remote,
            timeout: Duration::from_millis(DEFAULT_SUBMIT_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit `draft`, clearing it on success.
    ///
    /// On any failure the draft is left as it was so the user can retry.
    pub async fn submit(&self, draft: &mut PromptDraft) -> Result<PromptId> {
        let prompt = validate_draft(draft, Utc::now())?;

        let id = tokio::time::timeout(self.timeout, self.remote.create(&prompt))
            .await
            .map_err(|_| {
                tracing::warn!("Prompt submission timed out after {:?}", self.timeout);
                Error::Timeout(self.timeout)
            })?
            .inspect_err(|error| tracing::warn!("Error adding prompt: {}", error))?;

        tracing::info!("Prompt {} submitted", id);
        draft.clear();
        Ok(id)
    }
}

/// Check a draft and build the prompt to create.
///
/// Title, content and author must be non-empty after trimming.
pub fn validate_draft(draft: &PromptDraft, now: DateTime<Utc>) -> Result<NewPrompt> {
    let title = draft.title.trim();
    let content = draft.content.trim();
    let author = draft.author.trim();

    let missing = [("author", author), ("title", title), ("content", content)]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "please fill in every field (missing: {})",
            missing.join(", ")
        )));
    }

    Ok(NewPrompt::new(title, content, author, draft.category, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::remote::MemoryCollection;
    use pretty_assertions::assert_eq;

    fn draft() -> PromptDraft {
        PromptDraft::new(
            "  Explain this stack trace ",
            "Walk me through the following panic...",
            "ada",
            Some(Category::Debug),
        )
    }

    #[test]
    fn validation_trims_and_keeps_category() {
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let prompt = validate_draft(&draft(), now).unwrap();
        assert_eq!(prompt.title, "Explain this stack trace");
        assert_eq!(prompt.category, Category::Debug);
        assert_eq!(prompt.votes, 0);
        assert_eq!(prompt.created_at, "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn validation_names_missing_fields() {
        let mut draft = draft();
        draft.author = "   ".to_string();
        draft.content.clear();

        let error = validate_draft(&draft, Utc::now()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid input: please fill in every field (missing: author, content)"
        );
    }

    #[tokio::test]
    async fn empty_author_is_rejected_before_remote_call() {
        let remote = MemoryCollection::new();
        let gateway = SubmissionGateway::new(remote.clone());
        let mut draft = draft();
        draft.author = String::new();
        let before = draft.clone();

        let error = gateway.submit(&mut draft).await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        assert_eq!(remote.create_calls(), 0);
        assert_eq!(draft, before);
    }

    #[tokio::test]
    async fn success_clears_draft_and_creates_document() {
        let remote = MemoryCollection::new();
        let gateway = SubmissionGateway::new(remote.clone());
        let mut draft = draft();

        let id = gateway.submit(&mut draft).await.unwrap();
        assert_eq!(draft, PromptDraft::default());
        assert_eq!(remote.votes(&id), Some(0));
        assert_eq!(remote.create_calls(), 1);
    }

    #[tokio::test]
    async fn remote_failure_keeps_draft() {
        let remote = MemoryCollection::new();
        remote.fail_creates(Some("quota exceeded"));
        let gateway = SubmissionGateway::new(remote.clone());
        let mut draft = draft();
        let before = draft.clone();

        let error = gateway.submit(&mut draft).await.unwrap_err();
        assert_eq!(error.to_string(), "Remote store error: quota exceeded");
        assert_eq!(draft, before);
        assert!(remote.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_times_out() {
        let remote = MemoryCollection::new();
        remote.delay_creates(Some(Duration::from_secs(30)));
        let gateway =
            SubmissionGateway::new(remote.clone()).with_timeout(Duration::from_secs(10));
        let mut draft = draft();

        let error = gateway.submit(&mut draft).await.unwrap_err();
        assert!(matches!(error, Error::Timeout(timeout) if timeout == Duration::from_secs(10)));
        assert!(!draft.is_empty());
    }
}
