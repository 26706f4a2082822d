//! Firestore REST client for the shared prompt collection.
//!
//! The REST surface has no push channel, so subscriptions are a polling pump
//! that delivers a full snapshot whenever the collection contents change.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{RemoteCollection, Snapshot, SnapshotEvent, SUBSCRIPTION_BUFFER};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{NewPrompt, Prompt, PromptDocument, PromptId, RawTimestamp};
use crate::util::compact_text;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";
const HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct FirestoreCollection {
    client: Client,
    base_url: String,
    database_path: String,
    collection: String,
    api_key: String,
    poll_interval: Duration,
}

impl std::fmt::Debug for FirestoreCollection {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FirestoreCollection")
            .field("database_path", &self.database_path)
            .field("collection", &self.collection)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl FirestoreCollection {
    /// Build a client from validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate_remote()?;
        let project_id = config.project_id.clone().unwrap_or_default();
        let api_key = config.api_key.clone().unwrap_or_default();

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            base_url: FIRESTORE_BASE_URL.to_string(),
            database_path: format!("projects/{project_id}/databases/{}", config.database),
            collection: config.collection.clone(),
            api_key,
            poll_interval: config.poll_interval(),
        })
    }

    /// Point the client at another endpoint, such as the Firestore emulator.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}/documents/{}",
            self.base_url,
            self.database_path,
            urlencoding::encode(&self.collection)
        )
    }

    fn commit_url(&self) -> String {
        format!("{}/{}/documents:commit", self.base_url, self.database_path)
    }

    fn document_name(&self, id: &PromptId) -> String {
        format!(
            "{}/documents/{}/{}",
            self.database_path,
            self.collection,
            id.as_str()
        )
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<ListDocumentsResponse> {
        let mut query = vec![("key", self.api_key.as_str()), ("pageSize", PAGE_SIZE)];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .get(self.collection_url())
            .query(&query)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(parse_api_error(status, &body)));
        }
        Ok(response.json::<ListDocumentsResponse>().await?)
    }

    async fn poll(self, sender: mpsc::Sender<SnapshotEvent>, cancel: CancellationToken) {
        tracing::info!(
            "Firestore subscription started for {} (interval={:?})",
            self.collection,
            self.poll_interval
        );
        let mut sequence = 0_u64;
        let mut last: Option<Vec<Prompt>> = None;

        loop {
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                fetched = self.fetch_all() => fetched,
            };

            let event = match fetched {
                Ok(mut prompts) => {
                    prompts.sort_by(|left, right| left.id.cmp(&right.id));
                    if last.as_ref() == Some(&prompts) {
                        None
                    } else {
                        sequence += 1;
                        last = Some(prompts.clone());
                        Some(SnapshotEvent::Snapshot(Snapshot { sequence, prompts }))
                    }
                }
                Err(error) => {
                    tracing::warn!("Firestore subscription failed: {}", error);
                    let _ = sender.send(SnapshotEvent::Failed(error.to_string())).await;
                    break;
                }
            };

            if let Some(event) = event {
                if sender.send(event).await.is_err() {
                    break;
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Firestore subscription stopped for {}", self.collection);
    }
}

impl RemoteCollection for FirestoreCollection {
    async fn fetch_all(&self) -> Result<Vec<Prompt>> {
        let mut prompts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            prompts.extend(page.documents.into_iter().filter_map(FirestoreDocument::into_prompt));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(prompts)
    }

    fn subscribe(&self, cancel: CancellationToken) -> mpsc::Receiver<SnapshotEvent> {
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
        tokio::spawn(self.clone().poll(sender, cancel));
        receiver
    }

    async fn create(&self, prompt: &NewPrompt) -> Result<PromptId> {
        let response = self
            .client
            .post(self.collection_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": encode_fields(prompt) }))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(parse_api_error(status, &body)));
        }

        let document = response.json::<FirestoreDocument>().await?;
        document_id(&document.name)
            .map(PromptId::from)
            .ok_or_else(|| Error::Remote("create response did not include a document name".to_string()))
    }

    async fn increment_votes(&self, id: &PromptId, delta: i64) -> Result<()> {
        let payload = json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(id),
                    "fieldTransforms": [{
                        "fieldPath": "votes",
                        "increment": { "integerValue": delta.to_string() },
                    }],
                },
                "currentDocument": { "exists": true },
            }],
        });

        let response = self
            .client
            .post(self.commit_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::NotFound(id.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Remote(parse_api_error(status, &body)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreDocument {
    fn into_prompt(self) -> Option<Prompt> {
        let id = document_id(&self.name)?;
        let document = PromptDocument {
            title: string_field(&self.fields, "title"),
            content: string_field(&self.fields, "content"),
            author: string_field(&self.fields, "author"),
            category: string_field(&self.fields, "category"),
            votes: integer_field(&self.fields, "votes"),
            created_at: timestamp_field(&self.fields, "createdAt"),
        };
        Some(document.into_prompt(PromptId::from(id)))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

fn integer_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    if let Some(raw) = value.get("integerValue") {
        // int64 values travel as JSON strings
        return raw
            .as_str()
            .and_then(|text| text.parse().ok())
            .or_else(|| raw.as_i64());
    }
    #[allow(clippy::cast_possible_truncation)]
    value.get("doubleValue")?.as_f64().map(|number| number as i64)
}

fn timestamp_field(fields: &Map<String, Value>, key: &str) -> Option<RawTimestamp> {
    let value = fields.get(key)?;
    if let Some(raw) = value.get("timestampValue").and_then(Value::as_str) {
        return Some(DateTime::parse_from_rfc3339(raw).map_or_else(
            |_| RawTimestamp::Iso(raw.to_string()),
            |instant| RawTimestamp::native(instant.with_timezone(&Utc)),
        ));
    }
    value
        .get("stringValue")
        .and_then(Value::as_str)
        .map(|raw| RawTimestamp::Iso(raw.to_string()))
}

fn encode_fields(prompt: &NewPrompt) -> Value {
    json!({
        "title": { "stringValue": prompt.title },
        "content": { "stringValue": prompt.content },
        "author": { "stringValue": prompt.author },
        "category": { "stringValue": prompt.category.as_str() },
        "votes": { "integerValue": prompt.votes.to_string() },
        "createdAt": { "stringValue": prompt.created_at },
    })
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(detail) = payload.error {
            let message = detail.message.unwrap_or_default();
            let message = message.trim();
            return match detail.status {
                Some(code) if !message.is_empty() => {
                    format!("{message} ({code}, HTTP {})", status.as_u16())
                }
                Some(code) => format!("{code} (HTTP {})", status.as_u16()),
                None if !message.is_empty() => format!("{message} (HTTP {})", status.as_u16()),
                None => format!("HTTP {}", status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{trimmed} (HTTP {})", status.as_u16())
    }
}
