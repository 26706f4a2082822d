//! Remote prompt collection.
//!
//! The remote store owns durability, conflict resolution and fan-out. This
//! module only defines the operations the client needs from it and the two
//! implementations: Firestore over REST and an in-process collection.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{NewPrompt, Prompt, PromptId};

mod firestore;
mod memory;

pub use firestore::FirestoreCollection;
pub use memory::MemoryCollection;

/// Buffer between a transport pump and its consumer.
pub(crate) const SUBSCRIPTION_BUFFER: usize = 16;

/// A full copy of the collection as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Increases with every delivery on one subscription
    pub sequence: u64,
    pub prompts: Vec<Prompt>,
}

/// One delivery on a push subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    Snapshot(Snapshot),
    /// The subscription failed and will deliver nothing further.
    Failed(String),
}

/// Operations the client performs against the shared collection.
pub trait RemoteCollection: Clone + Send + Sync + 'static {
    /// Read every document once.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Prompt>>> + Send;

    /// Open a push subscription delivering the whole collection on every change.
    ///
    /// The first delivery is the current contents. Deliveries stop once `cancel`
    /// is revoked or the receiver is dropped.
    fn subscribe(&self, cancel: CancellationToken) -> mpsc::Receiver<SnapshotEvent>;

    /// Create a document and return its store-assigned id.
    fn create(&self, prompt: &NewPrompt) -> impl Future<Output = Result<PromptId>> + Send;

    /// Atomically add `delta` to a document's vote counter.
    fn increment_votes(
        &self,
        id: &PromptId,
        delta: i64,
    ) -> impl Future<Output = Result<()>> + Send;
}
