//! # Change Notifications
//!
//! Subscribers receive a fresh snapshot of a collection after every committed
//! write to it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  put / DocTransaction::commit                                           │
//! │       │  publish(Collection::Orders)                                    │
//! │       ▼                                                                 │
//! │  broadcast::Sender<Collection> ──┬──► CollectionWatch<Order>  ✓ refetch │
//! │                                  ├──► CollectionWatch<Table>  (skip)    │
//! │                                  └──► CollectionWatch<Order>  ✓ refetch │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications carry only the collection name. A lagging subscriber simply
//! refetches, so a missed notification never yields a stale view.

use sqlx::SqlitePool;
use std::marker::PhantomData;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::document::{self, Collection, Document};
use crate::error::{DbError, DbResult};

/// Default capacity of the notification channel.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Publisher side of the change feed.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Collection>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { sender }
    }

    /// Announces a committed change. Having no subscribers is not an error.
    pub fn publish(&self, collection: Collection) {
        let receivers = self.sender.send(collection).unwrap_or(0);
        debug!(%collection, receivers, "Change published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Subscription to one collection.
///
/// ## Example
/// ```rust,ignore
/// let mut orders = db.watch::<Order>();
/// let initial = orders.snapshot().await?;
/// loop {
///     let latest = orders.next_snapshot().await?;
///     render(latest);
/// }
/// ```
#[derive(Debug)]
pub struct CollectionWatch<D> {
    pool: SqlitePool,
    receiver: broadcast::Receiver<Collection>,
    _doc: PhantomData<fn() -> D>,
}

impl<D: Document> CollectionWatch<D> {
    pub(crate) fn new(pool: SqlitePool, receiver: broadcast::Receiver<Collection>) -> Self {
        CollectionWatch {
            pool,
            receiver,
            _doc: PhantomData,
        }
    }

    /// Current contents of the collection.
    pub async fn snapshot(&self) -> DbResult<Vec<D>> {
        document::fetch_all(&self.pool).await
    }

    /// Waits for the next change to the collection and returns the new
    /// contents.
    pub async fn next_snapshot(&mut self) -> DbResult<Vec<D>> {
        loop {
            match self.receiver.recv().await {
                Ok(collection) if collection == D::COLLECTION => return self.snapshot().await,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        collection = %D::COLLECTION,
                        skipped,
                        "Watcher lagged, refetching"
                    );
                    return self.snapshot().await;
                }
                Err(RecvError::Closed) => return Err(DbError::ChangeFeedClosed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::new(4);
        feed.publish(Collection::Orders);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_sees_collection_names() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        feed.publish(Collection::Tables);
        feed.publish(Collection::Orders);
        assert_eq!(rx.recv().await.unwrap(), Collection::Tables);
        assert_eq!(rx.recv().await.unwrap(), Collection::Orders);
    }
}
