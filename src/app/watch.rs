use std::collections::HashSet;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::Stream;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use super::Message;
use crate::core::models::Record;
use crate::core::store::PreferenceStore;
use crate::error::Result;

/// Poll `fetch` every `period` (first poll immediately) and wrap each
/// success with `wrap`. Failures are logged and produce nothing, so the
/// screen keeps its stale data.
fn poll_stream<T, M, F>(
    what: &'static str,
    period: Duration,
    fetch: F,
    wrap: fn(T) -> M,
) -> impl Stream<Item = M>
where
    T: Send + 'static,
    M: Send + 'static,
    F: Fn() -> BoxFuture<'static, Result<T>> + Send + 'static,
{
    // The interval is created on first poll so the stream can be built
    // outside a runtime.
    futures::stream::unfold((None::<time::Interval>, fetch), move |(ticker, fetch)| async move {
        let mut ticker = ticker.unwrap_or_else(|| {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        loop {
            ticker.tick().await;
            match fetch().await {
                Ok(value) => return Some((wrap(value), (Some(ticker), fetch))),
                Err(e) => log::warn!("{what} refresh failed: {e}"),
            }
        }
    })
}

/// Full collection refresh.
pub fn collection_stream<R, F>(period: Duration, fetch: F) -> impl Stream<Item = Message<R>>
where
    R: Record + Send + 'static,
    R::Id: Send,
    F: Fn() -> BoxFuture<'static, Result<Vec<R>>> + Send + 'static,
{
    poll_stream("Collection", period, fetch, Message::CollectionUpdated)
}

/// Ids with an operation in flight (syncing accounts and the like).
pub fn busy_stream<R, F>(period: Duration, fetch: F) -> impl Stream<Item = Message<R>>
where
    R: Record + Send + 'static,
    R::Id: Send,
    F: Fn() -> BoxFuture<'static, Result<HashSet<R::Id>>> + Send + 'static,
{
    poll_stream("Busy set", period, fetch, Message::BusyChanged)
}

/// Preference writes from any screen sharing `store`.
pub fn preference_stream<R>(store: &dyn PreferenceStore) -> impl Stream<Item = Message<R>>
where
    R: Record + Send + 'static,
    R::Id: Send,
{
    futures::stream::unfold(store.subscribe(), |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => return Some((Message::PreferenceChanged(change), rx)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("Missed {n} preference changes");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::{FutureExt, StreamExt};

    use super::*;
    use crate::core::models::fixtures::accounts;
    use crate::core::models::Account;
    use crate::core::store::MemoryStore;
    use crate::error::Error;

    #[tokio::test]
    async fn failed_fetches_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::Fetch("server unavailable".into()))
                } else {
                    Ok(accounts(n))
                }
            }
            .boxed()
        };

        let messages: Vec<Message<Account>> = collection_stream(Duration::from_millis(5), fetch)
            .take(2)
            .collect()
            .await;

        let sizes: Vec<usize> = messages
            .iter()
            .map(|m| match m {
                Message::CollectionUpdated(records) => records.len(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(sizes, [1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn busy_set_is_wrapped() {
        let fetch = || async { Ok::<_, Error>(HashSet::from(["uid-3".to_string()])) }.boxed();
        let mut stream = Box::pin(busy_stream::<Account, _>(Duration::from_millis(5), fetch));
        match stream.next().await {
            Some(Message::BusyChanged(ids)) => assert!(ids.contains("uid-3")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn preference_changes_become_messages() {
        let store = MemoryStore::new();
        let mut stream = Box::pin(preference_stream::<Account>(&store));
        store.write("accounts.density", "compact").unwrap();

        match stream.next().await {
            Some(Message::PreferenceChanged(change)) => {
                assert_eq!(change.key, "accounts.density");
                assert_eq!(change.value.as_deref(), Some("compact"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
