//! Enrichment fan-out: resolve a video URL for every recommendation stub.
//!
//! One lookup per stub, all in flight at once. The in-flight window equals
//! the stub count: the external search quota is the limiting factor, not
//! local resources, so there is no concurrency knob and no overall timeout.
//!
//! Two guarantees hold for the batch:
//!
//! - **Order**: output is ordered by original stub index, regardless of
//!   lookup completion order.
//! - **Degradation**: a failed lookup produces an empty `videoUrl` for that
//!   entry only, logged at warn level and absorbed. The batch itself never
//!   fails.
//!
//! The caller owns the returned future. Dropping it mid-flight (the
//! controller does so on cancellation) drops the `buffer_unordered` stream
//! and with it every outstanding lookup.

use std::sync::Arc;

use futures::{stream, StreamExt};
use tracing::{debug, warn};

use crate::output::{RecommendationStub, VideoRecommendation};
use crate::progress::ObserverHandle;
use crate::providers::VideoSearch;

/// Resolve URLs for all stubs concurrently, preserving input order.
///
/// The lookup query is the stub's title. Observers receive one
/// `on_lookup_complete` per stub, in completion order.
pub async fn resolve_urls(
    lookup: &Arc<dyn VideoSearch>,
    observers: &[ObserverHandle],
    stubs: Vec<RecommendationStub>,
) -> Vec<VideoRecommendation> {
    let total = stubs.len();

    let mut indexed: Vec<(usize, VideoRecommendation)> =
        stream::iter(stubs.into_iter().enumerate().map(|(idx, stub)| {
            let lookup = Arc::clone(lookup);
            async move {
                let url = match lookup.lookup_video_url(&stub.title).await {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Video lookup failed for \"{}\": {}", stub.title, e);
                        String::new()
                    }
                };
                let found = !url.is_empty();
                debug!(
                    "Video search for \"{}\": {}",
                    stub.title,
                    if found { url.as_str() } else { "not found" }
                );
                for obs in observers {
                    obs.on_lookup_complete(idx, total, found);
                }
                (idx, stub.with_url(url))
            }
        }))
        .buffer_unordered(total.max(1))
        .collect()
        .await;

    // Completion order is arbitrary; restore input order.
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, rec)| rec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::progress::StageObserver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn stub(title: &str, order: i64) -> RecommendationStub {
        RecommendationStub {
            title: title.into(),
            description: format!("about {title}"),
            topic_order: order,
        }
    }

    /// Resolves later stubs faster, so completion order is the reverse of
    /// input order.
    struct ReverseLatencyLookup {
        total: usize,
    }

    #[async_trait::async_trait]
    impl VideoSearch for ReverseLatencyLookup {
        async fn lookup_video_url(&self, query: &str) -> Result<String, LookupError> {
            let position: usize = query
                .rsplit(' ')
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            let delay = (self.total - position) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("https://www.youtube.com/watch?v=vid{position}"))
        }
    }

    /// Fails for one specific query, resolves everything else.
    struct OneBadLookup;

    #[async_trait::async_trait]
    impl VideoSearch for OneBadLookup {
        async fn lookup_video_url(&self, query: &str) -> Result<String, LookupError> {
            if query.contains("bad") {
                Err(LookupError::Timeout)
            } else {
                Ok("https://www.youtube.com/watch?v=ok".into())
            }
        }
    }

    struct CountingObserver {
        lookups: AtomicUsize,
        found: AtomicUsize,
    }

    impl StageObserver for CountingObserver {
        fn on_lookup_complete(&self, _index: usize, _total: usize, found: bool) {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if found {
                self.found.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn output_order_matches_input_despite_completion_order() {
        let lookup: Arc<dyn VideoSearch> = Arc::new(ReverseLatencyLookup { total: 4 });
        let stubs = (0..4).map(|i| stub(&format!("topic {i}"), i as i64 + 1)).collect();

        let recs = resolve_urls(&lookup, &[], stubs).await;

        assert_eq!(recs.len(), 4);
        for (i, rec) in recs.iter().enumerate() {
            assert_eq!(rec.topic_order, i as i64 + 1);
            assert_eq!(rec.video_url, format!("https://www.youtube.com/watch?v=vid{i}"));
        }
    }

    #[tokio::test]
    async fn failed_lookup_degrades_that_entry_only() {
        let lookup: Arc<dyn VideoSearch> = Arc::new(OneBadLookup);
        let stubs = vec![stub("good one", 1), stub("bad one", 2), stub("good two", 3)];

        let recs = resolve_urls(&lookup, &[], stubs).await;

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].video_url, "https://www.youtube.com/watch?v=ok");
        assert_eq!(recs[1].video_url, "");
        assert_eq!(recs[2].video_url, "https://www.youtube.com/watch?v=ok");
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let lookup: Arc<dyn VideoSearch> = Arc::new(OneBadLookup);
        let recs = resolve_urls(&lookup, &[], Vec::new()).await;
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn observers_see_every_lookup() {
        let lookup: Arc<dyn VideoSearch> = Arc::new(OneBadLookup);
        let counter = Arc::new(CountingObserver {
            lookups: AtomicUsize::new(0),
            found: AtomicUsize::new(0),
        });
        let observers: Vec<ObserverHandle> = vec![counter.clone()];
        let stubs = vec![stub("good", 1), stub("bad", 2)];

        let recs = resolve_urls(&lookup, &observers, stubs).await;

        assert_eq!(recs.len(), 2);
        assert_eq!(counter.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(counter.found.load(Ordering::SeqCst), 1);
    }
}
