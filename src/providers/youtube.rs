//! YouTube Data API v3 search client for video enrichment.
//!
//! One lookup resolves one query to the top matching video's watch URL.
//! The client is built for degraded operation: a missing API key turns every
//! lookup into "not found" instead of an error, so the pipeline still
//! produces a full study guide with empty video URLs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::VideoSearch;
use crate::error::LookupError;

const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Per-request deadline. Lookups run many-at-once during enrichment; one
/// hung request must not stall the whole batch indefinitely.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// [`VideoSearch`] backed by the YouTube Data API v3 `search` endpoint.
pub struct YouTubeSearchClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl YouTubeSearchClient {
    /// Create a search client.
    ///
    /// With `api_key: None` the client runs in degraded mode: every lookup
    /// warns once and resolves to "not found", matching the behaviour of a
    /// deployment without a configured key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Whether a key is configured (lookups can actually hit the network).
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearchClient {
    async fn lookup_video_url(&self, query: &str) -> Result<String, LookupError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("YouTube API key is missing; skipping video search for \"{query}\"");
            return Ok(String::new());
        };

        let response = self
            .client
            .get(YOUTUBE_SEARCH_URL)
            .timeout(SEARCH_TIMEOUT)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("key", api_key),
                ("maxResults", "1"),
                ("type", "video"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::RequestFailed {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::RequestFailed {
                detail: format!("HTTP {status}"),
            });
        }

        let payload: SearchResponse = response.json().await.map_err(|e| {
            LookupError::MalformedResponse {
                detail: e.to_string(),
            }
        })?;

        // No hit is a valid result, not an error.
        Ok(first_video_url(payload).unwrap_or_default())
    }
}

impl fmt::Debug for YouTubeSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeSearchClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Watch URL of the first search hit, if any.
///
/// Kept separate from the trait impl so response handling is testable from
/// canned JSON without network access.
fn first_video_url(payload: SearchResponse) -> Option<String> {
    let id = payload.items.into_iter().next()?.id?;
    let video_id = id.video_id?;
    Some(format!("{WATCH_URL_PREFIX}{video_id}"))
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<ItemId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}
