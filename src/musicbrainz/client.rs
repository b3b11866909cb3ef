//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to
//! 1 req/sec. Every request (and every retry) waits on the shared
//! [`RateLimiter`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::rate_limit::RateLimiter;
use super::{adapter, dto};
use crate::error::ApiError;
use crate::model::{Artist, Release};
use crate::retry::{MAX_ATTEMPTS, retry_transient};

/// Default registry endpoint
pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// User agent string - MusicBrainz requires this
pub const USER_AGENT: &str = concat!("lyriks/", env!("CARGO_PKG_VERSION"), " ( max@maxr1998.de )");

/// Includes needed to resolve album links and track listings
const RELEASE_INCLUDES: &str = "media+url-rels+release-groups+artist-credits";

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Create a client against `base_url` with the given request spacing.
    pub fn new(
        base_url: impl Into<String>,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(interval),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn interval(&self) -> Duration {
        self.limiter.interval()
    }

    /// Look up the official release containing a release-track id.
    pub async fn release_by_track(&self, track_id: &str) -> Result<Option<Release>, ApiError> {
        let url = format!(
            "{}/release?track={}&status=official&inc={}&fmt=json",
            self.base_url,
            urlencoding::encode(track_id),
            RELEASE_INCLUDES
        );
        let response: Option<dto::ReleaseBrowseResponse> =
            self.get_json(&url, "MusicBrainz release lookup").await?;

        Ok(response
            .and_then(|r| r.releases.into_iter().next())
            .map(adapter::to_release))
    }

    /// Browse all official releases of a release group.
    pub async fn releases_by_release_group(
        &self,
        release_group_id: &str,
    ) -> Result<Vec<Release>, ApiError> {
        let url = format!(
            "{}/release?release-group={}&status=official&inc={}&limit=100&fmt=json",
            self.base_url,
            urlencoding::encode(release_group_id),
            RELEASE_INCLUDES
        );
        let response: Option<dto::ReleaseBrowseResponse> =
            self.get_json(&url, "MusicBrainz release group browse").await?;

        Ok(response
            .map(|r| r.releases.into_iter().map(adapter::to_release).collect())
            .unwrap_or_default())
    }

    /// Look up an artist with its URL relationships.
    pub async fn artist(&self, artist_id: &str) -> Result<Option<Artist>, ApiError> {
        let url = format!(
            "{}/artist/{}?inc=url-rels&fmt=json",
            self.base_url,
            urlencoding::encode(artist_id)
        );
        let response: Option<dto::ArtistResponse> =
            self.get_json(&url, "MusicBrainz artist lookup").await?;

        Ok(response.map(adapter::to_artist))
    }

    /// Rate-limited, retried GET. `Ok(None)` means the entity does not exist.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        label: &str,
    ) -> Result<Option<T>, ApiError> {
        retry_transient(MAX_ATTEMPTS, label, || async {
            self.limiter.acquire().await;
            debug!(url, "registry request");
            self.send_request(url).await
        })
        .await
    }

    /// Send the HTTP request and parse the response
    async fn send_request<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ApiError> {
        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(ApiError::invalid(error.error));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}
