//! MusicBrainz registry integration
//!
//! Resolves release-track ids to releases, browses the releases of a release
//! group and fetches artists with their URL relationships.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

mod adapter;
mod client;
pub mod dto;
pub mod rate_limit;

use async_trait::async_trait;

pub use client::{DEFAULT_BASE_URL, MusicBrainzClient, USER_AGENT};
pub use rate_limit::RateLimiter;

use crate::error::ApiError;
use crate::model::{Artist, Release};

/// Registry lookups used by the resolver and the fetch orchestrator.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Official release containing the given release-track id.
    async fn release_by_track(&self, track_id: &str) -> Result<Option<Release>, ApiError>;

    /// All official releases of a release group, in registry order.
    async fn releases_by_release_group(
        &self,
        release_group_id: &str,
    ) -> Result<Vec<Release>, ApiError>;

    /// Artist with attached URLs.
    async fn artist(&self, artist_id: &str) -> Result<Option<Artist>, ApiError>;
}

#[async_trait]
impl RegistryApi for MusicBrainzClient {
    async fn release_by_track(&self, track_id: &str) -> Result<Option<Release>, ApiError> {
        MusicBrainzClient::release_by_track(self, track_id).await
    }

    async fn releases_by_release_group(
        &self,
        release_group_id: &str,
    ) -> Result<Vec<Release>, ApiError> {
        MusicBrainzClient::releases_by_release_group(self, release_group_id).await
    }

    async fn artist(&self, artist_id: &str) -> Result<Option<Artist>, ApiError> {
        MusicBrainzClient::artist(self, artist_id).await
    }
}
