//! MusicBrainz API Data Transfer Objects
//!
//! These types match what the MusicBrainz API returns for the lookups we
//! perform. DO NOT use these types outside the musicbrainz module - convert
//! to domain types in `adapter.rs`.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API

use serde::Deserialize;

/// Release browse response (`/release?track=...` or `/release?release-group=...`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseBrowseResponse {
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// Release with media and URL relationships
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    pub id: String,
    pub title: String,
    pub status: Option<String>,
    pub release_group: Option<ReleaseGroup>,
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub media: Vec<Medium>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseGroup {
    pub id: String,
}

/// Artist credit (can be multiple for collaborations)
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistCredit {
    pub name: Option<String>,
    pub joinphrase: Option<String>,
    pub artist: CreditedArtist,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditedArtist {
    pub id: String,
    pub name: String,
}

/// Medium (disc) within a release
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Medium {
    pub position: Option<u32>,
    pub track_count: u32,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Track on a medium
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: String,
    pub number: String,
    pub position: u32,
    pub recording: Recording,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    pub id: String,
}

/// Relationship; only URL relationships carry a `url`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Relation {
    pub target_type: Option<String>,
    pub url: Option<UrlResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlResource {
    pub resource: String,
}

/// Artist lookup response (`/artist/<id>?inc=url-rels`)
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Error response from MusicBrainz API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: String,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// ============================================================================
