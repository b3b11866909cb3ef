//! Lyrics providers.
//!
//! Each backend implements [`Provider`]: extracting its album id from the
//! URLs attached to a registry release, listing an album's songs, fetching a
//! song by id and fetching a song's lyrics. The wire protocols stay private
//! to each backend module.
//!
//! [`ProviderKind`] maps a configuration string to a backend; the CLI then
//! dispatches to a generic run over the concrete type.

pub mod genie;
pub mod qqmusic;
pub mod vibe;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::warn;

pub use genie::Genie;
pub use qqmusic::QqMusic;
pub use vibe::Vibe;

use crate::error::ApiError;
use crate::lyrics::Lyrics;
use crate::model::{Artist, Release};
use crate::report::MissingReport;

/// Browser user agent for providers that reject library clients.
pub(crate) const CHROME_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// A song entity in a provider-specific context.
pub trait ProviderSong: Clone + fmt::Debug + Send + Sync + 'static {
    /// Provider-internal song id
    fn id(&self) -> u64;
    /// 1-based index of the song on its album
    fn album_index(&self) -> u32;
    fn title(&self) -> &str;
}

/// Capability set of a lyrics backend.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Provider-specific album identifier
    type AlbumId: Clone + fmt::Display + Send + Sync + 'static;
    type Song: ProviderSong;

    /// Name used in console output
    fn name(&self) -> &'static str;

    /// Primary domain, used to recognize artist URLs
    fn domain(&self) -> &'static str;

    /// Album id from the URLs attached to `release`, if any. Never performs I/O.
    fn extract_album_id(&self, release: &Release) -> Option<Self::AlbumId>;

    /// Songs of an album, ordered by album index.
    async fn fetch_album_songs(
        &self,
        album_id: &Self::AlbumId,
    ) -> Result<Option<Vec<Self::Song>>, ApiError>;

    async fn fetch_song_by_id(&self, song_id: u64) -> Result<Option<Self::Song>, ApiError>;

    async fn fetch_song_lyrics(&self, song: &Self::Song) -> Result<Option<Lyrics>, ApiError>;

    /// Whether any of the artist's URLs points at this provider.
    ///
    /// Artists without such a URL are recorded (once) in `report`.
    fn has_artist_url(&self, artist: &Artist, report: &MissingReport) -> bool {
        let domain = self.domain();
        if artist.urls.iter().any(|url| url.contains(domain)) {
            return true;
        }

        if report.record_artist(artist) {
            warn!("No {} URL found for artist {}", domain, artist.display_name());
        }
        false
    }
}

/// Selectable provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Genie,
    QqMusic,
    Vibe,
}

impl ProviderKind {
    pub const NAMES: &'static [&'static str] = &["genie", "qq", "qqm", "qqmusic", "vibe"];
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "genie" => Ok(Self::Genie),
            "qq" | "qqm" | "qqmusic" => Ok(Self::QqMusic),
            "vibe" => Ok(Self::Vibe),
            other => Err(format!(
                "unknown provider '{}' (expected one of: {})",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Genie => "genie",
            Self::QqMusic => "qqmusic",
            Self::Vibe => "vibe",
        })
    }
}

/// HTTP client shared by a provider's requests.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| ApiError::Network(e.to_string()))
}

/// Reject non-success responses.
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

/// First capture of the first release URL matching `pattern`.
pub(crate) fn extract_url_id<'a>(release: &'a Release, pattern: &Regex) -> Option<&'a str> {
    release
        .urls
        .iter()
        .find_map(|url| pattern.captures(url)?.get(1).map(|m| m.as_str()))
}
