//! Test utilities and fixtures for lyriks tests.
//!
//! This module provides registry entity factories plus mock registry and
//! provider implementations that count their calls, so tests can assert how
//! often the network would have been hit.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{MockRegistry, mock_release, with_url};
//!
//! let release = with_url(mock_release("r1", 3), "https://mock.example/album/A");
//! let registry = MockRegistry::default().with_release(release);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::lyrics::Lyrics;
use crate::model::{Artist, Medium, Release, TrackEntry};
use crate::musicbrainz::RegistryApi;
use crate::providers::{Provider, ProviderSong, extract_url_id};

/// URL prefix recognized by [`MockProvider`].
pub const MOCK_ALBUM_URL: &str = "https://mock.example/album/";

/// Creates a single-medium release with `track_count` tracks.
///
/// Track `i` (1-based) has id `"{id}-track-{i}"`, recording id
/// `"{id}-rec-{i}"` and number `"{i}"`. The release has no URLs; add them
/// with [`with_url`].
pub fn mock_release(id: &str, track_count: usize) -> Release {
    let tracks = (1..=track_count)
        .map(|i| TrackEntry {
            id: format!("{}-track-{}", id, i),
            recording_id: format!("{}-rec-{}", id, i),
            number: i.to_string(),
            position: i as u32,
        })
        .collect();

    Release {
        id: id.to_string(),
        title: format!("Release {}", id),
        release_group_id: "rg-1".to_string(),
        artist_credit: "Test Artist".to_string(),
        media: vec![Medium {
            position: 1,
            track_count,
            tracks,
        }],
        urls: vec![],
    }
}

/// Returns `release` with `url` appended to its URLs.
pub fn with_url(mut release: Release, url: &str) -> Release {
    release.urls.push(url.to_string());
    release
}

/// Creates an artist with the given URLs.
pub fn mock_artist(id: &str, urls: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {}", id),
        urls: urls.iter().map(|u| u.to_string()).collect(),
    }
}

/// Mock registry serving predefined releases and artists.
#[derive(Default)]
pub struct MockRegistry {
    /// Releases keyed by each of their track ids
    releases: HashMap<String, Release>,
    artists: HashMap<String, Artist>,
    /// Result of every release group browse
    group: Vec<Release>,
    failing: bool,
    release_calls: AtomicUsize,
    group_calls: AtomicUsize,
    artist_calls: AtomicUsize,
}

impl MockRegistry {
    /// Serve `release` for lookups by any of its track ids.
    pub fn with_release(mut self, release: Release) -> Self {
        for track in release.tracks() {
            self.releases.insert(track.id.clone(), release.clone());
        }
        self
    }

    pub fn with_artist(mut self, artist: Artist) -> Self {
        self.artists.insert(artist.id.clone(), artist);
        self
    }

    pub fn with_group(mut self, releases: Vec<Release>) -> Self {
        self.group = releases;
        self
    }

    /// Fail every request with a network error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn group_calls(&self) -> usize {
        self.group_calls.load(Ordering::SeqCst)
    }

    pub fn artist_calls(&self) -> usize {
        self.artist_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.failing {
            return Err(ApiError::Network("mock registry offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryApi for MockRegistry {
    async fn release_by_track(&self, track_id: &str) -> Result<Option<Release>, ApiError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.releases.get(track_id).cloned())
    }

    async fn releases_by_release_group(
        &self,
        _release_group_id: &str,
    ) -> Result<Vec<Release>, ApiError> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.group.clone())
    }

    async fn artist(&self, artist_id: &str) -> Result<Option<Artist>, ApiError> {
        self.artist_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.artists.get(artist_id).cloned())
    }
}

/// Song of [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSong {
    pub id: u64,
    pub album_index: u32,
    pub title: String,
}

impl ProviderSong for MockSong {
    fn id(&self) -> u64 {
        self.id
    }

    fn album_index(&self) -> u32 {
        self.album_index
    }

    fn title(&self) -> &str {
        &self.title
    }
}

/// Creates `count` songs with ids `base + i` and album indexes `i` (1-based).
pub fn mock_songs(base: u64, count: u32) -> Vec<MockSong> {
    (1..=count)
        .map(|i| MockSong {
            id: base + u64::from(i),
            album_index: i,
            title: format!("Song {}", i),
        })
        .collect()
}

/// Synced lyrics for `song_id` with a single line.
pub fn synced_lyrics(song_id: u64) -> Lyrics {
    Lyrics::from_timed_lines(song_id, format!("Song {}", song_id), vec![(0, "synced".into())])
        .expect("non-empty lyrics")
}

/// Static lyrics for `song_id` with a single line.
pub fn static_lyrics(song_id: u64) -> Lyrics {
    Lyrics::from_static(song_id, format!("Song {}", song_id), ["static"])
        .expect("non-empty lyrics")
}

/// Mock provider on the `mock.example` domain.
///
/// Album ids are taken from release URLs starting with [`MOCK_ALBUM_URL`].
#[derive(Default)]
pub struct MockProvider {
    albums: HashMap<String, Vec<MockSong>>,
    lyrics: HashMap<u64, Lyrics>,
    failing: bool,
    album_fetches: AtomicUsize,
    lyrics_fetches: AtomicUsize,
}

impl MockProvider {
    pub fn with_album(mut self, album_id: &str, songs: Vec<MockSong>) -> Self {
        self.albums.insert(album_id.to_string(), songs);
        self
    }

    pub fn with_lyrics(mut self, lyrics: Lyrics) -> Self {
        self.lyrics.insert(lyrics.song_id, lyrics);
        self
    }

    /// Fail every request with a network error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn album_fetches(&self) -> usize {
        self.album_fetches.load(Ordering::SeqCst)
    }

    pub fn lyrics_fetches(&self) -> usize {
        self.lyrics_fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.failing {
            return Err(ApiError::Network("mock provider offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for MockProvider {
    type AlbumId = String;
    type Song = MockSong;

    fn name(&self) -> &'static str {
        "Mock"
    }

    fn domain(&self) -> &'static str {
        "mock.example"
    }

    fn extract_album_id(&self, release: &Release) -> Option<String> {
        static PATTERN: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
            regex::Regex::new(r"^https://mock\.example/album/(\w+)").expect("valid regex")
        });
        extract_url_id(release, &PATTERN).map(str::to_string)
    }

    async fn fetch_album_songs(&self, album_id: &String) -> Result<Option<Vec<MockSong>>, ApiError> {
        self.album_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.albums.get(album_id).cloned())
    }

    async fn fetch_song_by_id(&self, song_id: u64) -> Result<Option<MockSong>, ApiError> {
        self.check()?;
        Ok(self
            .albums
            .values()
            .flatten()
            .find(|s| s.id == song_id)
            .cloned())
    }

    async fn fetch_song_lyrics(&self, song: &MockSong) -> Result<Option<Lyrics>, ApiError> {
        self.lyrics_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.lyrics.get(&song.id).cloned())
    }
}
