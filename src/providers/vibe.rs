//! NAVER VIBE backend.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use tracing::debug;

use super::{Provider, ProviderSong, build_http_client, check_status, extract_url_id};
use crate::error::ApiError;
use crate::lyrics::Lyrics;
use crate::model::Release;
use crate::retry::{MAX_ATTEMPTS, retry_transient};

const API_URL: &str = "https://apis.naver.com/vibeWeb/musicapiweb";

static ALBUM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://vibe\.naver\.com/album/(\d+)").expect("valid album url pattern")
});

/// A track on VIBE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VibeSong {
    pub id: u64,
    pub album_index: u32,
    pub title: String,
    pub artists: SmallVec<[String; 2]>,
}

impl ProviderSong for VibeSong {
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

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Response<T>,
}

#[derive(Debug, Deserialize)]
struct Response<T> {
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TracksResult {
    #[serde(default = "Vec::new")]
    tracks: Vec<TrackInfo>,
}

#[derive(Debug, Deserialize)]
struct TrackResult {
    track: Option<TrackInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackInfo {
    track_id: u64,
    track_number: u32,
    track_title: String,
    #[serde(default = "Vec::new")]
    artists: Vec<ArtistInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtistInfo {
    artist_name: String,
}

impl From<TrackInfo> for VibeSong {
    fn from(info: TrackInfo) -> Self {
        Self {
            id: info.track_id,
            album_index: info.track_number,
            title: info.track_title,
            artists: info.artists.into_iter().map(|a| a.artist_name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LyricResult {
    lyric: Option<LyricData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LyricData {
    #[serde(default)]
    has_sync_lyric: bool,
    sync_lyric: Option<SyncLyric>,
    #[serde(default)]
    has_normal_lyric: bool,
    normal_lyric: Option<NormalLyric>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncLyric {
    /// Line start times in seconds
    #[serde(default = "Vec::new")]
    start_time_index: Vec<f64>,
    #[serde(default = "Vec::new")]
    contents: Vec<SyncContent>,
}

#[derive(Debug, Deserialize)]
struct SyncContent {
    #[serde(default = "Vec::new")]
    text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NormalLyric {
    text: String,
}

/// Synced lyrics win over plain ones; mismatched time and text arrays
/// mean no lyrics.
fn to_lyrics(song: &VibeSong, data: LyricData) -> Option<Lyrics> {
    if data.has_sync_lyric {
        let sync = data.sync_lyric?;
        let lines = sync.contents.into_iter().next()?.text;
        if lines.len() != sync.start_time_index.len() {
            debug!(song_id = song.id, "VIBE sync lyric arrays differ in length");
            return None;
        }
        let entries = sync
            .start_time_index
            .into_iter()
            .zip(lines)
            .map(|(seconds, line)| ((seconds * 1000.0) as u64, line))
            .collect();
        return Lyrics::from_timed_lines(song.id, &song.title, entries);
    }

    if data.has_normal_lyric {
        let text = data.normal_lyric?.text;
        return Lyrics::from_static(song.id, &song.title, text.split('\n'));
    }

    None
}

/// NAVER VIBE lyrics provider.
pub struct Vibe {
    http_client: reqwest::Client,
}

impl Vibe {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
        })
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        label: &str,
    ) -> Result<Option<T>, ApiError> {
        let url = format!("{}{}", API_URL, path);
        retry_transient(MAX_ATTEMPTS, label, || async {
            debug!(url = %url, "VIBE request");
            let response = self
                .http_client
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let body = check_status(response)?.bytes().await?;
            let envelope: Envelope<T> = serde_json::from_slice(&body)?;
            Ok(envelope.response.result)
        })
        .await
    }
}

#[async_trait]
impl Provider for Vibe {
    type AlbumId = u64;
    type Song = VibeSong;

    fn name(&self) -> &'static str {
        "VIBE"
    }

    fn domain(&self) -> &'static str {
        "vibe.naver.com"
    }

    fn extract_album_id(&self, release: &Release) -> Option<u64> {
        extract_url_id(release, &ALBUM_URL)?.parse().ok()
    }

    async fn fetch_album_songs(&self, album_id: &u64) -> Result<Option<Vec<VibeSong>>, ApiError> {
        let result: Option<TracksResult> = self
            .get_result(
                &format!("/album/{}/tracks?start=1&display=1000", album_id),
                "VIBE album tracks",
            )
            .await?;

        Ok(result.map(|r| {
            let mut songs: Vec<VibeSong> = r.tracks.into_iter().map(VibeSong::from).collect();
            songs.sort_by_key(|s| s.album_index);
            songs
        }))
    }

    async fn fetch_song_by_id(&self, song_id: u64) -> Result<Option<VibeSong>, ApiError> {
        let result: Option<TrackResult> = self
            .get_result(&format!("/track/{}", song_id), "VIBE track")
            .await?;
        Ok(result.and_then(|r| r.track).map(VibeSong::from))
    }

    async fn fetch_song_lyrics(&self, song: &VibeSong) -> Result<Option<Lyrics>, ApiError> {
        let result: Option<LyricResult> = self
            .get_result(&format!("/vibe/v4/lyric/{}", song.id), "VIBE lyrics")
            .await?;
        Ok(result.and_then(|r| r.lyric).and_then(|data| to_lyrics(song, data)))
    }
}
