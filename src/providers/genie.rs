//! Genie Music backend.
//!
//! Album listings and stream info come from Genie's JSON app endpoints.
//! Synced lyrics are served as a JSONP callback mapping millisecond
//! timestamps to lines; when that is unavailable the static lyrics embedded
//! in the stream info are used instead.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Provider, ProviderSong, build_http_client, check_status, extract_url_id};
use crate::error::ApiError;
use crate::lyrics::Lyrics;
use crate::model::Release;
use crate::retry::{MAX_ATTEMPTS, retry_transient};

const ALBUM_SONGS_URL: &str = "https://app.genie.co.kr/song/j_AlbumSongList.json";
const STREAM_INFO_URL: &str = "https://stm.genie.co.kr/player/j_StmInfo.json";
const LYRICS_URL: &str = "https://dn.genie.co.kr/app/purchase/get_msl.asp";

/// Genie rejects most library user agents but accepts curl's.
const CURL_USER_AGENT: &str = "curl/8.7.1";

const CALLBACK_PREFIX: &str = "GenieCallback(";

static ALBUM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?:www\.)?genie\.co\.kr/detail/albumInfo\?axnm=(\d+)")
        .expect("valid album url pattern")
});

/// A song on Genie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenieSong {
    pub id: u64,
    pub album_index: u32,
    pub title: String,
}

impl ProviderSong for GenieSong {
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

// Genie encodes numbers as strings, but not consistently.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct AlbumResponse {
    data1: Option<DataList<AlbumEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct AlbumEntry {
    song_id: Option<Number>,
    album_track_no: Option<Number>,
    song_name: Option<String>,
    album_cd_no: Option<Number>,
}

#[derive(Debug, Deserialize)]
struct StreamInfoResponse {
    #[serde(rename = "DataSet")]
    data_set: Option<DataList<StreamInfo>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct StreamInfo {
    album_id: Option<Number>,
    lyrics: Option<String>,
}

/// Songs of a single-disc album, ordered by track number.
///
/// Multi-disc albums and entries missing an id, track number or title are
/// rejected as a whole.
fn parse_album_songs(response: AlbumResponse) -> Result<Option<Vec<GenieSong>>, ApiError> {
    let Some(entries) = response.data1.map(|d| d.data) else {
        return Ok(None);
    };

    if entries
        .iter()
        .any(|e| e.album_cd_no.as_ref().and_then(Number::as_u64) != Some(1))
    {
        debug!("Genie album has multiple discs, skipping");
        return Ok(None);
    }

    let mut songs = Vec::with_capacity(entries.len());
    for entry in entries {
        let (Some(id), Some(index), Some(name)) = (
            entry.song_id.as_ref().and_then(Number::as_u64),
            entry.album_track_no.as_ref().and_then(Number::as_u64),
            entry.song_name,
        ) else {
            return Ok(None);
        };
        let title = urlencoding::decode(&name).map_err(|e| ApiError::Parse(e.to_string()))?;
        songs.push(GenieSong {
            id,
            album_index: u32::try_from(index).map_err(|e| ApiError::Parse(e.to_string()))?,
            title: title.into_owned(),
        });
    }
    songs.sort_by_key(|s| s.album_index);
    Ok(Some(songs))
}

/// Timed lines from a `GenieCallback({...});` payload, or `None` if the
/// response is not a callback.
fn parse_synced_lyrics(body: &str) -> Result<Option<Vec<(u64, String)>>, ApiError> {
    let Some(payload) = body.trim().strip_prefix(CALLBACK_PREFIX) else {
        return Ok(None);
    };
    let payload = payload.strip_suffix(");").unwrap_or(payload);

    let raw: HashMap<String, String> = serde_json::from_str(payload)?;
    raw.into_iter()
        .map(|(timestamp, line)| {
            timestamp
                .trim()
                .parse::<u64>()
                .map(|ms| (ms, line))
                .map_err(|e| ApiError::Parse(format!("bad timestamp '{}': {}", timestamp, e)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Static lyrics lines from the percent-encoded stream info field.
fn static_lines(raw: &str) -> Result<Vec<String>, ApiError> {
    let decoded = urlencoding::decode(raw).map_err(|e| ApiError::Parse(e.to_string()))?;
    Ok(decoded.split("<br>").map(str::to_string).collect())
}

/// Genie Music lyrics provider.
pub struct Genie {
    http_client: reqwest::Client,
}

impl Genie {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, ApiError> {
        debug!(url, ?query, "Genie request");
        let response = self
            .http_client
            .get(url)
            .query(query)
            .header(reqwest::header::USER_AGENT, CURL_USER_AGENT)
            .send()
            .await?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        label: &str,
    ) -> Result<T, ApiError> {
        retry_transient(MAX_ATTEMPTS, label, || async {
            let response = check_status(self.get(url, query).await?)?;
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        })
        .await
    }

    async fn stream_info(&self, song_id: u64) -> Result<Option<StreamInfo>, ApiError> {
        let response: StreamInfoResponse = self
            .get_json(
                STREAM_INFO_URL,
                &[("xgnm", song_id.to_string())],
                "Genie stream info",
            )
            .await?;
        Ok(response
            .data_set
            .and_then(|d| d.data.into_iter().next()))
    }
}

#[async_trait]
impl Provider for Genie {
    type AlbumId = u64;
    type Song = GenieSong;

    fn name(&self) -> &'static str {
        "Genie"
    }

    fn domain(&self) -> &'static str {
        "genie.co.kr"
    }

    fn extract_album_id(&self, release: &Release) -> Option<u64> {
        extract_url_id(release, &ALBUM_URL)?.parse().ok()
    }

    async fn fetch_album_songs(&self, album_id: &u64) -> Result<Option<Vec<GenieSong>>, ApiError> {
        let response: AlbumResponse = self
            .get_json(
                ALBUM_SONGS_URL,
                &[("axnm", album_id.to_string())],
                "Genie album songs",
            )
            .await?;
        parse_album_songs(response)
    }

    async fn fetch_song_by_id(&self, song_id: u64) -> Result<Option<GenieSong>, ApiError> {
        let Some(album_id) = self
            .stream_info(song_id)
            .await?
            .and_then(|info| info.album_id)
            .and_then(|id| id.as_u64())
        else {
            return Ok(None);
        };

        let songs = self.fetch_album_songs(&album_id).await?.unwrap_or_default();
        Ok(songs.into_iter().find(|s| s.id == song_id))
    }

    async fn fetch_song_lyrics(&self, song: &GenieSong) -> Result<Option<Lyrics>, ApiError> {
        let body = retry_transient(MAX_ATTEMPTS, "Genie lyrics", || async {
            let response = self
                .get(
                    LYRICS_URL,
                    &[
                        ("songid", song.id.to_string()),
                        ("callback", "GenieCallback".to_string()),
                    ],
                )
                .await?;
            Ok(response.text().await?)
        })
        .await?;

        if let Some(entries) = parse_synced_lyrics(&body)? {
            return Ok(Lyrics::from_timed_lines(song.id, &song.title, entries));
        }

        // No synced lyrics, fall back to the static ones
        let Some(raw) = self
            .stream_info(song.id)
            .await?
            .and_then(|info| info.lyrics)
            .filter(|l| !l.is_empty())
        else {
            return Ok(None);
        };
        Ok(Lyrics::from_static(song.id, &song.title, static_lines(&raw)?))
    }
}
