//! QQ Music backend.
//!
//! All requests go through the signed `musicu.fcg` gateway, which takes a
//! `comm` block plus one or more module calls (`req_1`, ...) and answers
//! with one result per call.

mod sign;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use smallvec::SmallVec;
use tracing::debug;

use super::{
    CHROME_USER_AGENT, Provider, ProviderSong, build_http_client, check_status, extract_url_id,
};
use crate::error::ApiError;
use crate::lyrics::Lyrics;
use crate::model::Release;
use crate::retry::{MAX_ATTEMPTS, retry_transient};

pub use sign::zzc_sign;

const API_URL: &str = "https://u.y.qq.com/cgi-bin/musicu.fcg";

static ALBUM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://y\.qq\.com/n/ryqq/albumDetail/(\w+)").expect("valid album url pattern")
});

/// Word-timed lyrics come wrapped in an XML attribute whose quotes are not
/// escaped, so they are cut out by pattern instead of parsed.
static LYRIC_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"LyricContent="([\s\S]*?)"\s*/>"#).expect("valid lyric content pattern")
});

/// A song on QQ Music.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QqSong {
    pub id: u64,
    /// Alphanumeric media id, used by the lyrics endpoint
    pub mid: String,
    pub album_index: u32,
    pub title: String,
    pub artists: SmallVec<[String; 2]>,
}

impl ProviderSong for QqSong {
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

#[derive(Debug, Serialize)]
struct Comm {
    cv: u32,
    ct: u32,
    format: &'static str,
    #[serde(rename = "inCharset")]
    in_charset: &'static str,
    #[serde(rename = "outCharset")]
    out_charset: &'static str,
    notice: u32,
    platform: &'static str,
    #[serde(rename = "needNewCode")]
    need_new_code: u32,
    uin: String,
    g_tk_new_20200303: u64,
    g_tk: u64,
}

impl Comm {
    fn new(uin: String) -> Self {
        Self {
            cv: 4747474,
            ct: 24,
            format: "json",
            in_charset: "utf-8",
            out_charset: "utf-8",
            notice: 0,
            platform: "yqq.json",
            need_new_code: 1,
            uin,
            g_tk_new_20200303: 1077614320,
            g_tk: 1077614320,
        }
    }
}

/// Ten distinct digits in random order.
fn random_uin() -> String {
    let mut digits = *b"1234567890";
    digits.shuffle(&mut rand::rng());
    digits.iter().map(|&d| d as char).collect()
}

#[derive(Debug, Serialize)]
struct ModuleCall {
    module: &'static str,
    method: &'static str,
    param: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    comm: &'a Comm,
    req_1: ModuleCall,
}

#[derive(Debug, Deserialize)]
struct Response<T> {
    req_1: Option<ModuleResult<T>>,
}

#[derive(Debug, Deserialize)]
struct ModuleResult<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AlbumSongList {
    #[serde(rename = "songList", default = "Vec::new")]
    song_list: Vec<AlbumSongEntry>,
}

#[derive(Debug, Deserialize)]
struct AlbumSongEntry {
    #[serde(rename = "songInfo")]
    song_info: SongInfo,
}

#[derive(Debug, Deserialize)]
struct TrackInfoList {
    #[serde(default = "Vec::new")]
    tracks: Vec<SongInfo>,
}

#[derive(Debug, Deserialize)]
struct SongInfo {
    id: u64,
    mid: String,
    index_album: u32,
    title: String,
    #[serde(default = "Vec::new")]
    singer: Vec<Singer>,
}

#[derive(Debug, Deserialize)]
struct Singer {
    name: String,
}

impl From<SongInfo> for QqSong {
    fn from(info: SongInfo) -> Self {
        Self {
            id: info.id,
            mid: info.mid,
            album_index: info.index_album,
            title: info.title,
            artists: info.singer.into_iter().map(|s| s.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlayLyricInfo {
    #[serde(default)]
    lyric: String,
}

/// Decode the base64 lyric payload. A `LyricContent` wrapper holds
/// word-timed lyrics, anything else is treated as LRC text.
fn decode_lyrics(song: &QqSong, encoded: &str) -> Result<Option<Lyrics>, ApiError> {
    if encoded.trim().is_empty() {
        return Ok(None);
    }
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::Parse(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| ApiError::Parse(e.to_string()))?;

    if let Some(content) = LYRIC_CONTENT.captures(&text).and_then(|c| c.get(1)) {
        return Ok(Lyrics::from_word_timed(song.id, &song.title, content.as_str()));
    }
    Ok(Lyrics::from_lrc_text(song.id, &song.title, &text))
}

/// QQ Music lyrics provider.
pub struct QqMusic {
    http_client: reqwest::Client,
    comm: Comm,
}

impl QqMusic {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            comm: Comm::new(random_uin()),
        })
    }

    /// Perform a single signed module call and return its `data` block.
    async fn call<T: DeserializeOwned>(
        &self,
        module: &'static str,
        method: &'static str,
        param: serde_json::Value,
    ) -> Result<Option<T>, ApiError> {
        let body = serde_json::to_string(&Request {
            comm: &self.comm,
            req_1: ModuleCall {
                module,
                method,
                param,
            },
        })?;
        let signature = zzc_sign(&body);

        retry_transient(MAX_ATTEMPTS, method, || async {
            let timestamp = chrono::Utc::now().timestamp_millis().to_string();
            debug!(module, method, "QQ Music request");
            let response = self
                .http_client
                .post(API_URL)
                .query(&[("_", timestamp.as_str()), ("sign", signature.as_str())])
                .header(reqwest::header::ACCEPT, "application/json")
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-DE,en;q=1")
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .header(reqwest::header::ORIGIN, "https://y.qq.com")
                .header(reqwest::header::REFERER, "https://y.qq.com/")
                .header(reqwest::header::USER_AGENT, CHROME_USER_AGENT)
                .body(body.clone())
                .send()
                .await?;
            let bytes = check_status(response)?.bytes().await?;
            let response: Response<T> = serde_json::from_slice(&bytes)?;
            Ok(response.req_1.and_then(|r| r.data))
        })
        .await
    }
}

#[async_trait]
impl Provider for QqMusic {
    /// Album mid
    type AlbumId = String;
    type Song = QqSong;

    fn name(&self) -> &'static str {
        "QQ Music"
    }

    fn domain(&self) -> &'static str {
        "y.qq.com"
    }

    fn extract_album_id(&self, release: &Release) -> Option<String> {
        extract_url_id(release, &ALBUM_URL).map(str::to_string)
    }

    async fn fetch_album_songs(&self, album_mid: &String) -> Result<Option<Vec<QqSong>>, ApiError> {
        let list: Option<AlbumSongList> = self
            .call(
                "music.musichallAlbum.AlbumSongList",
                "GetAlbumSongList",
                json!({ "albumMid": album_mid, "albumID": 0, "begin": 0, "num": 100, "order": 2 }),
            )
            .await?;

        Ok(list.map(|list| {
            let mut songs: Vec<QqSong> = list
                .song_list
                .into_iter()
                .map(|entry| QqSong::from(entry.song_info))
                .collect();
            songs.sort_by_key(|s| s.album_index);
            songs
        }))
    }

    async fn fetch_song_by_id(&self, song_id: u64) -> Result<Option<QqSong>, ApiError> {
        let list: Option<TrackInfoList> = self
            .call(
                "music.trackInfo.UniformRuleCtrl",
                "CgiGetTrackInfo",
                json!({ "ids": [song_id], "types": [0] }),
            )
            .await?;
        Ok(list
            .and_then(|l| l.tracks.into_iter().next())
            .map(QqSong::from))
    }

    async fn fetch_song_lyrics(&self, song: &QqSong) -> Result<Option<Lyrics>, ApiError> {
        let info: Option<PlayLyricInfo> = self
            .call(
                "music.musichallSong.PlayLyricInfo",
                "GetPlayLyricInfo",
                json!({ "songMID": song.mid, "songID": song.id }),
            )
            .await?;
        match info {
            Some(info) => decode_lyrics(song, &info.lyric),
            None => Ok(None),
        }
    }
}
