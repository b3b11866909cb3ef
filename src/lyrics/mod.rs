//! Normalized lyrics representation and file output.
//!
//! Providers hand their raw payloads to the constructors in this module
//! (see [`lrc`] for the synced encodings); the fetch orchestrator then writes
//! the rendered lines next to the audio file as `.lrc` (synced) or `.txt`
//! (static).

pub mod fix;
pub mod lrc;

use std::path::Path;

/// Marker text Genie returns instead of lyrics for instrumental tracks.
pub const INSTRUMENTAL_MARKER: &str = "이 곡은 연주곡 입니다.";

/// Lyrics of one provider song, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lyrics {
    pub song_id: u64,
    pub song_title: String,
    /// Rendered lines, each terminated by `\n`
    pub lines: Vec<String>,
    pub synced: bool,
}

impl Lyrics {
    /// Synced lyrics from `(millisecond timestamp, text)` entries.
    ///
    /// Entries are sorted by timestamp; duplicates keep their input order.
    pub fn from_timed_lines(
        song_id: u64,
        song_title: impl Into<String>,
        entries: Vec<(u64, String)>,
    ) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self {
            song_id,
            song_title: song_title.into(),
            lines: lrc::render_timed_lines(entries),
            synced: true,
        })
    }

    /// Synced lyrics from a word-timed (karaoke) document.
    ///
    /// Returns `None` if any line is malformed or no line is timed.
    pub fn from_word_timed(song_id: u64, song_title: impl Into<String>, content: &str) -> Option<Self> {
        let lines = lrc::convert_word_timed(content.lines())?;
        Some(Self {
            song_id,
            song_title: song_title.into(),
            lines,
            synced: true,
        })
    }

    /// Synced lyrics from text that is already in LRC form.
    pub fn from_lrc_text(song_id: u64, song_title: impl Into<String>, content: &str) -> Option<Self> {
        let lines = lrc::normalize_lrc_text(content)?;
        Some(Self {
            song_id,
            song_title: song_title.into(),
            lines,
            synced: true,
        })
    }

    /// Static lyrics from plain lines.
    ///
    /// Rejects empty lyrics and the instrumental marker.
    pub fn from_static<I, S>(song_id: u64, song_title: impl Into<String>, lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| format!("{}\n", line.as_ref().trim_end_matches('\r')))
            .collect();

        if lines.iter().all(|l| l.trim().is_empty()) {
            return None;
        }
        if lines.iter().any(|l| l.trim() == INSTRUMENTAL_MARKER) {
            return None;
        }

        Some(Self {
            song_id,
            song_title: song_title.into(),
            lines,
            synced: false,
        })
    }

    /// File extension for these lyrics.
    pub fn extension(&self) -> &'static str {
        if self.synced { "lrc" } else { "txt" }
    }

    /// The full file content.
    pub fn render(&self) -> String {
        self.lines.concat()
    }

    /// Write the lyrics as UTF-8 to `path`, replacing any existing file.
    pub async fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, self.render()).await
    }
}
