//! Core data models shared by the registry client, the providers and the
//! fetch orchestrator.
//!
//! Registry entities ([`Release`], [`Artist`]) are immutable once fetched and
//! shared across concurrent file tasks behind an `Arc`.

/// Registry identifier (MBID).
pub type Mbid = String;

/// Tag values of a single audio file, discarded after the file is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub title: String,
    pub album: String,
    /// Raw track number tag ("N" or "N/M")
    pub track_number: String,
    pub release_group_id: Mbid,
    /// Release-track id, unique per track of a specific release
    pub release_track_id: Mbid,
    pub album_artist: Option<String>,
    pub album_artist_id: Option<Mbid>,
}

/// A specific edition of an album, as fetched from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: Mbid,
    pub title: String,
    pub release_group_id: Mbid,
    /// Joined artist credit ("A & B feat. C")
    pub artist_credit: String,
    pub media: Vec<Medium>,
    /// Resources of all URL relationships attached to the release
    pub urls: Vec<String>,
}

/// A disc (or other medium) of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Medium {
    pub position: u32,
    pub track_count: usize,
    pub tracks: Vec<TrackEntry>,
}

/// A track entry on a medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    /// Release-track id
    pub id: Mbid,
    pub recording_id: Mbid,
    /// Track number as printed, may be non-numeric ("A1", "1-5")
    pub number: String,
    /// 1-based position on the medium
    pub position: u32,
}

impl Release {
    /// Total number of tracks across all media.
    pub fn track_count(&self) -> usize {
        self.media.iter().map(|m| m.track_count).sum()
    }

    /// All track entries in medium order.
    pub fn tracks(&self) -> impl Iterator<Item = &TrackEntry> {
        self.media.iter().flat_map(|m| m.tracks.iter())
    }

    /// Find a track by its release-track id.
    pub fn find_track(&self, release_track_id: &str) -> Option<&TrackEntry> {
        self.tracks().find(|t| t.id == release_track_id)
    }

    /// Human-readable label for console output.
    pub fn display_name(&self) -> String {
        if self.artist_credit.is_empty() {
            format!("{} [{}]", self.title, self.id)
        } else {
            format!("{} - {} [{}]", self.artist_credit, self.title, self.id)
        }
    }
}

/// An artist, as fetched from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: Mbid,
    pub name: String,
    /// Resources of all URL relationships attached to the artist
    pub urls: Vec<String>,
}

impl Artist {
    /// Human-readable label for console output.
    pub fn display_name(&self) -> String {
        format!("{} [{}]", self.name, self.id)
    }
}
