//! Tag reading.
//!
//! Uses the lofty crate for format-independent access to the tags the fetch
//! pipeline needs: title, album, track number and the MusicBrainz ids.

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};

use crate::error::{Error, Result};
use crate::model::AudioTrack;

const UNKNOWN_TITLE: &str = "Unknown title";
const UNKNOWN_ALBUM: &str = "Unknown album";

/// Read the tags of `path`.
///
/// Returns `Ok(None)` if the file has no tag or lacks a required item.
/// Blocking; run it off the async runtime.
pub fn read_track(path: &Path) -> Result<Option<AudioTrack>> {
    let tagged_file = Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(tag.and_then(track_from_tag))
}

/// Extract an [`AudioTrack`] from a tag.
///
/// Title, album, track number, release group id and release track id must
/// be present and the two ids non-empty. An empty title or album is
/// replaced by a placeholder.
pub fn track_from_tag(tag: &Tag) -> Option<AudioTrack> {
    let get = |key: ItemKey| tag.get_string(&key).map(str::trim);

    let title = get(ItemKey::TrackTitle)?;
    let album = get(ItemKey::AlbumTitle)?;
    let track_number = get(ItemKey::TrackNumber)?;
    let release_group_id = get(ItemKey::MusicBrainzReleaseGroupId).filter(|id| !id.is_empty())?;
    let release_track_id = get(ItemKey::MusicBrainzTrackId).filter(|id| !id.is_empty())?;

    let or_placeholder = |value: &str, placeholder: &str| {
        if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        }
    };

    Some(AudioTrack {
        title: or_placeholder(title, UNKNOWN_TITLE),
        album: or_placeholder(album, UNKNOWN_ALBUM),
        track_number: track_number.to_string(),
        release_group_id: release_group_id.to_string(),
        release_track_id: release_track_id.to_string(),
        album_artist: get(ItemKey::AlbumArtist).map(str::to_string),
        album_artist_id: get(ItemKey::MusicBrainzReleaseArtistId)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
    })
}
