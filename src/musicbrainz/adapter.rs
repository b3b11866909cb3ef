//! Adapter layer: Convert MusicBrainz DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.

use super::dto;
use crate::model::{Artist, Medium, Release, TrackEntry};

/// Convert a release DTO into a domain [`Release`].
pub fn to_release(release: dto::Release) -> Release {
    let media = release
        .media
        .into_iter()
        .enumerate()
        .map(|(i, medium)| Medium {
            position: medium.position.unwrap_or(i as u32 + 1),
            track_count: medium.track_count as usize,
            tracks: medium
                .tracks
                .into_iter()
                .map(|track| TrackEntry {
                    id: track.id,
                    recording_id: track.recording.id,
                    number: track.number,
                    position: track.position,
                })
                .collect(),
        })
        .collect();

    Release {
        id: release.id,
        title: release.title,
        release_group_id: release.release_group.map(|rg| rg.id).unwrap_or_default(),
        artist_credit: build_artist_string(&release.artist_credit),
        media,
        urls: url_resources(release.relations),
    }
}

/// Convert an artist lookup response into a domain [`Artist`].
pub fn to_artist(artist: dto::ArtistResponse) -> Artist {
    Artist {
        id: artist.id,
        name: artist.name,
        urls: url_resources(artist.relations),
    }
}

/// Build a combined artist string from artist credits
fn build_artist_string(credits: &[dto::ArtistCredit]) -> String {
    let mut result = String::new();
    for credit in credits {
        // Use credited name if available, otherwise official name
        let name = credit.name.as_ref().unwrap_or(&credit.artist.name);
        result.push_str(name);
        if let Some(ref join) = credit.joinphrase {
            result.push_str(join);
        }
    }
    result
}

fn url_resources(relations: Vec<dto::Relation>) -> Vec<String> {
    relations
        .into_iter()
        .filter(|r| r.target_type.as_deref().is_none_or(|t| t == "url"))
        .filter_map(|r| r.url.map(|u| u.resource))
        .collect()
}
