//! Recording to provider song mapping.
//!
//! For each release the mapper resolves the provider album, fetches its song
//! list and matches every track of the release to a song. The result
//! (including "no mapping") is computed once per release id and shared by all
//! files of that release through a [`SingleFlight`] cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::SingleFlight;
use crate::lyrics::Lyrics;
use crate::model::{Mbid, Release};
use crate::musicbrainz::RegistryApi;
use crate::providers::{Provider, ProviderSong};
use crate::report::MissingReport;
use crate::resolver::pick_release_from_release_group;

/// Recording id to provider song.
pub type RecordingMap<S> = HashMap<Mbid, S>;

/// Match every track of `release` to one of `songs`.
///
/// A track matches the song whose album index equals its numeric track
/// number; tracks with non-numeric numbers or no such song fall back to
/// their position in the index-ordered song list. Tracks beyond the end of
/// the list are left out.
pub fn map_tracks<S: ProviderSong>(release: &Release, songs: &[S]) -> RecordingMap<S> {
    let mut mapping = RecordingMap::new();

    for track in release.tracks() {
        let by_number = track
            .number
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|number| songs.iter().find(|song| song.album_index() == number));

        let song = by_number.or_else(|| {
            let index = usize::try_from(track.position.checked_sub(1)?).ok()?;
            songs.get(index)
        });

        match song {
            Some(song) => {
                mapping.insert(track.recording_id.clone(), song.clone());
            }
            None => debug!(
                release = %release.id,
                track = %track.id,
                "No provider song for track"
            ),
        }
    }

    mapping
}

/// Per-run mapper from registry recordings to songs of provider `P`.
pub struct TrackMapper<P: Provider, R: ?Sized> {
    provider: Arc<P>,
    registry: Arc<R>,
    report: Arc<MissingReport>,
    cache: SingleFlight<Mbid, Option<Arc<RecordingMap<P::Song>>>>,
}

impl<P, R> TrackMapper<P, R>
where
    P: Provider,
    R: RegistryApi + ?Sized,
{
    pub fn new(provider: Arc<P>, registry: Arc<R>, report: Arc<MissingReport>) -> Self {
        Self {
            provider,
            registry,
            report,
            cache: SingleFlight::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn report(&self) -> &MissingReport {
        &self.report
    }

    /// The recording map of `release`, or `None` if it cannot be mapped.
    ///
    /// Computed at most once per release id; concurrent callers for the same
    /// release await the same computation.
    pub async fn get_mapping(&self, release: &Arc<Release>) -> Option<Arc<RecordingMap<P::Song>>> {
        self.cache
            .get_or_init(&release.id, || self.compute_mapping(release))
            .await
    }

    async fn compute_mapping(&self, release: &Arc<Release>) -> Option<Arc<RecordingMap<P::Song>>> {
        let provider = self.provider.as_ref();
        let (matched, album_id) = pick_release_from_release_group(
            self.registry.as_ref(),
            &self.report,
            release,
            |r| provider.extract_album_id(r),
        )
        .await?;

        let songs = match provider.fetch_album_songs(&album_id).await {
            Ok(Some(songs)) if !songs.is_empty() => songs,
            Ok(_) => {
                debug!(album = %album_id, "{} album has no songs", provider.name());
                return None;
            }
            Err(e) => {
                warn!(album = %album_id, "Failed to fetch {} album: {}", provider.name(), e);
                return None;
            }
        };

        if songs.len() != matched.track_count() {
            warn!(
                album = %album_id,
                songs = songs.len(),
                tracks = matched.track_count(),
                "Track count mismatch for release {}",
                matched.display_name()
            );
            return None;
        }

        Some(Arc::new(map_tracks(&matched, &songs)))
    }

    /// Lyrics of the song mapped to `recording_id` on `release`.
    ///
    /// Provider failures are logged and reported as no lyrics.
    pub async fn fetch_recording_lyrics(
        &self,
        release: &Arc<Release>,
        recording_id: &str,
    ) -> Option<Lyrics> {
        let mapping = self.get_mapping(release).await?;
        let Some(song) = mapping.get(recording_id) else {
            debug!(recording = recording_id, "Recording is not mapped");
            return None;
        };

        match self.provider.fetch_song_lyrics(song).await {
            Ok(lyrics) => lyrics,
            Err(e) => {
                warn!(song_id = song.id(), "Failed to fetch lyrics: {}", e);
                None
            }
        }
    }
}
