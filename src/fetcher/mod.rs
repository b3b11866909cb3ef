//! Fetch orchestration over a collection.
//!
//! Files stream in from the [`scanner`] and are processed concurrently, at
//! most `concurrency` at a time. Each file runs in its own task so that a
//! failing file is logged and counted without affecting its siblings.
//!
//! Per file: skip checks, tag reading, release lookup (cached by release
//! track id), track mapping (see [`TrackMapper`]), lyrics fetch and finally
//! the write decision (see [`decide_write`]).

mod outcome;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

pub use outcome::{FileOutcome, RunSummary, SkipReason, WritePlan, Withheld, decide_write};

use crate::cache::SingleFlight;
use crate::error::{Error, Result, ResultExt};
use crate::mapping::TrackMapper;
use crate::model::{Artist, AudioTrack, Mbid, Release};
use crate::musicbrainz::RegistryApi;
use crate::providers::Provider;
use crate::report::MissingReport;
use crate::scanner::{self, NO_LYRICS_MARKER};
use crate::tags;

/// Album artist id of "Various Artists", never checked for provider links.
pub const VARIOUS_ARTISTS_ID: &str = "89ad4ac3-39f7-470e-963a-56509c546377";

/// Files processed concurrently unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Behaviour switches of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip files whose album artist has no provider link
    pub check_artist: bool,
    /// Resolve and fetch, but write and delete nothing
    pub dry_run: bool,
    /// Replace existing static lyrics with synced ones
    pub upgrade: bool,
    /// Process files even if lyrics exist
    pub force: bool,
    pub skip_instrumentals: bool,
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            check_artist: false,
            dry_run: false,
            upgrade: false,
            force: false,
            skip_instrumentals: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Lyrics file locations next to an audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsTargets {
    pub lrc: PathBuf,
    pub txt: PathBuf,
    pub has_lrc: bool,
    pub has_txt: bool,
}

impl LyricsTargets {
    pub async fn probe(audio: &Path) -> Result<Self> {
        let lrc = audio.with_extension("lrc");
        let txt = audio.with_extension("txt");
        let has_lrc = tokio::fs::try_exists(&lrc).await?;
        let has_txt = tokio::fs::try_exists(&txt).await?;
        Ok(Self {
            lrc,
            txt,
            has_lrc,
            has_txt,
        })
    }
}

/// Reads the tags of one audio file, run on the blocking pool.
pub type TagReader = fn(&Path) -> Result<Option<AudioTrack>>;

fn is_instrumental(stem: &str) -> bool {
    let stem = stem.to_lowercase();
    stem.contains("instrumental") || stem.contains("inst.")
}

/// Orchestrates a lyrics run for provider `P` against registry `R`.
pub struct LyricsFetcher<P: Provider, R: ?Sized> {
    registry: Arc<R>,
    mapper: TrackMapper<P, R>,
    options: FetchOptions,
    /// Releases by release track id
    releases: SingleFlight<Mbid, Option<Arc<Release>>>,
    artists: SingleFlight<Mbid, Option<Arc<Artist>>>,
    read_tags: TagReader,
}

impl<P, R> LyricsFetcher<P, R>
where
    P: Provider,
    R: RegistryApi + ?Sized + 'static,
{
    pub fn new(
        provider: Arc<P>,
        registry: Arc<R>,
        report: Arc<MissingReport>,
        options: FetchOptions,
    ) -> Self {
        Self {
            mapper: TrackMapper::new(provider, Arc::clone(&registry), report),
            registry,
            options,
            releases: SingleFlight::new(),
            artists: SingleFlight::new(),
            read_tags: tags::read_track,
        }
    }

    /// Use `reader` instead of reading the embedded tags.
    #[cfg(test)]
    pub(crate) fn with_tag_reader(mut self, reader: TagReader) -> Self {
        self.read_tags = reader;
        self
    }

    /// Process every audio file below `root`.
    pub async fn run(self: &Arc<Self>, root: PathBuf) -> RunSummary {
        let concurrency = self.options.concurrency.max(1);
        let outcomes = scanner::scan(root)
            .map(|path| {
                let fetcher = Arc::clone(self);
                async move {
                    let task_path = path.clone();
                    let result =
                        tokio::spawn(async move { fetcher.process_file(&task_path).await }).await;
                    (path, result)
                }
            })
            .buffer_unordered(concurrency);
        let mut outcomes = std::pin::pin!(outcomes);

        let mut summary = RunSummary::default();
        while let Some((path, result)) = outcomes.next().await {
            match result {
                Ok(Ok(outcome)) => summary.record(&outcome),
                Ok(Err(e)) => {
                    error!(path = %path.display(), "Could not fetch lyrics: {}", e);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(path = %path.display(), "File task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Run the whole pipeline for one audio file.
    pub async fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let targets = LyricsTargets::probe(path).await?;
        if let Some(reason) = self.pre_skip(path, &targets).await? {
            debug!(path = %path.display(), %reason, "Skipping");
            return Ok(FileOutcome::Skipped(reason));
        }

        let tag_path = path.to_path_buf();
        let read_tags = self.read_tags;
        let tags = tokio::task::spawn_blocking(move || read_tags(&tag_path))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let track = match tags {
            Ok(Some(track)) => track,
            Ok(None) => {
                debug!(path = %path.display(), "Missing tags, skipping");
                return Ok(FileOutcome::Skipped(SkipReason::MissingTags));
            }
            Err(e) => {
                warn!("{}", e);
                return Ok(FileOutcome::Skipped(SkipReason::UnreadableTags));
            }
        };

        self.process_track(&targets, &track).await
    }

    /// Skip checks that only need the filesystem.
    async fn pre_skip(&self, path: &Path, targets: &LyricsTargets) -> Result<Option<SkipReason>> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.options.skip_instrumentals && is_instrumental(&stem) {
            return Ok(Some(SkipReason::Instrumental));
        }

        let marker = path.with_file_name(format!("{}{}", stem, NO_LYRICS_MARKER));
        if tokio::fs::try_exists(&marker).await? {
            return Ok(Some(SkipReason::OptedOut));
        }

        let exists = targets.has_lrc || (targets.has_txt && !self.options.upgrade);
        if exists && !self.options.force {
            return Ok(Some(SkipReason::LyricsExist));
        }

        Ok(None)
    }

    /// Resolve, fetch and write lyrics for a tagged file.
    pub async fn process_track(
        &self,
        targets: &LyricsTargets,
        track: &AudioTrack,
    ) -> Result<FileOutcome> {
        if !self.has_artist_url(track).await {
            return Ok(FileOutcome::Skipped(SkipReason::ArtistUnlinked));
        }

        let Some(release) = self.get_release(&track.release_track_id, &track.album).await else {
            return Ok(FileOutcome::Skipped(SkipReason::ReleaseNotFound));
        };
        let Some(entry) = release.find_track(&track.release_track_id) else {
            debug!(track = %track.release_track_id, release = %release.id, "Track not on release");
            return Ok(FileOutcome::Skipped(SkipReason::TrackNotOnRelease));
        };

        info!("Fetching lyrics for {}", track.title);
        let Some(lyrics) = self
            .mapper
            .fetch_recording_lyrics(&release, &entry.recording_id)
            .await
        else {
            info!("No lyrics found for {}", track.title);
            return Ok(FileOutcome::NoLyrics);
        };

        let plan = decide_write(
            lyrics.synced,
            targets.has_lrc,
            targets.has_txt,
            self.options.upgrade,
        );
        let (target, remove_static) = match plan {
            WritePlan::Synced { remove_static } => (&targets.lrc, remove_static),
            WritePlan::Static => (&targets.txt, false),
            WritePlan::Withhold(reason) => {
                match reason {
                    Withheld::SyncedExists => info!(
                        "Not writing static lyrics for {}, synced lyrics already exist",
                        track.title
                    ),
                    Withheld::NoUpgrade => info!(
                        "No synced lyrics available to upgrade to for {}",
                        track.title
                    ),
                }
                return Ok(FileOutcome::Withheld(reason));
            }
        };

        if self.options.dry_run {
            info!("Fetched lyrics for {} [dry run]", track.title);
            return Ok(FileOutcome::DryRun {
                synced: lyrics.synced,
            });
        }

        info!("Writing lyrics for {} to {}", track.title, target.display());
        lyrics
            .write_to_file(target)
            .await
            .with_context(format!("writing {}", target.display()))?;

        if remove_static {
            tokio::fs::remove_file(&targets.txt)
                .await
                .with_context(format!("removing {}", targets.txt.display()))?;
        }

        Ok(FileOutcome::Written {
            path: target.clone(),
            synced: lyrics.synced,
        })
    }

    /// Whether the file may proceed under the artist check.
    ///
    /// Passes when the check is disabled, the album artist is unknown or
    /// "Various Artists", or the artist cannot be fetched.
    async fn has_artist_url(&self, track: &AudioTrack) -> bool {
        if !self.options.check_artist || track.album_artist.is_none() {
            return true;
        }
        let Some(artist_id) = track.album_artist_id.as_deref() else {
            return true;
        };
        if artist_id == VARIOUS_ARTISTS_ID {
            return true;
        }

        match self.get_artist(artist_id).await {
            Some(artist) => self
                .mapper
                .provider()
                .has_artist_url(&artist, self.mapper.report()),
            None => true,
        }
    }

    async fn get_artist(&self, artist_id: &str) -> Option<Arc<Artist>> {
        let key = artist_id.to_string();
        self.artists
            .get_or_init(&key, || async {
                match self.registry.artist(artist_id).await {
                    Ok(Some(artist)) => Some(Arc::new(artist)),
                    Ok(None) => {
                        info!(artist = artist_id, "No artist found");
                        None
                    }
                    Err(e) => {
                        warn!(artist = artist_id, "Artist lookup failed: {}", e);
                        None
                    }
                }
            })
            .await
    }

    /// The release containing `track_id`.
    ///
    /// A fetched release is cached under every one of its track ids, so the
    /// other files of an album need no further lookup.
    async fn get_release(&self, track_id: &str, album: &str) -> Option<Arc<Release>> {
        let key = track_id.to_string();
        self.releases
            .get_or_init(&key, || async {
                debug!("Fetching release info for {}", album);
                match self.registry.release_by_track(track_id).await {
                    Ok(Some(release)) => {
                        let release = Arc::new(release);
                        for track in release.tracks().filter(|t| t.id != track_id) {
                            self.releases.seed(track.id.clone(), Some(Arc::clone(&release)));
                        }
                        Some(release)
                    }
                    Ok(None) => {
                        info!("No release found for {}", album);
                        None
                    }
                    Err(e) => {
                        warn!(track = track_id, "Release lookup failed for {}: {}", album, e);
                        None
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        MOCK_ALBUM_URL, MockProvider, MockRegistry, mock_artist, mock_release, mock_songs,
        static_lyrics, synced_lyrics, with_url,
    };
    use std::fs;
    use tempfile::TempDir;

    fn release() -> Release {
        with_url(mock_release("r1", 3), &format!("{}ALBUM", MOCK_ALBUM_URL))
    }

    fn track(n: usize) -> AudioTrack {
        AudioTrack {
            title: format!("Song {}", n),
            album: "Album".into(),
            track_number: n.to_string(),
            release_group_id: "rg-1".into(),
            release_track_id: format!("r1-track-{}", n),
            album_artist: Some("Artist".into()),
            album_artist_id: Some("a1".into()),
        }
    }

    /// Song 101 has synced lyrics, 102 static lyrics, 103 none.
    fn provider() -> MockProvider {
        MockProvider::default()
            .with_album("ALBUM", mock_songs(100, 3))
            .with_lyrics(synced_lyrics(101))
            .with_lyrics(static_lyrics(102))
    }

    fn fetcher(
        registry: MockRegistry,
        options: FetchOptions,
    ) -> LyricsFetcher<MockProvider, MockRegistry> {
        LyricsFetcher::new(
            Arc::new(provider()),
            Arc::new(registry),
            Arc::new(MissingReport::new()),
            options,
        )
    }

    async fn targets(dir: &TempDir, name: &str) -> LyricsTargets {
        LyricsTargets::probe(&dir.path().join(format!("{}.flac", name)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_synced_lyrics_replace_static_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("song.txt"), "old").unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions {
                upgrade: true,
                ..Default::default()
            },
        );
        let targets = targets(&dir, "song").await;

        let outcome = fetcher.process_track(&targets, &track(1)).await.unwrap();

        assert_eq!(
            outcome,
            FileOutcome::Written {
                path: targets.lrc.clone(),
                synced: true
            }
        );
        assert_eq!(fs::read_to_string(&targets.lrc).unwrap(), "[00:00.00]synced\n");
        assert!(!targets.txt.exists());
    }

    #[tokio::test]
    async fn test_static_lyrics_never_overwrite_synced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("song.lrc"), "[00:00.00]mine\n").unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions {
                force: true,
                ..Default::default()
            },
        );
        let targets = targets(&dir, "song").await;

        let outcome = fetcher.process_track(&targets, &track(2)).await.unwrap();

        assert_eq!(outcome, FileOutcome::Withheld(Withheld::SyncedExists));
        assert_eq!(fs::read_to_string(&targets.lrc).unwrap(), "[00:00.00]mine\n");
        assert!(!targets.txt.exists());
    }

    #[tokio::test]
    async fn test_upgrade_withholds_static_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("song.txt"), "old").unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions {
                upgrade: true,
                ..Default::default()
            },
        );
        let targets = targets(&dir, "song").await;

        let outcome = fetcher.process_track(&targets, &track(2)).await.unwrap();

        assert_eq!(outcome, FileOutcome::Withheld(Withheld::NoUpgrade));
        assert_eq!(fs::read_to_string(&targets.txt).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_static_lyrics_written_to_txt() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions::default(),
        );
        let targets = targets(&dir, "song").await;

        let outcome = fetcher.process_track(&targets, &track(2)).await.unwrap();

        assert_eq!(
            outcome,
            FileOutcome::Written {
                path: targets.txt.clone(),
                synced: false
            }
        );
        assert_eq!(fs::read_to_string(&targets.txt).unwrap(), "static\n");
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("song.txt"), "old").unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions {
                dry_run: true,
                upgrade: true,
                ..Default::default()
            },
        );
        let targets = targets(&dir, "song").await;

        let outcome = fetcher.process_track(&targets, &track(1)).await.unwrap();

        assert_eq!(outcome, FileOutcome::DryRun { synced: true });
        assert!(!targets.lrc.exists());
        assert!(targets.txt.exists());
    }

    #[tokio::test]
    async fn test_no_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions::default(),
        );
        let targets = targets(&dir, "song").await;

        let outcome = fetcher.process_track(&targets, &track(3)).await.unwrap();
        assert_eq!(outcome, FileOutcome::NoLyrics);
    }

    #[tokio::test]
    async fn test_release_is_looked_up_once_per_album() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(MockRegistry::default().with_release(release()));
        let fetcher = LyricsFetcher::new(
            Arc::new(provider()),
            Arc::clone(&registry),
            Arc::new(MissingReport::new()),
            FetchOptions {
                dry_run: true,
                ..Default::default()
            },
        );

        for n in 1..=3 {
            let targets = targets(&dir, &format!("song{}", n)).await;
            fetcher.process_track(&targets, &track(n)).await.unwrap();
        }

        assert_eq!(registry.release_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_release_and_track() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions::default(),
        );
        let targets = targets(&dir, "song").await;

        let mut unknown = track(1);
        unknown.release_track_id = "elsewhere".into();
        assert_eq!(
            fetcher.process_track(&targets, &unknown).await.unwrap(),
            FileOutcome::Skipped(SkipReason::ReleaseNotFound)
        );
    }

    #[tokio::test]
    async fn test_artist_check() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(
            MockRegistry::default()
                .with_release(release())
                .with_artist(mock_artist("a1", &["https://elsewhere.example/a1"])),
        );
        let report = Arc::new(MissingReport::new());
        let fetcher = LyricsFetcher::new(
            Arc::new(provider()),
            Arc::clone(&registry),
            Arc::clone(&report),
            FetchOptions {
                check_artist: true,
                dry_run: true,
                ..Default::default()
            },
        );
        let targets = targets(&dir, "song").await;

        for _ in 0..2 {
            assert_eq!(
                fetcher.process_track(&targets, &track(1)).await.unwrap(),
                FileOutcome::Skipped(SkipReason::ArtistUnlinked)
            );
        }
        assert_eq!(registry.artist_calls(), 1);
        assert_eq!(report.artists().len(), 1);

        let mut various = track(1);
        various.album_artist_id = Some(VARIOUS_ARTISTS_ID.into());
        assert_eq!(
            fetcher.process_track(&targets, &various).await.unwrap(),
            FileOutcome::DryRun { synced: true }
        );

        // Unknown artists do not block the file
        let mut unknown = track(1);
        unknown.album_artist_id = Some("a2".into());
        assert_eq!(
            fetcher.process_track(&targets, &unknown).await.unwrap(),
            FileOutcome::DryRun { synced: true }
        );
    }

    #[tokio::test]
    async fn test_pre_skip_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);
        fs::write(path("b.nolyrics"), "").unwrap();
        fs::write(path("c.lrc"), "").unwrap();
        fs::write(path("d.txt"), "").unwrap();

        async fn check(
            fetcher: &LyricsFetcher<MockProvider, MockRegistry>,
            audio: PathBuf,
        ) -> Option<SkipReason> {
            let targets = LyricsTargets::probe(&audio).await.unwrap();
            fetcher.pre_skip(&audio, &targets).await.unwrap()
        }

        let default = fetcher(MockRegistry::default(), FetchOptions::default());
        assert_eq!(check(&default, path("a (Instrumental).flac")).await, None);
        assert_eq!(check(&default, path("b.flac")).await, Some(SkipReason::OptedOut));
        assert_eq!(check(&default, path("c.flac")).await, Some(SkipReason::LyricsExist));
        assert_eq!(check(&default, path("d.flac")).await, Some(SkipReason::LyricsExist));
        assert_eq!(check(&default, path("e.flac")).await, None);

        let skip_inst = fetcher(
            MockRegistry::default(),
            FetchOptions {
                skip_instrumentals: true,
                ..Default::default()
            },
        );
        assert_eq!(
            check(&skip_inst, path("a (Instrumental).flac")).await,
            Some(SkipReason::Instrumental)
        );
        assert_eq!(check(&skip_inst, path("a (Inst.).flac")).await, Some(SkipReason::Instrumental));

        let upgrade = fetcher(
            MockRegistry::default(),
            FetchOptions {
                upgrade: true,
                ..Default::default()
            },
        );
        assert_eq!(check(&upgrade, path("c.flac")).await, Some(SkipReason::LyricsExist));
        assert_eq!(check(&upgrade, path("d.flac")).await, None);

        let force = fetcher(
            MockRegistry::default(),
            FetchOptions {
                force: true,
                ..Default::default()
            },
        );
        assert_eq!(check(&force, path("c.flac")).await, None);
    }

    #[tokio::test]
    async fn test_run_counts_every_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.flac"), "not audio").unwrap();
        fs::write(dir.path().join("done.mp3"), "").unwrap();
        fs::write(dir.path().join("done.lrc"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let skipped_dir = dir.path().join("skipped");
        fs::create_dir(&skipped_dir).unwrap();
        fs::write(skipped_dir.join(NO_LYRICS_MARKER), "").unwrap();
        fs::write(skipped_dir.join("hidden.flac"), "").unwrap();

        let fetcher = Arc::new(fetcher(MockRegistry::default(), FetchOptions::default()));
        let summary = fetcher.run(dir.path().to_path_buf()).await;

        assert_eq!(
            summary,
            RunSummary {
                skipped: 2,
                ..Default::default()
            }
        );
    }

    /// Tags keyed by file stem, standing in for embedded tags.
    fn tags_by_stem(path: &Path) -> Result<Option<AudioTrack>> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Ok(match stem {
            "synced" | "blocked" => Some(track(1)),
            "static" => Some(track(2)),
            "silent" => Some(track(3)),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_run_failure_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["synced", "blocked", "static", "silent", "untagged", "optout"] {
            fs::write(dir.path().join(format!("{}.flac", name)), "").unwrap();
        }
        fs::write(dir.path().join(format!("optout{}", NO_LYRICS_MARKER)), "").unwrap();
        // A directory in place of the .lrc target makes the write fail
        fs::create_dir(dir.path().join("blocked.lrc")).unwrap();

        let fetcher = fetcher(
            MockRegistry::default().with_release(release()),
            FetchOptions {
                force: true,
                concurrency: 2,
                ..Default::default()
            },
        )
        .with_tag_reader(tags_by_stem);
        let summary = Arc::new(fetcher).run(dir.path().to_path_buf()).await;

        assert_eq!(
            summary,
            RunSummary {
                written: 2,
                skipped: 2,
                no_lyrics: 1,
                withheld: 0,
                failed: 1,
            }
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("synced.lrc")).unwrap(),
            "[00:00.00]synced\n"
        );
        assert!(dir.path().join("static.txt").exists());
        assert!(!dir.path().join("silent.lrc").exists());
        assert!(dir.path().join("blocked.lrc").is_dir());
    }
}
