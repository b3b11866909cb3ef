//! Per-file results and the run summary.

use std::fmt;
use std::path::PathBuf;

/// Why a file was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Instrumental,
    /// `<basename>.nolyrics` next to the file
    OptedOut,
    LyricsExist,
    UnreadableTags,
    MissingTags,
    /// The album artist has no link to the provider
    ArtistUnlinked,
    ReleaseNotFound,
    TrackNotOnRelease,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instrumental => "instrumental",
            Self::OptedOut => "opted out",
            Self::LyricsExist => "lyrics exist",
            Self::UnreadableTags => "unreadable tags",
            Self::MissingTags => "missing tags",
            Self::ArtistUnlinked => "artist not linked to provider",
            Self::ReleaseNotFound => "no release found",
            Self::TrackNotOnRelease => "track not on release",
        })
    }
}

/// Why fetched lyrics were not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withheld {
    /// Static result, but synced lyrics already exist
    SyncedExists,
    /// Upgrade requested, but only static lyrics were found
    NoUpgrade,
}

/// What to do with a fetched result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    /// Write the `.lrc` file, deleting the `.txt` sibling if requested
    Synced { remove_static: bool },
    Static,
    Withhold(Withheld),
}

/// Decide which file a result goes to.
///
/// Synced lyrics always win and replace a static sibling; static lyrics never
/// replace synced ones and are not written when an upgrade was requested.
pub fn decide_write(synced: bool, has_lrc: bool, has_txt: bool, upgrade: bool) -> WritePlan {
    if synced {
        WritePlan::Synced {
            remove_static: has_txt,
        }
    } else if has_lrc {
        WritePlan::Withhold(Withheld::SyncedExists)
    } else if upgrade && has_txt {
        WritePlan::Withhold(Withheld::NoUpgrade)
    } else {
        WritePlan::Static
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written { path: PathBuf, synced: bool },
    /// Lyrics were found but nothing was written (dry run)
    DryRun { synced: bool },
    Skipped(SkipReason),
    NoLyrics,
    Withheld(Withheld),
}

/// Counts of file outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub skipped: usize,
    pub no_lyrics: usize,
    pub withheld: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Written { .. } | FileOutcome::DryRun { .. } => self.written += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::NoLyrics => self.no_lyrics += 1,
            FileOutcome::Withheld(_) => self.withheld += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.no_lyrics + self.withheld + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} written, {} skipped, {} without lyrics, {} withheld, {} failed",
            self.total(),
            self.written,
            self.skipped,
            self.no_lyrics,
            self.withheld,
            self.failed
        )
    }
}
