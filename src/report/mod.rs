//! Report of registry entities lacking a link to the selected provider.
//!
//! Entries are appended by concurrent file tasks during the run and read
//! once at the end to render the HTML report (see [`html`]).

pub mod html;

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::model::{Artist, Mbid, Release};

/// A reported registry entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub id: Mbid,
    pub name: String,
}

#[derive(Debug, Default)]
struct Entries {
    ids: HashSet<Mbid>,
    ordered: Vec<ReportEntry>,
}

impl Entries {
    fn record(&mut self, id: &str, name: &str) -> bool {
        if !self.ids.insert(id.to_string()) {
            return false;
        }
        self.ordered.push(ReportEntry {
            id: id.to_string(),
            name: name.to_string(),
        });
        true
    }
}

/// Append-only, insertion-ordered sets of missing artists and releases.
#[derive(Debug, Default)]
pub struct MissingReport {
    artists: Mutex<Entries>,
    releases: Mutex<Entries>,
}

impl MissingReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artist; returns `false` if it was already recorded.
    pub fn record_artist(&self, artist: &Artist) -> bool {
        self.artists.lock().record(&artist.id, &artist.name)
    }

    /// Record a release; returns `false` if it was already recorded.
    pub fn record_release(&self, release: &Release) -> bool {
        self.releases.lock().record(&release.id, &release.title)
    }

    pub fn artists(&self) -> Vec<ReportEntry> {
        self.artists.lock().ordered.clone()
    }

    pub fn releases(&self) -> Vec<ReportEntry> {
        self.releases.lock().ordered.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_artist, mock_release};

    #[test]
    fn test_records_are_idempotent_per_id() {
        let report = MissingReport::new();
        let artist = mock_artist("a1", &[]);

        assert!(report.record_artist(&artist));
        assert!(!report.record_artist(&artist));
        assert_eq!(report.artists().len(), 1);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let report = MissingReport::new();
        report.record_release(&mock_release("r2", 1));
        report.record_release(&mock_release("r1", 1));
        report.record_release(&mock_release("r2", 1));

        let ids: Vec<_> = report.releases().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
        assert!(report.artists().is_empty());
    }
}
