//! Release resolution: find the release of a release group that carries a
//! provider album link.
//!
//! Releases of one group (different pressings, regional editions) usually
//! share external links, so a release without a link can borrow one from the
//! sibling whose track count is closest.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::Release;
use crate::musicbrainz::RegistryApi;
use crate::report::MissingReport;

/// Pick the release to use for provider lookup and its extracted album id.
///
/// 1. If `extractor` succeeds on `release` itself, return it without any
///    registry request.
/// 2. Otherwise browse the official releases of the release group, order
///    them by track count distance to `release` (stable, so ties keep
///    registry order) and return the first one `extractor` succeeds on.
/// 3. If none matches, record `release` in the missing-releases report.
pub async fn pick_release_from_release_group<R, T, F>(
    registry: &R,
    report: &MissingReport,
    release: &Arc<Release>,
    extractor: F,
) -> Option<(Arc<Release>, T)>
where
    R: RegistryApi + ?Sized,
    F: Fn(&Release) -> Option<T>,
{
    if let Some(selection) = extractor(release) {
        return Some((Arc::clone(release), selection));
    }

    let candidates = match registry.releases_by_release_group(&release.release_group_id).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(
                release_group = %release.release_group_id,
                "Release group lookup failed: {}", e
            );
            Vec::new()
        }
    };
    debug!(
        release = %release.id,
        candidates = candidates.len(),
        "Searching release group for album link"
    );

    match select_candidate(candidates, release.track_count(), &extractor) {
        Some((candidate, selection)) => Some((Arc::new(candidate), selection)),
        None => {
            if report.record_release(release) {
                warn!("No album URL found for release {}", release.display_name());
            }
            None
        }
    }
}

/// First candidate, by ascending track count distance, that `extractor`
/// accepts.
fn select_candidate<T, F>(
    mut candidates: Vec<Release>,
    track_count: usize,
    extractor: &F,
) -> Option<(Release, T)>
where
    F: Fn(&Release) -> Option<T>,
{
    // sort_by_key is stable
    candidates.sort_by_key(|candidate| candidate.track_count().abs_diff(track_count));
    candidates
        .into_iter()
        .find_map(|candidate| extractor(&candidate).map(|selection| (candidate, selection)))
}
