//! Collection traversal.
//!
//! Walks the collection depth-first on a single thread. Any directory
//! containing a `.nolyrics` marker is pruned together with its subtree.

use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};

/// Directory (and per-file, as `<basename>.nolyrics`) opt-out marker.
pub const NO_LYRICS_MARKER: &str = ".nolyrics";

/// Audio extensions processed by the fetcher (case-insensitive).
const AUDIO_EXTENSIONS: &[&str] = &["flac", "m4a", "mp3"];

fn is_opted_out(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.path().join(NO_LYRICS_MARKER).exists()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// All files below `root` with one of `extensions`, in traversal order.
fn walk(root: &Path, extensions: &'static [&'static str]) -> impl Iterator<Item = PathBuf> + use<> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_opted_out(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(move |e| has_extension(e.path(), extensions))
        .map(|e| e.into_path())
}

/// Audio files below `root`.
pub fn audio_files(root: &Path) -> impl Iterator<Item = PathBuf> + use<> {
    walk(root, AUDIO_EXTENSIONS)
}

/// Synced lyrics files below `root`.
pub fn lyrics_files(root: &Path) -> impl Iterator<Item = PathBuf> + use<> {
    walk(root, &["lrc"])
}

/// Scans the given root directory for audio files on a blocking thread.
///
/// Returns a Stream of PathBufs; dropping the stream stops the traversal.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for path in audio_files(&root) {
            // If the receiver is dropped, blocking_send fails and we stop scanning.
            if tx.blocking_send(path).is_err() {
                break;
            }
        }
    });

    // Convert the mpsc Receiver into a Stream
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scan_audio_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        File::create(root.join("song.mp3")).unwrap();
        File::create(root.join("music.flac")).unwrap();
        File::create(root.join("notes.txt")).unwrap(); // Should be ignored
        File::create(root.join("song.lrc")).unwrap(); // Should be ignored
        File::create(root.join("UPPERCASE.M4A")).unwrap(); // Should be found (case-insensitive)

        let subdir = root.join("subdir");
        fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("track.mp3")).unwrap();
        File::create(subdir.join("track.wav")).unwrap(); // Not a supported format

        let paths: Vec<PathBuf> = scan(root.to_path_buf()).collect().await;

        let file_names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(|s| s.to_string()))
            .collect();

        assert_eq!(file_names, vec!["UPPERCASE.M4A", "music.flac", "song.mp3", "track.mp3"]);
    }

    #[test]
    fn test_opt_out_marker_prunes_subtree() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        let skipped = root.join("skipped");
        let nested = skipped.join("nested");
        fs::create_dir_all(&nested).unwrap();
        File::create(skipped.join(NO_LYRICS_MARKER)).unwrap();
        File::create(skipped.join("a.mp3")).unwrap();
        File::create(nested.join("b.mp3")).unwrap();
        File::create(root.join("c.mp3")).unwrap();

        let paths: Vec<PathBuf> = audio_files(root).collect();
        assert_eq!(paths, vec![root.join("c.mp3")]);
    }

    #[test]
    fn test_lyrics_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        File::create(root.join("a.lrc")).unwrap();
        File::create(root.join("a.txt")).unwrap();
        File::create(root.join("a.mp3")).unwrap();

        let paths: Vec<PathBuf> = lyrics_files(root).collect();
        assert_eq!(paths, vec![root.join("a.lrc")]);
    }
}
