//! Upgrade of the legacy `[mm:ss:cc]` timestamp format in `.lrc` files.
//!
//! Early releases wrote centiseconds after a colon; LRC players expect a dot.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::{Result, ResultExt};
use crate::scanner;

static LEGACY_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[(\d+):(\d{2}):(\d{2})\]").expect("valid regex"));

/// Rewrite legacy line timestamps; borrowed if nothing changed.
pub fn fix_legacy_timestamps(content: &str) -> Cow<'_, str> {
    LEGACY_TIMESTAMP.replace_all(content, "[$1:$2.$3]")
}

/// Fix one file in place. Returns whether it was rewritten.
pub fn fix_file(path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path)
        .with_context(format!("reading {}", path.display()))?;

    let fixed = fix_legacy_timestamps(&content);
    if let Cow::Borrowed(_) = fixed {
        return Ok(false);
    }

    info!("Fixing synced lyrics format for {:?}", path.file_name().unwrap_or_default());
    std::fs::write(path, fixed.as_bytes()).with_context(format!("writing {}", path.display()))?;
    Ok(true)
}

/// Fix every `.lrc` file below `root`, honouring `.nolyrics` directories.
///
/// Returns the paths of rewritten files.
pub fn fix_collection(root: &Path) -> Result<Vec<PathBuf>> {
    let mut fixed = Vec::new();
    for path in scanner::lyrics_files(root) {
        if fix_file(&path)? {
            fixed.push(path);
        }
    }
    Ok(fixed)
}
