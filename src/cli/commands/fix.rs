//! Legacy `.lrc` timestamp upgrade.

use std::path::Path;

use crate::config;
use crate::lyrics::fix;

/// Rewrite `[mm:ss:xx]` line timestamps below the collection path.
pub fn cmd_fix(collection_path: &Path) -> anyhow::Result<()> {
    let root = config::resolve_collection(collection_path)?;
    let fixed = fix::fix_collection(&root)?;
    println!("Fixed {} lyrics files.", fixed.len());
    Ok(())
}
