//! Single song lookup by provider id.

use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;

use crate::config;
use crate::providers::{Genie, Provider, ProviderKind, ProviderSong, QqMusic, Vibe};

/// Fetch the lyrics of one song and write them to `output`.
pub fn cmd_fetch(
    rt: &Runtime,
    kind: ProviderKind,
    output: Option<&Path>,
    song_id: u64,
) -> anyhow::Result<()> {
    let timeout = config::load().fetch.timeout();
    match kind {
        ProviderKind::Genie => rt.block_on(fetch(Genie::new(timeout)?, song_id, output)),
        ProviderKind::QqMusic => rt.block_on(fetch(QqMusic::new(timeout)?, song_id, output)),
        ProviderKind::Vibe => rt.block_on(fetch(Vibe::new(timeout)?, song_id, output)),
    }
}

async fn fetch<P: Provider>(provider: P, song_id: u64, output: Option<&Path>) -> anyhow::Result<()> {
    let Some(song) = provider.fetch_song_by_id(song_id).await? else {
        println!("Song not found.");
        return Ok(());
    };
    let Some(lyrics) = provider.fetch_song_lyrics(&song).await? else {
        println!("No lyrics found for {}.", song.title());
        return Ok(());
    };

    let path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            file_name_safe(&lyrics.song_title),
            lyrics.extension()
        ))
    });
    lyrics.write_to_file(&path).await?;

    println!("Lyrics saved to {}", path.display());
    Ok(())
}

/// Song title usable as a file name in the current directory.
fn file_name_safe(title: &str) -> String {
    title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}
