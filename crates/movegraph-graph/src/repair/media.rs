//! Reconciling the videos table with the media directory.
//!
//! Both repairs compare metadata against the set of filenames actually on
//! disk. Nothing is downloaded, renamed, or transcoded here.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use movegraph_core::{MoveTable, UNAVAILABLE_MEDIA, VideoTable};

/// Filenames directly inside `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn media_files(dir: &Path) -> Result<HashSet<String>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut files = HashSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if entry.file_type().is_ok_and(|t| t.is_file()) {
            files.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(files)
}

/// Canonical media filename for a move name: lower-cased, trimmed, spaces
/// replaced by `_`, with an `.mp4` extension.
#[must_use]
pub fn canonical_media_name(name: &str) -> String {
    format!("{}.mp4", name.trim().to_lowercase().replace(' ', "_"))
}

/// Point every video whose embed is unset or not on disk at
/// [`UNAVAILABLE_MEDIA`]. Returns the new table and the ids that changed.
#[must_use]
pub fn mark_unavailable(videos: &VideoTable, present: &HashSet<String>) -> (VideoTable, Vec<i64>) {
    let mut out = videos.clone();
    let mut changed = Vec::new();

    for video in &mut out.rows {
        let available = video
            .embed
            .as_deref()
            .is_some_and(|embed| embed == UNAVAILABLE_MEDIA || present.contains(embed));
        if !available {
            debug!(id = ?video.id, embed = ?video.embed, "media file not found");
            video.embed = Some(UNAVAILABLE_MEDIA.to_string());
            changed.extend(video.id);
        }
    }

    info!(changed = changed.len(), "marked unavailable media");
    (out, changed)
}

/// Set each video's embed to the canonical filename of its move when that
/// file exists, otherwise to [`UNAVAILABLE_MEDIA`].
///
/// Videos with no matching move are left as they are.
#[must_use]
pub fn canonicalize_embeds(
    moves: &MoveTable,
    videos: &VideoTable,
    present: &HashSet<String>,
) -> VideoTable {
    let names: std::collections::HashMap<i64, &str> = moves
        .iter()
        .filter_map(|mv| Some((mv.id?, mv.name.as_deref()?)))
        .collect();

    let mut out = videos.clone();
    for video in &mut out.rows {
        let Some(name) = video.id.and_then(|id| names.get(&id)) else {
            continue;
        };
        let canonical = canonical_media_name(name);
        video.embed = Some(if present.contains(&canonical) {
            canonical
        } else {
            UNAVAILABLE_MEDIA.to_string()
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::{Move, Video};

    fn present(files: &[&str]) -> HashSet<String> {
        files.iter().map(|f| (*f).to_string()).collect()
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_media_name("Double Kong"), "double_kong.mp4");
        assert_eq!(canonical_media_name("  Cat Leap "), "cat_leap.mp4");
    }

    #[test]
    fn missing_files_get_the_sentinel() {
        let videos = VideoTable::new(vec![
            Video::new(1, None, Some("kong.mp4")),
            Video::new(2, None, Some("gone.mp4")),
            Video::new(3, None, None),
            Video::new(4, None, Some(UNAVAILABLE_MEDIA)),
        ]);
        let (out, changed) = mark_unavailable(&videos, &present(&["kong.mp4"]));
        assert_eq!(changed, vec![2, 3]);
        assert_eq!(out.rows[0].embed.as_deref(), Some("kong.mp4"));
        assert_eq!(out.rows[1].embed.as_deref(), Some(UNAVAILABLE_MEDIA));
        assert_eq!(out.rows[2].embed.as_deref(), Some(UNAVAILABLE_MEDIA));
    }

    #[test]
    fn embeds_follow_move_names() {
        let moves = MoveTable::new(vec![Move::new(1, "Double Kong"), Move::new(2, "Dash")]);
        let videos = VideoTable::new(vec![
            Video::new(1, None, Some("DK_final.mp4")),
            Video::new(2, None, Some("dash.mp4")),
            Video::new(7, None, Some("orphan.mp4")),
        ]);
        let out = canonicalize_embeds(&moves, &videos, &present(&["double_kong.mp4"]));
        assert_eq!(out.rows[0].embed.as_deref(), Some("double_kong.mp4"));
        assert_eq!(out.rows[1].embed.as_deref(), Some(UNAVAILABLE_MEDIA));
        assert_eq!(out.rows[2].embed.as_deref(), Some("orphan.mp4"));
    }

    #[test]
    fn lists_only_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("kong.mp4"), b"").expect("write");
        std::fs::create_dir(dir.path().join("thumbs")).expect("mkdir");
        assert_eq!(media_files(dir.path()).expect("list"), present(&["kong.mp4"]));
    }
}
