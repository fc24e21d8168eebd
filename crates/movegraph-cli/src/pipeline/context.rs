//! State shared by the stages of one run.
//!
//! Tables are read on first use and kept in memory; a repair stage replaces
//! the in-memory copy and writes it under the output directory, so later
//! stages in the same run see the repaired table while the source files stay
//! untouched.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use movegraph_core::config::PipelineConfig;
use movegraph_core::diagnostics::Diagnostics;
use movegraph_core::error::ErrorCode;
use movegraph_core::table::{read_moves, read_videos, write_json, write_moves, write_videos};
use movegraph_core::{MoveTable, VideoTable};

pub struct StageContext<'a> {
    pub config: &'a PipelineConfig,
    pub diagnostics: Diagnostics,
    moves: Option<MoveTable>,
    videos: Option<VideoTable>,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a PipelineConfig, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
            moves: None,
            videos: None,
        }
    }

    /// The moves table, read from the configured path on first use.
    pub fn moves(&mut self) -> Result<&MoveTable> {
        if self.moves.is_none() {
            let path = &self.config.moves.path;
            debug!(path = %path.display(), "loading moves table");
            let table = read_moves(path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .context(ErrorCode::TableReadFailed)?;
            self.moves = Some(table);
        }
        self.moves
            .as_ref()
            .context("moves table missing after load")
    }

    /// The videos table, read from the configured path on first use.
    pub fn videos(&mut self) -> Result<&VideoTable> {
        if self.videos.is_none() {
            let path = &self.config.videos.path;
            debug!(path = %path.display(), "loading videos table");
            let table = read_videos(path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .context(ErrorCode::TableReadFailed)?;
            self.videos = Some(table);
        }
        self.videos
            .as_ref()
            .context("videos table missing after load")
    }

    /// Both tables, loading whichever is not in memory yet.
    pub fn tables(&mut self) -> Result<(&MoveTable, &VideoTable)> {
        self.moves()?;
        self.videos()?;
        match (&self.moves, &self.videos) {
            (Some(moves), Some(videos)) => Ok((moves, videos)),
            _ => anyhow::bail!("tables missing after load"),
        }
    }

    /// Replace the moves table and write it to the output directory.
    pub fn replace_moves(&mut self, table: MoveTable) -> Result<PathBuf> {
        let path = self.output_path(&file_name(&self.config.moves.path, "moves.tsv"));
        write_moves(&table, &path)
            .with_context(|| format!("Failed to write {}", path.display()))
            .context(ErrorCode::TableWriteFailed)?;
        self.moves = Some(table);
        Ok(path)
    }

    /// Replace the videos table and write it to the output directory.
    pub fn replace_videos(&mut self, table: VideoTable) -> Result<PathBuf> {
        let path = self.output_path(&file_name(&self.config.videos.path, "videos.tsv"));
        write_videos(&table, &path)
            .with_context(|| format!("Failed to write {}", path.display()))
            .context(ErrorCode::TableWriteFailed)?;
        self.videos = Some(table);
        Ok(path)
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.config.pipeline.output_dir.join(file)
    }

    /// Write `value` as pretty JSON to `<output_dir>/<file>`.
    pub fn save_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<PathBuf> {
        let path = self.output_path(file);
        write_json(&path, value)
            .with_context(|| format!("Failed to write {}", path.display()))
            .context(ErrorCode::TableWriteFailed)?;
        Ok(path)
    }
}

fn file_name(path: &std::path::Path, fallback: &str) -> String {
    path.file_name()
        .map_or_else(|| fallback.to_string(), |n| n.to_string_lossy().into_owned())
}
