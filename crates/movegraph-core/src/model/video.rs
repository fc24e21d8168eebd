//! The `videos` table, joined 1:1 to moves by `id`.

use std::collections::HashMap;

use serde::Serialize;

use super::MoveTable;

/// Embed sentinel meaning "no canonical media exists for this move".
pub const UNAVAILABLE_MEDIA: &str = "unavailable.mp4";

/// Canonical column order of the videos table.
pub const VIDEO_COLUMNS: [&str; 3] = ["id", "link", "embed"];

/// One row of the videos table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Video {
    /// Join key; matches a move id.
    pub id: Option<i64>,
    /// Source URL.
    pub link: Option<String>,
    /// Local media filename, or [`UNAVAILABLE_MEDIA`].
    pub embed: Option<String>,
    /// Values of preserved non-canonical columns.
    #[serde(skip)]
    pub extra: Vec<Option<String>>,
}

impl Video {
    #[must_use]
    pub fn new(id: i64, link: Option<&str>, embed: Option<&str>) -> Self {
        Self {
            id: Some(id),
            link: link.map(str::to_string),
            embed: embed.map(str::to_string),
            extra: Vec::new(),
        }
    }

    /// `true` when the embed points at real media (set and not the sentinel).
    #[must_use]
    pub fn has_media(&self) -> bool {
        self.embed
            .as_deref()
            .is_some_and(|embed| embed != UNAVAILABLE_MEDIA)
    }
}

/// The full videos table in file row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoTable {
    pub extra_columns: Vec<String>,
    pub rows: Vec<Video>,
}

impl VideoTable {
    #[must_use]
    pub const fn new(rows: Vec<Video>) -> Self {
        Self {
            extra_columns: Vec::new(),
            rows,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index from id to the first row carrying it.
    #[must_use]
    pub fn by_id(&self) -> HashMap<i64, &Video> {
        let mut map = HashMap::with_capacity(self.rows.len());
        for video in &self.rows {
            if let Some(id) = video.id {
                map.entry(id).or_insert(video);
            }
        }
        map
    }

    /// Video row for each move, aligned with `moves.rows`.
    ///
    /// Moves without an id or without a matching video row join to `None`.
    #[must_use]
    pub fn join<'a>(&'a self, moves: &MoveTable) -> Vec<Option<&'a Video>> {
        let by_id = self.by_id();
        moves
            .rows
            .iter()
            .map(|mv| mv.id.and_then(|id| by_id.get(&id).copied()))
            .collect()
    }

    /// All column headers in write order.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        VIDEO_COLUMNS
            .iter()
            .map(|h| (*h).to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }
}
