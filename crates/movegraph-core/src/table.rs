//! Delimited-text I/O for the moves and videos tables.
//!
//! # Format
//!
//! Files carry a header row. The delimiter follows the extension: `.tsv`
//! files are tab-separated, everything else is comma-separated. Headers are
//! trimmed; columns whose header is blank or starts with `Unnamed` (index
//! columns left behind by dataframe exports) are dropped on read. Other
//! unknown columns are preserved and written back after the canonical ones.
//!
//! Every cell passes through [`normalize_cell`] so that blank cells and the
//! usual null spellings all read as `None`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::model::moves::MOVE_COLUMNS;
use crate::model::video::VIDEO_COLUMNS;
use crate::model::{Move, MoveTable, Video, VideoTable, normalize_cell};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while reading or writing a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Opening, creating, or flushing a file failed.
    #[error("table I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The delimited text itself is malformed.
    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    /// An `id` cell holds something other than an integer.
    #[error("row {row}: id `{value}` is not an integer")]
    InvalidId { row: usize, value: String },
}

/// Field delimiter for a table path: tab for `.tsv`, comma otherwise.
#[must_use]
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

/// Column positions resolved from a header row.
#[derive(Debug)]
struct Layout {
    known: HashMap<&'static str, usize>,
    extra: Vec<(String, usize)>,
}

impl Layout {
    fn resolve(headers: &StringRecord, known: &[&'static str], aliases: &[(&str, &'static str)]) -> Self {
        let mut layout = Self {
            known: HashMap::new(),
            extra: Vec::new(),
        };

        for (pos, raw) in headers.iter().enumerate() {
            let header = raw.trim();
            if header.is_empty() || header.starts_with("Unnamed") {
                debug!(column = pos, header, "dropping unnamed column");
                continue;
            }

            let canonical = known
                .iter()
                .copied()
                .find(|k| *k == header)
                .or_else(|| aliases.iter().find(|(a, _)| *a == header).map(|(_, k)| *k));

            match canonical {
                Some(key) => {
                    layout.known.entry(key).or_insert(pos);
                }
                None => layout.extra.push((header.to_string(), pos)),
            }
        }

        layout
    }

    fn require(&self, column: &'static str) -> Result<(), TableError> {
        if self.known.contains_key(column) {
            Ok(())
        } else {
            Err(TableError::MissingColumn(column))
        }
    }

    fn cell(&self, record: &StringRecord, column: &str) -> Option<String> {
        self.known
            .get(column)
            .and_then(|pos| record.get(*pos))
            .and_then(normalize_cell)
    }

    fn id(&self, record: &StringRecord, row: usize) -> Result<Option<i64>, TableError> {
        self.cell(record, "id")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .or_else(|_| parse_integral_float(raw.trim()))
                    .map_err(|()| TableError::InvalidId { row, value: raw })
            })
            .transpose()
    }

    fn extras(&self, record: &StringRecord) -> Vec<Option<String>> {
        self.extra
            .iter()
            .map(|(_, pos)| record.get(*pos).and_then(normalize_cell))
            .collect()
    }

    fn extra_headers(&self) -> Vec<String> {
        self.extra.iter().map(|(h, _)| h.clone()).collect()
    }
}

/// Accept ids such as `12.0` that dataframe exports produce for integer
/// columns containing nulls.
#[allow(clippy::cast_possible_truncation)]
fn parse_integral_float(raw: &str) -> Result<i64, ()> {
    let value: f64 = raw.parse().map_err(|_| ())?;
    if value.fract().abs() < f64::EPSILON && value.abs() < 9.0e15 {
        Ok(value as i64)
    } else {
        Err(())
    }
}

fn reader<R: Read>(input: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create(path: &Path) -> Result<File, TableError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TableError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    File::create(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// Read the moves table from `path`.
///
/// # Errors
///
/// Returns [`TableError`] if the file cannot be read, the `id` or `name`
/// column is missing, or an id is not an integer.
#[instrument]
pub fn read_moves(path: &Path) -> Result<MoveTable, TableError> {
    read_moves_from(open(path)?, delimiter_for(path))
}

/// Read the moves table from any reader.
///
/// # Errors
///
/// See [`read_moves`].
pub fn read_moves_from<R: Read>(input: R, delimiter: u8) -> Result<MoveTable, TableError> {
    let mut rdr = reader(input, delimiter);
    let layout = Layout::resolve(rdr.headers()?, &MOVE_COLUMNS, &[("desc", "description")]);
    layout.require("id")?;
    layout.require("name")?;

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        rows.push(Move {
            id: layout.id(&record, idx + 1)?,
            name: layout.cell(&record, "name"),
            kind: layout.cell(&record, "type"),
            prereq: layout.cell(&record, "prereq"),
            subseq: layout.cell(&record, "subseq"),
            description: layout.cell(&record, "description"),
            extra: layout.extras(&record),
        });
    }

    debug!(rows = rows.len(), extra = layout.extra.len(), "read moves table");
    Ok(MoveTable {
        extra_columns: layout.extra_headers(),
        rows,
    })
}

/// Write the moves table to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`TableError`] on I/O failure.
pub fn write_moves(table: &MoveTable, path: &Path) -> Result<(), TableError> {
    write_moves_to(table, create(path)?, delimiter_for(path))
}

/// Write the moves table to any writer in canonical column order.
///
/// # Errors
///
/// Returns [`TableError`] on I/O failure.
pub fn write_moves_to<W: Write>(table: &MoveTable, output: W, delimiter: u8) -> Result<(), TableError> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(output);
    wtr.write_record(table.headers())?;

    for mv in &table.rows {
        let mut record = vec![
            mv.id.map(|id| id.to_string()).unwrap_or_default(),
            mv.name.clone().unwrap_or_default(),
            mv.kind.clone().unwrap_or_default(),
            mv.prereq.clone().unwrap_or_default(),
            mv.subseq.clone().unwrap_or_default(),
            mv.description.clone().unwrap_or_default(),
        ];
        record.extend(padded_extras(&mv.extra, table.extra_columns.len()));
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|source| TableError::Io {
        path: PathBuf::from("<writer>"),
        source,
    })
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// Read the videos table from `path`.
///
/// # Errors
///
/// Returns [`TableError`] if the file cannot be read, the `id` column is
/// missing, or an id is not an integer.
#[instrument]
pub fn read_videos(path: &Path) -> Result<VideoTable, TableError> {
    read_videos_from(open(path)?, delimiter_for(path))
}

/// Read the videos table from any reader.
///
/// # Errors
///
/// See [`read_videos`].
pub fn read_videos_from<R: Read>(input: R, delimiter: u8) -> Result<VideoTable, TableError> {
    let mut rdr = reader(input, delimiter);
    let layout = Layout::resolve(rdr.headers()?, &VIDEO_COLUMNS, &[]);
    layout.require("id")?;

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        rows.push(Video {
            id: layout.id(&record, idx + 1)?,
            link: layout.cell(&record, "link"),
            embed: layout.cell(&record, "embed").map(|e| e.trim().to_string()),
            extra: layout.extras(&record),
        });
    }

    Ok(VideoTable {
        extra_columns: layout.extra_headers(),
        rows,
    })
}

/// Write the videos table to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`TableError`] on I/O failure.
pub fn write_videos(table: &VideoTable, path: &Path) -> Result<(), TableError> {
    write_videos_to(table, create(path)?, delimiter_for(path))
}

/// Write the videos table to any writer in canonical column order.
///
/// # Errors
///
/// Returns [`TableError`] on I/O failure.
pub fn write_videos_to<W: Write>(table: &VideoTable, output: W, delimiter: u8) -> Result<(), TableError> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(output);
    wtr.write_record(table.headers())?;

    for video in &table.rows {
        let mut record = vec![
            video.id.map(|id| id.to_string()).unwrap_or_default(),
            video.link.clone().unwrap_or_default(),
            video.embed.clone().unwrap_or_default(),
        ];
        record.extend(padded_extras(&video.extra, table.extra_columns.len()));
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|source| TableError::Io {
        path: PathBuf::from("<writer>"),
        source,
    })
}

fn padded_extras(extra: &[Option<String>], width: usize) -> impl Iterator<Item = String> + '_ {
    (0..width).map(move |i| extra.get(i).cloned().flatten().unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Write a single-column delimited file with a header row.
///
/// # Errors
///
/// Returns [`TableError`] on I/O failure.
pub fn write_column<T: ToString>(path: &Path, header: &str, values: &[T]) -> Result<(), TableError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_writer(create(path)?);
    wtr.write_record([header])?;
    for value in values {
        wtr.write_record([value.to_string()])?;
    }
    wtr.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a value as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`TableError`] on I/O or serialization failure.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), TableError> {
    let mut out = io::BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| TableError::Io {
        path: path.to_path_buf(),
        source: io::Error::other(e),
    })?;
    out.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
