use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub moves: MovesConfig,
    #[serde(default)]
    pub videos: VideosConfig,
    #[serde(default)]
    pub masks: MaskConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Stage names executed by `mg run` when none are given on the command line.
    #[serde(default)]
    pub stages: Vec<String>,
    /// 1-based rows exempt from the missing-value scan.
    #[serde(default)]
    pub whitelist: Vec<usize>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub directed: bool,
    /// Seed for mask sampling. Unset means entropy-seeded.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_incomplete_columns")]
    pub incomplete_columns: Vec<String>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            whitelist: Vec::new(),
            output_dir: default_output_dir(),
            log_dir: default_log_dir(),
            directed: false,
            seed: None,
            incomplete_columns: default_incomplete_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovesConfig {
    #[serde(default = "default_moves_path")]
    pub path: PathBuf,
}

impl Default for MovesConfig {
    fn default() -> Self {
        Self {
            path: default_moves_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideosConfig {
    #[serde(default = "default_videos_path")]
    pub path: PathBuf,
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
    #[serde(default)]
    pub prune_predicate: PrunePredicate,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            path: default_videos_path(),
            media_dir: default_media_dir(),
            prune_predicate: PrunePredicate::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskConfig {
    #[serde(default = "default_train_split")]
    pub train_split: f64,
    #[serde(default = "default_val_split")]
    pub val_split: f64,
    #[serde(default = "default_test_split")]
    pub test_split: f64,
    /// Fraction of the validation pool carved out as test by the media split.
    #[serde(default = "default_media_test_fraction")]
    pub media_test_fraction: f64,
    #[serde(default)]
    pub media_join_column: MediaColumn,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            train_split: default_train_split(),
            val_split: default_val_split(),
            test_split: default_test_split(),
            media_test_fraction: default_media_test_fraction(),
            media_join_column: MediaColumn::default(),
        }
    }
}

/// Which joined video rows cause their move to be pruned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrunePredicate {
    /// `embed` is absent.
    #[default]
    EmbedUnset,
    /// `embed` is absent or the unavailable sentinel.
    NoMedia,
    /// Both `link` and `embed` are absent.
    LinkAndEmbedUnset,
}

impl fmt::Display for PrunePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmbedUnset => "embed-unset",
            Self::NoMedia => "no-media",
            Self::LinkAndEmbedUnset => "link-and-embed-unset",
        })
    }
}

/// Video column whose presence puts a move in the training set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaColumn {
    #[default]
    Link,
    Embed,
}

impl PipelineConfig {
    /// Rebase every relative path onto `base`.
    #[must_use]
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        rebase(&mut self.pipeline.output_dir);
        rebase(&mut self.pipeline.log_dir);
        rebase(&mut self.moves.path);
        rebase(&mut self.videos.path);
        rebase(&mut self.videos.media_dir);
        self
    }
}

/// Load a pipeline config from `path`, resolving relative paths against the
/// file's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`PipelineConfig`].
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<PipelineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_paths(base))
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_moves_path() -> PathBuf {
    PathBuf::from("moves.tsv")
}

fn default_videos_path() -> PathBuf {
    PathBuf::from("videos.tsv")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_incomplete_columns() -> Vec<String> {
    ["id", "name", "type", "description"]
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

const fn default_train_split() -> f64 {
    0.6
}

const fn default_val_split() -> f64 {
    0.2
}

const fn default_test_split() -> f64 {
    0.2
}

const fn default_media_test_fraction() -> f64 {
    0.5
}
