//! Sequential pipeline runner.
//!
//! # Overview
//!
//! ```text
//! config + stage names
//!        ↓  registry::resolve()     unknown/duplicate names fail the run
//! [Stage]
//!        ↓  run()                   one stage at a time, in order
//! StageRecord per stage             succeeded / failed / skipped
//!        ↓
//! <log_dir>/diagnostics.json
//! ```
//!
//! A failing stage does not stop the run. Its error code and message go into
//! its record, and any later stage that requires it is skipped.

pub mod context;
pub mod registry;
pub mod stages;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use movegraph_core::config::PipelineConfig;
use movegraph_core::diagnostics::{Diagnostics, StageFailure, StageRecord, StageStatus};
use movegraph_core::error::ErrorCode;
use movegraph_core::table::{TableError, write_json};
use movegraph_graph::{GraphError, SplitError};

use context::StageContext;
use registry::{Stage, StageListError};

pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";

/// Result of one `mg run`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub diagnostics_path: PathBuf,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.diagnostics
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Failed)
            .count()
    }
}

/// Error code for a stage failure: an explicitly attached [`ErrorCode`]
/// wins, then the library error type, then [`ErrorCode::InternalUnexpected`].
pub fn classify(err: &anyhow::Error) -> ErrorCode {
    if let Some(code) = err.downcast_ref::<ErrorCode>() {
        return *code;
    }
    if let Some(graph) = err.downcast_ref::<GraphError>() {
        return graph.code();
    }
    if err.downcast_ref::<SplitError>().is_some() {
        return ErrorCode::InvalidSplit;
    }
    if err.downcast_ref::<TableError>().is_some() {
        return ErrorCode::TableReadFailed;
    }
    match err.downcast_ref::<StageListError>() {
        Some(StageListError::Duplicate(_)) => ErrorCode::DuplicateStage,
        Some(StageListError::Unknown(_) | StageListError::Empty) => ErrorCode::UnknownStage,
        None => ErrorCode::InternalUnexpected,
    }
}

/// Run `stages` in order and write the diagnostics document.
///
/// # Errors
///
/// Returns an error only if the log directory or the diagnostics document
/// cannot be written. Stage failures are recorded, not returned.
#[instrument(skip(config, stages), fields(stages = stages.len()))]
pub fn run(
    config: &PipelineConfig,
    config_path: &Path,
    stages: &[Stage],
    clean: bool,
) -> Result<RunReport> {
    let log_dir = &config.pipeline.log_dir;
    if clean && log_dir.exists() {
        std::fs::remove_dir_all(log_dir)
            .with_context(|| format!("Failed to clean {}", log_dir.display()))?;
    }
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let mut diagnostics = Diagnostics::now();
    diagnostics.config = Some(config_path.to_path_buf());
    let mut ctx = StageContext::new(config, diagnostics);

    for &stage in stages {
        let record = run_stage(stage, &mut ctx);
        ctx.diagnostics.stages.push(record);
    }

    let diagnostics_path = log_dir.join(DIAGNOSTICS_FILE);
    write_json(&diagnostics_path, &ctx.diagnostics)
        .with_context(|| format!("Failed to write {}", diagnostics_path.display()))
        .context(ErrorCode::TableWriteFailed)?;

    let report = RunReport {
        diagnostics_path,
        diagnostics: ctx.diagnostics,
    };
    info!(
        stages = report.diagnostics.stages.len(),
        failed = report.failed_count(),
        path = %report.diagnostics_path.display(),
        "pipeline finished"
    );
    Ok(report)
}

fn run_stage(stage: Stage, ctx: &mut StageContext<'_>) -> StageRecord {
    let blocked_by = stage.requires().iter().find(|required| {
        matches!(
            ctx.diagnostics.stage_status(required.name()),
            Some(StageStatus::Failed | StageStatus::Skipped)
        )
    });
    if let Some(required) = blocked_by {
        warn!(%stage, %required, "skipping stage: requirement did not succeed");
        return StageRecord {
            name: stage.name().to_string(),
            status: StageStatus::Skipped,
            elapsed_ms: 0,
            artifacts: Vec::new(),
            error: None,
        };
    }

    info!(%stage, "running stage");
    let start = Instant::now();
    let result = stages::execute(stage, ctx);
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(artifacts) => {
            info!(%stage, elapsed_ms, artifacts = artifacts.len(), "stage succeeded");
            StageRecord {
                name: stage.name().to_string(),
                status: StageStatus::Succeeded,
                elapsed_ms,
                artifacts,
                error: None,
            }
        }
        Err(err) => {
            let code = classify(&err);
            let message = format!("{err:#}");
            error!(%stage, %code, error = %message, "stage failed");
            StageRecord {
                name: stage.name().to_string(),
                status: StageStatus::Failed,
                elapsed_ms,
                artifacts: Vec::new(),
                error: Some(StageFailure::new(code, message)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::config::PrunePredicate;

    fn fixture(dir: &Path, moves: &str) -> PipelineConfig {
        std::fs::write(dir.join("moves.tsv"), moves).expect("write moves");
        let mut config = PipelineConfig::default();
        config.moves.path = dir.join("moves.tsv");
        config.videos.path = dir.join("videos.tsv");
        config.pipeline.output_dir = dir.join("out");
        config.pipeline.log_dir = dir.join("logs");
        config.pipeline.seed = Some(3);
        config
    }

    const CLEAN: &str = "id\tname\ttype\tprereq\tsubseq\n\
        1\tDash\tVault\t\tKong\n\
        2\tKong\tVault\tDash\t\n\
        3\tWall Run\tWall\t\t\n";

    const DANGLING: &str = "id\tname\tprereq\tsubseq\n1\tDash\t\tGhost\n";

    #[test]
    fn classify_prefers_attached_code() {
        let err = anyhow::Error::new(GraphError::PruneSurvivor(vec!["X".into()]))
            .context(ErrorCode::TableWriteFailed);
        assert_eq!(classify(&err), ErrorCode::TableWriteFailed);
    }

    #[test]
    fn classify_uses_library_error_codes() {
        let err = anyhow::Error::new(GraphError::PruneSurvivor(vec!["X".into()]));
        assert_eq!(classify(&err), ErrorCode::PruneSurvivor);
        let err = anyhow::Error::new(StageListError::Duplicate(Stage::Cycles));
        assert_eq!(classify(&err), ErrorCode::DuplicateStage);
        assert_eq!(classify(&anyhow::anyhow!("boom")), ErrorCode::InternalUnexpected);
    }

    #[test]
    fn clean_run_writes_diagnostics_and_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = fixture(dir.path(), CLEAN);
        let stages = [Stage::CheckMoves, Stage::GenerateGraph, Stage::RandomMasks];

        let report = run(&config, &dir.path().join("mg.toml"), &stages, false).expect("run");
        assert_eq!(report.failed_count(), 0);
        assert!(report.diagnostics_path.exists());
        assert!(dir.path().join("out").join("graph.json").exists());
        assert!(dir.path().join("out").join("random_train_mask.tsv").exists());
        assert_eq!(
            report.diagnostics.symmetry.as_ref().map(|s| s.asymmetric.len()),
            Some(0)
        );
    }

    #[test]
    fn failed_requirement_skips_dependents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = fixture(dir.path(), DANGLING);
        let stages = [Stage::GenerateGraph, Stage::GraphStats, Stage::ExtractLabels];

        let report = run(&config, &dir.path().join("mg.toml"), &stages, false).expect("run");
        let statuses: Vec<StageStatus> = report.diagnostics.stages.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StageStatus::Failed, StageStatus::Skipped, StageStatus::Succeeded]
        );
        let failure = report.diagnostics.stages[0].error.as_ref().expect("error");
        assert_eq!(failure.code, ErrorCode::GraphValidationFailed);
    }

    #[test]
    fn missing_videos_table_fails_only_that_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = fixture(dir.path(), CLEAN);
        config.videos.prune_predicate = PrunePredicate::NoMedia;
        let stages = [Stage::PruneGraph, Stage::NameToInt];

        let report = run(&config, &dir.path().join("mg.toml"), &stages, false).expect("run");
        assert_eq!(report.diagnostics.stages[0].status, StageStatus::Failed);
        assert_eq!(
            report.diagnostics.stages[0].error.as_ref().map(|e| e.code),
            Some(ErrorCode::TableReadFailed)
        );
        assert_eq!(report.diagnostics.stages[1].status, StageStatus::Succeeded);
    }

    #[test]
    fn clean_flag_empties_log_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = fixture(dir.path(), CLEAN);
        std::fs::create_dir_all(&config.pipeline.log_dir).expect("mkdir");
        let stale = config.pipeline.log_dir.join("old.log");
        std::fs::write(&stale, "stale").expect("write");

        run(&config, &dir.path().join("mg.toml"), &[Stage::InvalidIds], true).expect("run");
        assert!(!stale.exists());
    }
}
