//! `mg run`: execute pipeline stages and report their outcome.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::Args;

use movegraph_core::config::load_config;
use movegraph_core::diagnostics::{StageRecord, StageStatus};
use movegraph_core::error::ErrorCode;

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};
use crate::pipeline::{self, RunReport, registry};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline config file (TOML).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Stages to run, in order. Defaults to `pipeline.stages` from the config.
    pub stages: Vec<String>,

    /// Empty the log directory before running.
    #[arg(long)]
    pub clean: bool,
}

/// Run the pipeline described by `args`.
///
/// # Errors
///
/// Fails on an unreadable config, an invalid stage list, an unwritable log
/// directory, or when any stage fails.
pub fn run_pipeline(args: &RunArgs, output: OutputMode, quiet: bool) -> Result<()> {
    let config = load_config(&args.config).context(ErrorCode::ConfigParseError)?;

    let names = if args.stages.is_empty() {
        &config.pipeline.stages
    } else {
        &args.stages
    };
    let stages = match registry::resolve(names) {
        Ok(stages) => stages,
        Err(err) => {
            let err = anyhow::Error::new(err);
            let code = pipeline::classify(&err);
            return Err(err.context(code));
        }
    };

    let report = pipeline::run(&config, &args.config, &stages, args.clean)?;

    if !quiet || output.is_json() {
        render_mode(output, &report, render_text, render_pretty)?;
    }

    let failed = report.failed_count();
    if failed > 0 {
        anyhow::bail!(
            "{failed} of {} stages failed; see {}",
            report.diagnostics.stages.len(),
            report.diagnostics_path.display()
        );
    }
    Ok(())
}

fn status_label(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Succeeded => "succeeded",
        StageStatus::Failed => "failed",
        StageStatus::Skipped => "skipped",
    }
}

fn render_text(report: &RunReport, w: &mut dyn Write) -> std::io::Result<()> {
    for stage in &report.diagnostics.stages {
        let code = stage.error.as_ref().map_or("-", |e| e.code.code());
        writeln!(
            w,
            "{}\t{}\t{}\t{code}",
            stage.name,
            status_label(stage.status),
            stage.elapsed_ms
        )?;
    }
    writeln!(w, "diagnostics\t{}", report.diagnostics_path.display())
}

fn pretty_stage(w: &mut dyn Write, stage: &StageRecord) -> std::io::Result<()> {
    match (&stage.status, &stage.error) {
        (StageStatus::Failed, Some(failure)) => {
            writeln!(w, "  ✗ {} [{}] {}", stage.name, failure.code, failure.message)?;
            if let Some(hint) = failure.hint {
                writeln!(w, "      hint: {hint}")?;
            }
            Ok(())
        }
        (StageStatus::Skipped, _) => writeln!(w, "  - {} (skipped)", stage.name),
        _ => {
            writeln!(w, "  ✓ {} ({} ms)", stage.name, stage.elapsed_ms)?;
            for artifact in &stage.artifacts {
                writeln!(w, "      → {}", artifact.display())?;
            }
            Ok(())
        }
    }
}

fn render_pretty(report: &RunReport, w: &mut dyn Write) -> std::io::Result<()> {
    let diagnostics = &report.diagnostics;
    pretty_section(w, "Pipeline run")?;
    pretty_kv(
        w,
        "Started",
        diagnostics
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    )?;
    if let Some(config) = &diagnostics.config {
        pretty_kv(w, "Config", config.display().to_string())?;
    }
    pretty_kv(w, "Diagnostics", report.diagnostics_path.display().to_string())?;
    writeln!(w)?;
    for stage in &diagnostics.stages {
        pretty_stage(w, stage)?;
    }
    pretty_rule(w)?;
    let failed = report.failed_count();
    let skipped = diagnostics
        .stages
        .iter()
        .filter(|s| s.status == StageStatus::Skipped)
        .count();
    writeln!(
        w,
        "{} stages, {failed} failed, {skipped} skipped",
        diagnostics.stages.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::diagnostics::{Diagnostics, StageFailure};

    fn report() -> RunReport {
        let mut diagnostics = Diagnostics::now();
        diagnostics.stages = vec![
            StageRecord {
                name: "generate-graph".into(),
                status: StageStatus::Failed,
                elapsed_ms: 4,
                artifacts: Vec::new(),
                error: Some(StageFailure::new(ErrorCode::GraphValidationFailed, "unresolved")),
            },
            StageRecord {
                name: "graph-stats".into(),
                status: StageStatus::Skipped,
                elapsed_ms: 0,
                artifacts: Vec::new(),
                error: None,
            },
        ];
        RunReport {
            diagnostics_path: PathBuf::from("logs/diagnostics.json"),
            diagnostics,
        }
    }

    #[test]
    fn text_output_is_one_line_per_stage() {
        let mut buf = Vec::new();
        render_text(&report(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "generate-graph\tfailed\t4\tE3001");
        assert_eq!(lines[1], "graph-stats\tskipped\t0\t-");
        assert_eq!(lines[2], "diagnostics\tlogs/diagnostics.json");
    }

    #[test]
    fn pretty_output_summarizes_counts() {
        let mut buf = Vec::new();
        render_pretty(&report(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("✗ generate-graph [E3001] unresolved"));
        assert!(text.contains("- graph-stats (skipped)"));
        assert!(text.ends_with("2 stages, 1 failed, 1 skipped\n"));
    }

    #[test]
    fn unknown_stage_carries_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("mg.toml");
        std::fs::write(&config, "[pipeline]\nstages = [\"frobnicate\"]\n").expect("write");
        let args = RunArgs {
            config,
            stages: Vec::new(),
            clean: false,
        };
        let err = run_pipeline(&args, OutputMode::Text, true).expect_err("unknown stage");
        assert_eq!(err.downcast_ref::<ErrorCode>(), Some(&ErrorCode::UnknownStage));
    }

    #[test]
    fn unreadable_config_carries_code() {
        let args = RunArgs {
            config: PathBuf::from("/nonexistent/mg.toml"),
            stages: vec!["check-moves".into()],
            clean: false,
        };
        let err = run_pipeline(&args, OutputMode::Text, true).expect_err("no config");
        assert_eq!(err.downcast_ref::<ErrorCode>(), Some(&ErrorCode::ConfigParseError));
    }
}
