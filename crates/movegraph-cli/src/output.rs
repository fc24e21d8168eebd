//! Output layer shared by every `mg` command.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] on a TTY, [`OutputMode::Text`] when piped.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use movegraph_core::error::ErrorCode;

pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator for pretty output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Aligned sections for people at a terminal.
    Pretty,
    /// One record per line, tab-separated.
    Text,
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

fn resolve_output_mode_inner(json_flag: bool, format_env: Option<&str>, is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {}
        }
    }
    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from the `--json` flag, `FORMAT`, and the TTY.
#[must_use]
pub fn resolve_output_mode(json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(json_flag, env_val.as_deref(), is_tty)
}

/// Render `value` to stdout: JSON is serialized directly, text and pretty
/// go through their closures.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// A command failure as shown to the operator.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// `E####` code when the failure carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let mut cli = Self::new(format!("{err:#}"));
        if let Some(code) = err.downcast_ref::<ErrorCode>() {
            cli.error_code = Some(code.code().to_string());
            cli.suggestion = code.hint().map(str::to_string);
        }
        cli
    }
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    if mode.is_json() {
        let wrapper = serde_json::json!({ "error": error });
        serde_json::to_writer_pretty(&mut *out, &wrapper)?;
        writeln!(out)?;
    } else {
        match &error.error_code {
            Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
            None => writeln!(out, "error: {}", error.message)?,
        }
        if let Some(suggestion) = &error.suggestion {
            writeln!(out, "  suggestion: {suggestion}")?;
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins_over_env() {
        assert_eq!(resolve_output_mode_inner(true, Some("pretty"), true), OutputMode::Json);
    }

    #[test]
    fn env_selects_mode() {
        assert_eq!(resolve_output_mode_inner(false, Some("TEXT"), true), OutputMode::Text);
        assert_eq!(resolve_output_mode_inner(false, Some("json"), false), OutputMode::Json);
        assert_eq!(resolve_output_mode_inner(false, Some("pretty"), false), OutputMode::Pretty);
    }

    #[test]
    fn unknown_env_falls_back_to_tty_detection() {
        assert_eq!(resolve_output_mode_inner(false, Some("yaml"), true), OutputMode::Pretty);
        assert_eq!(resolve_output_mode_inner(false, None, false), OutputMode::Text);
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "stages", "3").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "stages:        3\n");
    }

    #[test]
    fn pretty_section_draws_rule() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Run").expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Run");
        assert_eq!(lines[1].len(), PRETTY_RULE_WIDTH);
    }

    #[test]
    fn coded_error_carries_hint() {
        let err = anyhow::anyhow!("bad toml").context(ErrorCode::ConfigParseError);
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1001"));
        assert!(cli.suggestion.is_some());
        assert!(cli.message.contains("bad toml"));
    }

    #[test]
    fn text_error_shows_code_and_suggestion() {
        let error = CliError {
            message: "boom".into(),
            suggestion: Some("retry".into()),
            error_code: Some("E9001".into()),
        };
        let mut buf = Vec::new();
        write_error(OutputMode::Text, &error, &mut buf).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "error[E9001]: boom\n  suggestion: retry\n"
        );
    }

    #[test]
    fn json_error_is_wrapped() {
        let mut buf = Vec::new();
        write_error(OutputMode::Json, &CliError::new("boom"), &mut buf).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["error"]["message"], "boom");
        assert!(value["error"].get("suggestion").is_none());
    }
}
