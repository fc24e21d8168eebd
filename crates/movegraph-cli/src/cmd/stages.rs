//! `mg stages`: list the stage registry.

use anyhow::Result;
use serde::Serialize;

use crate::output::{OutputMode, pretty_section, render_mode};
use crate::pipeline::registry::Stage;

#[derive(Debug, Serialize)]
struct StageInfo {
    name: &'static str,
    about: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    requires: Vec<&'static str>,
}

fn registry_listing() -> Vec<StageInfo> {
    Stage::ALL
        .iter()
        .map(|stage| StageInfo {
            name: stage.name(),
            about: stage.about(),
            requires: stage.requires().iter().map(|s| s.name()).collect(),
        })
        .collect()
}

/// Print every registered stage.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run_stages(output: OutputMode) -> Result<()> {
    let listing = registry_listing();
    render_mode(
        output,
        &listing,
        |stages, w| {
            for stage in stages {
                writeln!(w, "{}\t{}", stage.name, stage.about)?;
            }
            Ok(())
        },
        |stages, w| {
            pretty_section(w, "Stages")?;
            for stage in stages {
                write!(w, "{:<20} {}", stage.name, stage.about)?;
                if stage.requires.is_empty() {
                    writeln!(w)?;
                } else {
                    writeln!(w, " (after {})", stage.requires.join(", "))?;
                }
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_covers_registry_in_order() {
        let listing = registry_listing();
        assert_eq!(listing.len(), Stage::ALL.len());
        assert_eq!(listing[0].name, "check-moves");
        let relabel = listing
            .iter()
            .find(|s| s.name == "relabel-graph")
            .expect("relabel-graph listed");
        assert_eq!(relabel.requires, vec!["generate-graph", "name-to-int"]);
    }
}
