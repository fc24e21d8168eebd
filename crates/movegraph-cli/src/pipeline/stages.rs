//! Stage bodies.
//!
//! Each stage reads what it needs through the [`StageContext`], records
//! findings in the diagnostics document, and returns the artifacts it wrote.
//! Data-quality findings never fail a stage.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use movegraph_core::error::ErrorCode;
use movegraph_graph::MoveGraph;
use movegraph_graph::check::{
    MoveChecks, check_move_types, check_symmetry, duplicate_edges, duplicate_names, incomplete,
    invalid_ids,
};
use movegraph_graph::features::BagOfWords;
use movegraph_graph::graph::{
    GraphStats, adjacency_list, edge_count_check, find_cycles, name_to_int, read_adjacency, relabel,
};
use movegraph_graph::labels::{
    LabelDistribution, LabelMode, average_degree_by_type, component_labels, extract_labels,
};
use movegraph_graph::masks::{
    Masks, SplitFractions, extrapolation_split, media_split, random_split, rng_for,
};
use movegraph_graph::parse::parse_edges;
use movegraph_graph::repair::{canonicalize_embeds, mark_unavailable, media_files, prune, sort_edges};

use super::context::StageContext;
use super::registry::Stage;

pub const GRAPH_FILE: &str = "graph.json";
pub const NAME_MAP_FILE: &str = "name2int.json";
pub const INT_GRAPH_FILE: &str = "graph_int.json";

/// Run one stage.
///
/// # Errors
///
/// Returns the stage's failure; the runner turns it into a stage record.
pub fn execute(stage: Stage, ctx: &mut StageContext<'_>) -> Result<Vec<PathBuf>> {
    match stage {
        Stage::CheckMoves => check_moves(ctx),
        Stage::InvalidIds => {
            let found = invalid_ids(&ctx.moves()?.ids());
            summarize(ctx, stage, json!({ "count": found.len() }));
            ctx.diagnostics.invalid_ids = Some(found);
            Ok(Vec::new())
        }
        Stage::DuplicateEdges => {
            let found = duplicate_edges(ctx.moves()?);
            ctx.diagnostics.duplicate_edges = Some(found);
            Ok(Vec::new())
        }
        Stage::DuplicateNodes => {
            let found = duplicate_names(ctx.moves()?);
            summarize(ctx, stage, json!({ "count": found.len() }));
            ctx.diagnostics.duplicate_nodes = Some(found);
            Ok(Vec::new())
        }
        Stage::Symmetry => {
            let report = check_symmetry(ctx.moves()?);
            summarize(
                ctx,
                stage,
                json!({ "asymmetric": report.asymmetric.len(), "unresolved": report.unresolved.len() }),
            );
            ctx.diagnostics.symmetry = Some(report);
            Ok(Vec::new())
        }
        Stage::Incomplete => {
            let config = ctx.config;
            let pipeline = &config.pipeline;
            let found = incomplete(ctx.moves()?, &pipeline.incomplete_columns, &pipeline.whitelist);
            ctx.diagnostics.incomplete = Some(found);
            Ok(Vec::new())
        }
        Stage::MoveTypes => {
            let report = check_move_types(ctx.moves()?);
            ctx.diagnostics.move_types = Some(report);
            Ok(Vec::new())
        }
        Stage::SortEdges => {
            let sorted = sort_edges(ctx.moves()?);
            Ok(vec![ctx.replace_moves(sorted)?])
        }
        Stage::GenerateGraph => generate_graph(ctx),
        Stage::NameToInt => {
            let map = name_to_int(ctx.moves()?);
            Ok(vec![ctx.save_json(NAME_MAP_FILE, &map)?])
        }
        Stage::RelabelGraph => relabel_graph(ctx),
        Stage::PruneGraph => prune_graph(ctx),
        Stage::UnavailableEmbed => {
            let present =
                media_files(&ctx.config.videos.media_dir).context(ErrorCode::TableReadFailed)?;
            let (videos, changed) = mark_unavailable(ctx.videos()?, &present);
            summarize(ctx, stage, json!({ "changed": changed }));
            Ok(vec![ctx.replace_videos(videos)?])
        }
        Stage::FixEmbed => {
            let present =
                media_files(&ctx.config.videos.media_dir).context(ErrorCode::TableReadFailed)?;
            let (moves, videos) = ctx.tables()?;
            let fixed = canonicalize_embeds(moves, videos, &present);
            Ok(vec![ctx.replace_videos(fixed)?])
        }
        Stage::RandomMasks => {
            let fractions = SplitFractions::from(&ctx.config.masks);
            let mut rng = rng_for(ctx.config.pipeline.seed);
            let masks = random_split(ctx.moves()?.len(), fractions, &mut rng)?;
            write_masks(ctx, stage, &masks, "random_")
        }
        Stage::ExtrapolationMasks => {
            let graph = current_graph(ctx)?;
            let mut rng = rng_for(ctx.config.pipeline.seed);
            let masks = extrapolation_split(&graph, ctx.config.masks.test_split, &mut rng)?;
            write_masks(ctx, stage, &masks, "extrapolation_")
        }
        Stage::MediaMasks => {
            let config = ctx.config;
            let mut rng = rng_for(config.pipeline.seed);
            let (moves, videos) = ctx.tables()?;
            let masks = media_split(
                moves,
                videos,
                config.masks.media_join_column,
                config.masks.media_test_fraction,
                &mut rng,
            )?;
            write_masks(ctx, stage, &masks, "media_")
        }
        Stage::LabelDistribution => label_distribution(ctx),
        Stage::ComponentLabels => {
            let graph = current_graph(ctx)?;
            let labels = component_labels(&graph, ctx.moves()?);
            Ok(vec![ctx.save_json("component_labels.json", &labels)?])
        }
        Stage::ExtractLabels => {
            let labels = extract_labels(ctx.moves()?);
            Ok(vec![ctx.save_json("labels.json", &labels)?])
        }
        Stage::BagOfWords => {
            let features = BagOfWords::from_table(ctx.moves()?);
            Ok(vec![ctx.save_json("bag-of-words-multi-binary-label.json", &features)?])
        }
        Stage::BagOfWordsOneHot => {
            let features = BagOfWords::one_hot(ctx.moves()?);
            Ok(vec![ctx.save_json("bag-of-words.json", &features)?])
        }
        Stage::GraphStats => {
            let stats = GraphStats::compute(&current_graph(ctx)?);
            summarize(ctx, stage, &stats);
            Ok(vec![ctx.save_json("graph_stats.json", &stats)?])
        }
        Stage::Cycles => {
            if !ctx.config.pipeline.directed {
                warn!("cycle detection needs `pipeline.directed = true`; recording none");
            }
            let cycles = find_cycles(&current_graph(ctx)?);
            summarize(ctx, stage, json!({ "count": cycles.len() }));
            ctx.diagnostics.cycles = Some(cycles);
            Ok(Vec::new())
        }
    }
}

fn summarize<T: Serialize>(ctx: &mut StageContext<'_>, stage: Stage, value: T) {
    match serde_json::to_value(value) {
        Ok(value) => {
            ctx.diagnostics.summaries.insert(stage.name().to_string(), value);
        }
        Err(err) => warn!(%stage, %err, "could not serialize stage summary"),
    }
}

/// Graph of the moves table as it currently stands in this run.
fn current_graph(ctx: &mut StageContext<'_>) -> Result<MoveGraph> {
    let directed = ctx.config.pipeline.directed;
    Ok(MoveGraph::build(ctx.moves()?, directed))
}

fn check_moves(ctx: &mut StageContext<'_>) -> Result<Vec<PathBuf>> {
    let config = ctx.config;
    let moves = ctx.moves()?;
    let checks = MoveChecks::run(
        moves,
        &config.pipeline.incomplete_columns,
        &config.pipeline.whitelist,
    );
    let parsed = parse_edges(moves);
    let graph = MoveGraph::from_parsed(moves, &parsed, config.pipeline.directed);
    let edge_count = edge_count_check(&graph, &parsed);

    if !edge_count.agrees() {
        warn!(
            graph_edges = edge_count.graph_edges,
            expected = edge_count.expected_edges,
            "edge count differs from half the resolved tokens"
        );
    }

    summarize(
        ctx,
        Stage::CheckMoves,
        json!({
            "clean": checks.is_clean(),
            "unresolved_references": parsed.unresolved.len(),
            "empty_tokens": parsed.empty_tokens.len(),
        }),
    );
    checks.record(&mut ctx.diagnostics);
    ctx.diagnostics.unresolved_references = Some(parsed.unresolved);
    ctx.diagnostics.empty_tokens = Some(parsed.empty_tokens);
    ctx.diagnostics.edge_count = Some(edge_count);
    Ok(Vec::new())
}

fn generate_graph(ctx: &mut StageContext<'_>) -> Result<Vec<PathBuf>> {
    let directed = ctx.config.pipeline.directed;
    let graph = MoveGraph::build_validated(ctx.moves()?, directed)?;
    summarize(
        ctx,
        Stage::GenerateGraph,
        json!({
            "nodes": graph.node_count(),
            "edges": graph.edge_count(),
            "content_hash": graph.content_hash,
        }),
    );
    Ok(vec![ctx.save_json(GRAPH_FILE, &adjacency_list(&graph))?])
}

fn relabel_graph(ctx: &mut StageContext<'_>) -> Result<Vec<PathBuf>> {
    let graph_path = ctx.output_path(GRAPH_FILE);
    let adjacency = read_adjacency(&graph_path).context(ErrorCode::TableReadFailed)?;

    let map_path = ctx.output_path(NAME_MAP_FILE);
    let content = std::fs::read_to_string(&map_path)
        .with_context(|| format!("Failed to read {}", map_path.display()))
        .context(ErrorCode::TableReadFailed)?;
    let name_map: BTreeMap<String, usize> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", map_path.display()))
        .context(ErrorCode::TableReadFailed)?;

    let relabeled = relabel(&adjacency, &name_map)?;
    Ok(vec![ctx.save_json(INT_GRAPH_FILE, &relabeled)?])
}

fn prune_graph(ctx: &mut StageContext<'_>) -> Result<Vec<PathBuf>> {
    let predicate = ctx.config.videos.prune_predicate;
    let directed = ctx.config.pipeline.directed;
    let (moves, videos) = ctx.tables()?;
    let outcome = prune(moves, videos, predicate, directed)?;

    summarize(
        ctx,
        Stage::PruneGraph,
        json!({ "pruned": outcome.pruned.len(), "predicate": predicate.to_string() }),
    );
    let adjacency = adjacency_list(&outcome.graph);
    Ok(vec![
        ctx.replace_moves(outcome.moves)?,
        ctx.replace_videos(outcome.videos)?,
        ctx.save_json("pruned.json", &outcome.pruned)?,
        ctx.save_json(GRAPH_FILE, &adjacency)?,
    ])
}

fn label_distribution(ctx: &mut StageContext<'_>) -> Result<Vec<PathBuf>> {
    let graph = current_graph(ctx)?;
    let moves = ctx.moves()?;
    let single = LabelDistribution::from_table(moves, LabelMode::PerToken);
    let multi = LabelDistribution::from_table(moves, LabelMode::PerCombination);
    let degree = average_degree_by_type(&graph, moves);

    let percentages = json!({
        "single": single.percentages(),
        "multi": multi.percentages(),
    });
    Ok(vec![
        ctx.save_json("single_type_dist.json", &single)?,
        ctx.save_json("multi_type_dist.json", &multi)?,
        ctx.save_json("label_percentages.json", &percentages)?,
        ctx.save_json("degree_by_type.json", &degree)?,
    ])
}

fn write_masks(
    ctx: &mut StageContext<'_>,
    stage: Stage,
    masks: &Masks,
    prefix: &str,
) -> Result<Vec<PathBuf>> {
    let counts = masks.counts();
    info!(%stage, train = counts.train, val = counts.val, test = counts.test, "masks ready");
    summarize(ctx, stage, counts);
    masks
        .write(&ctx.config.pipeline.output_dir, prefix)
        .context(ErrorCode::TableWriteFailed)
}
