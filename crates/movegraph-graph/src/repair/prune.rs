//! Pruning moves that lack required media.
//!
//! A move is pruned when its joined video row matches the predicate. Moves
//! with no video row at all are kept (the join is an inner join). Pruning
//! removes the move row, its video rows, and every mention of its name from
//! other moves' relation cells, then rebuilds the graph and proves that no
//! pruned name survived.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, instrument};

use movegraph_core::config::PrunePredicate;
use movegraph_core::{MoveTable, RelationColumn, Video, VideoTable};

use crate::error::GraphError;
use crate::graph::{MoveGraph, adjacency_list};
use crate::parse::row_tokens;

/// Whether `video` matches `predicate`.
#[must_use]
pub fn matches(predicate: PrunePredicate, video: &Video) -> bool {
    match predicate {
        PrunePredicate::EmbedUnset => video.embed.is_none(),
        PrunePredicate::NoMedia => !video.has_media(),
        PrunePredicate::LinkAndEmbedUnset => video.link.is_none() && video.embed.is_none(),
    }
}

/// A move removed by [`prune`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrunedMove {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// Tables and graph after pruning.
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    pub moves: MoveTable,
    pub videos: VideoTable,
    pub pruned: Vec<PrunedMove>,
    pub graph: MoveGraph,
}

/// Prune every move whose video matches `predicate`.
///
/// # Errors
///
/// Returns [`GraphError::PruneSurvivor`] if a pruned name is still a node or
/// still appears in an adjacency list of the rebuilt graph.
#[instrument(skip(moves, videos), fields(moves = moves.len(), videos = videos.len()))]
pub fn prune(
    moves: &MoveTable,
    videos: &VideoTable,
    predicate: PrunePredicate,
    directed: bool,
) -> Result<PruneOutcome, GraphError> {
    let joined = videos.join(moves);
    let doomed: Vec<bool> = joined
        .iter()
        .map(|video| video.is_some_and(|v| matches(predicate, v)))
        .collect();

    let pruned: Vec<PrunedMove> = moves
        .iter()
        .zip(&doomed)
        .filter(|(_, doomed)| **doomed)
        .map(|(mv, _)| PrunedMove {
            id: mv.id,
            name: mv.name.clone(),
        })
        .collect();

    let names: HashSet<&str> = pruned.iter().filter_map(|p| p.name.as_deref()).collect();
    let ids: HashSet<i64> = pruned.iter().filter_map(|p| p.id).collect();

    let mut kept = MoveTable {
        extra_columns: moves.extra_columns.clone(),
        rows: moves
            .iter()
            .zip(&doomed)
            .filter(|(_, doomed)| !**doomed)
            .map(|(mv, _)| mv.clone())
            .collect(),
    };
    for mv in &mut kept.rows {
        for column in RelationColumn::ALL {
            let tokens: Vec<&str> = row_tokens(mv, column).tokens;
            if tokens.iter().any(|t| names.contains(t)) {
                let remaining: Vec<String> = tokens
                    .into_iter()
                    .filter(|t| !names.contains(t))
                    .map(str::to_string)
                    .collect();
                mv.set_relation(column, &remaining);
            }
        }
    }

    let kept_videos = VideoTable {
        extra_columns: videos.extra_columns.clone(),
        rows: videos
            .rows
            .iter()
            .filter(|v| v.id.is_none_or(|id| !ids.contains(&id)))
            .cloned()
            .collect(),
    };

    let graph = MoveGraph::build(&kept, directed);
    let adjacency = adjacency_list(&graph);
    let mut survivors: Vec<String> = names
        .iter()
        .filter(|name| {
            graph.node_index(name).is_some()
                || adjacency.values().flatten().any(|n| n.as_str() == **name)
        })
        .map(|name| (*name).to_string())
        .collect();
    if !survivors.is_empty() {
        survivors.sort_unstable();
        return Err(GraphError::PruneSurvivor(survivors));
    }

    info!(
        pruned = pruned.len(),
        remaining = kept.len(),
        %predicate,
        "pruned moves"
    );

    Ok(PruneOutcome {
        moves: kept,
        videos: kept_videos,
        pruned,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::{Move, UNAVAILABLE_MEDIA};

    fn tables() -> (MoveTable, VideoTable) {
        let moves = MoveTable::new(vec![
            Move::new(1, "X").with_subseq("Y"),
            Move::new(2, "Y").with_prereq("X, Z"),
            Move::new(3, "Z").with_subseq("Y"),
            Move::new(4, "W"),
        ]);
        let videos = VideoTable::new(vec![
            Video::new(1, None, None),
            Video::new(2, Some("https://y"), Some("y.mp4")),
            Video::new(3, Some("https://z"), Some("z.mp4")),
        ]);
        (moves, videos)
    }

    #[test]
    fn pruned_name_is_removed_from_neighbors() {
        let (moves, videos) = tables();
        let out = prune(&moves, &videos, PrunePredicate::EmbedUnset, false).expect("prune");
        assert_eq!(out.pruned.len(), 1);
        assert_eq!(out.pruned[0].name.as_deref(), Some("X"));
        let y = &out.moves.rows[out.moves.position("Y").expect("Y kept")];
        assert_eq!(y.prereq.as_deref(), Some("Z"));
        assert!(out.graph.node_index("X").is_none());
        out.graph.validate(&out.moves).expect("pruned graph validates");
    }

    #[test]
    fn videos_of_pruned_moves_are_dropped() {
        let (moves, videos) = tables();
        let out = prune(&moves, &videos, PrunePredicate::EmbedUnset, false).expect("prune");
        let ids: Vec<Option<i64>> = out.videos.rows.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![Some(2), Some(3)]);
    }

    #[test]
    fn moves_without_video_rows_are_kept() {
        let (moves, videos) = tables();
        let out = prune(&moves, &videos, PrunePredicate::EmbedUnset, false).expect("prune");
        assert!(out.moves.position("W").is_some());
    }

    #[test]
    fn emptied_cell_becomes_absent() {
        let moves = MoveTable::new(vec![Move::new(1, "X"), Move::new(2, "Y").with_prereq("X")]);
        let videos = VideoTable::new(vec![Video::new(1, None, None)]);
        let out = prune(&moves, &videos, PrunePredicate::EmbedUnset, false).expect("prune");
        assert!(out.moves.rows[0].prereq.is_none());
    }

    #[test]
    fn no_media_predicate_treats_sentinel_as_missing() {
        let video = Video::new(1, Some("https://x"), Some(UNAVAILABLE_MEDIA));
        assert!(matches(PrunePredicate::NoMedia, &video));
        assert!(!matches(PrunePredicate::EmbedUnset, &video));
        assert!(!matches(PrunePredicate::LinkAndEmbedUnset, &video));
    }

    #[test]
    fn duplicate_name_surviving_is_fatal() {
        let moves = MoveTable::new(vec![Move::new(1, "X"), Move::new(2, "X")]);
        let videos = VideoTable::new(vec![Video::new(1, None, None)]);
        let err = prune(&moves, &videos, PrunePredicate::EmbedUnset, false).expect_err("must fail");
        assert!(matches!(err, GraphError::PruneSurvivor(names) if names == vec!["X".to_string()]));
    }
}
