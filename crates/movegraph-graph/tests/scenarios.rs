//! Known-table regression tests.
//!
//! Each test feeds a small hand-written table through the public API and
//! checks the exact findings, artifacts, or errors it must produce.

use movegraph_core::config::PrunePredicate;
use movegraph_core::diagnostics::{Coordinate, IdCell, IdMismatch, UnresolvedReason};
use movegraph_core::{Move, MoveTable, Video, VideoTable};

use movegraph_graph::check::{MoveChecks, check_symmetry, invalid_ids};
use movegraph_graph::graph::{adjacency_list, edge_count_check, name_to_int, relabel};
use movegraph_graph::masks::{SplitFractions, random_split, rng_for};
use movegraph_graph::parse::parse_edges;
use movegraph_graph::repair::{prune, sort_edges};
use movegraph_graph::{GraphError, MoveGraph};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn vault_table() -> MoveTable {
    MoveTable::new(vec![
        Move::new(1, "Dash").with_type("Vault").with_subseq("Kong, Dash Kong"),
        Move::new(2, "Kong").with_type("Vault").with_prereq("Dash").with_subseq("Double Kong"),
        Move::new(3, "Double Kong").with_type("Vault").with_prereq("Kong"),
        Move::new(4, "Dash Kong").with_type("Vault").with_prereq("Dash"),
        Move::new(5, "Wall Run").with_type("Wall"),
    ])
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

#[test]
fn gap_in_ids_flags_only_the_gap() {
    let ids = [Some(1), Some(2), Some(3), Some(5)];
    assert_eq!(
        invalid_ids(&ids),
        vec![IdMismatch {
            actual: IdCell::Id(5),
            expected: IdCell::Id(4),
        }]
    );
}

#[test]
fn one_sided_subseq_is_asymmetric() {
    let table = MoveTable::new(vec![Move::new(1, "A").with_subseq("B"), Move::new(2, "B")]);
    let report = check_symmetry(&table);
    assert_eq!(report.asymmetric, vec![Coordinate(1, 2)]);
    assert!(report.unresolved.is_empty());
}

#[test]
fn symmetric_table_is_clean() {
    let checks = MoveChecks::run(&vault_table(), &["id", "name", "type"], &[]);
    assert!(checks.is_clean(), "{checks:?}");
}

#[test]
fn unknown_reference_is_reported_not_raised() {
    let table = MoveTable::new(vec![
        Move::new(1, "A").with_subseq("Ghost, B"),
        Move::new(2, "B").with_prereq("A"),
    ]);
    let report = check_symmetry(&table);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].token, "Ghost");
    assert_eq!(report.unresolved[0].reason, UnresolvedReason::UnknownName);
    assert!(report.asymmetric.is_empty());

    let graph = MoveGraph::build(&table, false);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
}

// ---------------------------------------------------------------------------
// Build and validate
// ---------------------------------------------------------------------------

#[test]
fn isolated_moves_are_nodes() {
    let graph = MoveGraph::build_validated(&vault_table(), false).expect("valid");
    assert_eq!(graph.node_count(), 5);
    assert!(graph.node_index("Wall Run").is_some());
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn validation_fails_on_dangling_token() {
    let table = MoveTable::new(vec![Move::new(1, "A").with_subseq("Ghost")]);
    let err = MoveGraph::build_validated(&table, false).expect_err("must fail");
    assert!(matches!(err, GraphError::Validation { .. }));
}

#[test]
fn building_twice_gives_the_same_graph() {
    let table = vault_table();
    let a = MoveGraph::build(&table, false);
    let b = MoveGraph::build(&table, false);
    assert_eq!(a.edge_labels(), b.edge_labels());
    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(adjacency_list(&a), adjacency_list(&b));
}

#[test]
fn edge_count_matches_half_the_tokens_when_symmetric() {
    let table = vault_table();
    let graph = MoveGraph::build(&table, false);
    let check = edge_count_check(&graph, &parse_edges(&table));
    assert_eq!(check.resolved_tokens, 6);
    assert!(check.agrees());
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[test]
fn relabeled_adjacency_is_integer_keyed() {
    let table = vault_table();
    let graph = MoveGraph::build(&table, false);
    let ints = relabel(&adjacency_list(&graph), &name_to_int(&table)).expect("relabel");
    assert_eq!(ints.len(), 5);
    assert_eq!(ints[&0], vec![1, 3]);
    assert!(ints[&4].is_empty());
}

#[test]
fn adjacency_list_reloads_to_the_same_graph() {
    let table = vault_table();
    let graph = MoveGraph::build(&table, false);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("graph.json");
    movegraph_core::table::write_json(&path, &adjacency_list(&graph)).expect("write");

    let reloaded = MoveGraph::from_adjacency(
        &movegraph_graph::graph::read_adjacency(&path).expect("read"),
        false,
    );
    assert_eq!(reloaded.edge_labels(), graph.edge_labels());
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

#[test]
fn pruning_rewrites_neighbor_cells() {
    let moves = MoveTable::new(vec![
        Move::new(1, "X").with_subseq("Y"),
        Move::new(2, "Y").with_prereq("X, Z"),
        Move::new(3, "Z").with_subseq("Y"),
    ]);
    let videos = VideoTable::new(vec![
        Video::new(1, Some("https://x"), None),
        Video::new(2, Some("https://y"), Some("y.mp4")),
        Video::new(3, Some("https://z"), Some("z.mp4")),
    ]);

    let out = prune(&moves, &videos, PrunePredicate::EmbedUnset, false).expect("prune");
    assert_eq!(out.moves.rows[0].prereq.as_deref(), Some("Z"));
    let adjacency = adjacency_list(&out.graph);
    assert!(!adjacency.contains_key("X"));
    assert!(adjacency.values().flatten().all(|n| n != "X"));
    out.graph.validate(&out.moves).expect("valid after prune");
}

#[test]
fn sorted_table_still_builds_the_same_graph() {
    let table = vault_table();
    let sorted = sort_edges(&table);
    assert_eq!(
        MoveGraph::build(&sorted, false).edge_labels(),
        MoveGraph::build(&table, false).edge_labels()
    );
}

// ---------------------------------------------------------------------------
// Masks
// ---------------------------------------------------------------------------

#[test]
fn hundred_node_random_split_is_exact() {
    let fractions = SplitFractions {
        train: 0.6,
        val: 0.2,
        test: 0.2,
    };
    let masks = random_split(100, fractions, &mut rng_for(Some(7))).expect("split");
    let counts = masks.counts();
    assert_eq!(counts.train, 60);
    assert_eq!(counts.train + counts.val + counts.test, 100);
}
