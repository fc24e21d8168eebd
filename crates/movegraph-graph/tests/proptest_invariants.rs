use proptest::prelude::*;

use movegraph_core::{Move, MoveTable};
use movegraph_graph::MoveGraph;
use movegraph_graph::masks::{SplitFractions, random_split, rng_for};
use movegraph_graph::repair::sort_edges;

const NAMES: [&str; 6] = ["Dash", "Kong", "Cat Leap", "Lazy", "Tic Tac", "Wall Run"];

/// Relation cell drawn from the fixed name pool, plus the occasional unknown
/// name and stray delimiter.
fn arb_cell() -> impl Strategy<Value = Option<String>> {
    let token = prop_oneof![
        8 => proptest::sample::select(NAMES.to_vec()).prop_map(str::to_string),
        1 => Just("Ghost".to_string()),
        1 => Just(String::new()),
    ];
    proptest::option::of(proptest::collection::vec(token, 1..4).prop_map(|t| t.join(", ")))
}

fn arb_table() -> impl Strategy<Value = MoveTable> {
    proptest::collection::vec((arb_cell(), arb_cell()), NAMES.len()).prop_map(|cells| {
        let rows = cells
            .into_iter()
            .zip(NAMES)
            .enumerate()
            .map(|(i, ((prereq, subseq), name))| {
                let mut mv = Move::new(i64::try_from(i).unwrap_or_default() + 1, name);
                mv.prereq = prereq;
                mv.subseq = subseq;
                mv
            })
            .collect();
        MoveTable::new(rows)
    })
}

fn arb_fractions() -> impl Strategy<Value = SplitFractions> {
    (0_u32..=10, 0_u32..=10).prop_filter_map("sum above one", |(a, b)| {
        (a + b <= 10).then(|| SplitFractions {
            train: f64::from(a) / 10.0,
            val: f64::from(b) / 10.0,
            test: f64::from(10 - a - b) / 10.0,
        })
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn node_count_equals_row_count(table in arb_table(), directed in any::<bool>()) {
        prop_assert_eq!(MoveGraph::build(&table, directed).node_count(), table.len());
    }

    #[test]
    fn build_is_idempotent(table in arb_table()) {
        let a = MoveGraph::build(&table, false);
        let b = MoveGraph::build(&table, false);
        prop_assert_eq!(a.edge_labels(), b.edge_labels());
    }

    #[test]
    fn validation_passes_iff_every_token_resolves(table in arb_table()) {
        let resolves = table.iter().all(|mv| {
            [mv.prereq.as_deref(), mv.subseq.as_deref()]
                .into_iter()
                .flatten()
                .flat_map(|cell| cell.split(", "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .all(|t| NAMES.contains(&t))
        });
        prop_assert_eq!(MoveGraph::build_validated(&table, false).is_ok(), resolves);
    }

    #[test]
    fn sort_edges_is_stable(table in arb_table()) {
        let once = sort_edges(&table);
        let twice = sort_edges(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn masks_partition_nodes(n in 0_usize..200, fractions in arb_fractions(), seed in any::<u64>()) {
        let masks = random_split(n, fractions, &mut rng_for(Some(seed))).expect("valid fractions");
        let counts = masks.counts();
        prop_assert_eq!(counts.train + counts.val + counts.test, n);
        for i in 0..n {
            let hits = [masks.train[i], masks.val[i], masks.test[i]].iter().filter(|b| **b).count();
            prop_assert_eq!(hits, 1);
        }
    }
}
