//! Train/validation/test node masks.
//!
//! # Strategies
//!
//! - [`random_split`]: a shuffled `train` fraction of all nodes trains; the
//!   rest is the validation pool.
//! - [`extrapolation_split`]: the largest connected component trains; every
//!   other node is the validation pool.
//! - [`media_split`]: moves whose video has the configured column set train;
//!   the rest is the validation pool.
//!
//! In every strategy the test set is sampled without replacement out of the
//! validation pool, so no node is counted twice. A pool too small for the
//! requested test count is a [`SplitError`], never a smaller test set.
//! Counts are exact: `floor(N * fraction)` with a small tolerance for binary
//! rounding, so `0.6 * 100` trains exactly 60 nodes. Before returning, each strategy
//! checks that the masks partition the node set.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::seq::index::sample;
use serde::Serialize;
use tracing::{info, instrument};

use movegraph_core::config::{MaskConfig, MediaColumn};
use movegraph_core::table::{TableError, write_column, write_json};
use movegraph_core::{MoveTable, VideoTable};

use crate::error::{GraphError, SplitError};
use crate::graph::MoveGraph;

/// Tolerance for fraction arithmetic.
pub const SPLIT_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Fractions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitFractions {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl SplitFractions {
    /// Each fraction must lie in `[0, 1]` and the three must sum to 1.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a [`SplitError`].
    pub fn validate(&self) -> Result<(), SplitError> {
        check_fraction("train_split", self.train)?;
        check_fraction("val_split", self.val)?;
        check_fraction("test_split", self.test)?;
        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > SPLIT_TOLERANCE {
            return Err(SplitError::BadSum { sum });
        }
        Ok(())
    }
}

impl From<&MaskConfig> for SplitFractions {
    fn from(config: &MaskConfig) -> Self {
        Self {
            train: config.train_split,
            val: config.val_split,
            test: config.test_split,
        }
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), SplitError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SplitError::OutOfRange { name, value })
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn count_of(n: usize, fraction: f64) -> usize {
    ((n as f64).mul_add(fraction, SPLIT_TOLERANCE)).floor() as usize
}

/// Random generator for mask sampling: seeded when `seed` is set.
#[must_use]
pub fn rng_for(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

// ---------------------------------------------------------------------------
// Masks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Split {
    Train,
    Val,
    Test,
}

/// Three boolean vectors over table rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Masks {
    pub train: Vec<bool>,
    pub val: Vec<bool>,
    pub test: Vec<bool>,
}

/// Number of `true` entries per mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaskCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
    pub total: usize,
}

impl Masks {
    fn from_assignment(assignment: &[Split]) -> Self {
        let mask = |split: Split| assignment.iter().map(|s| *s == split).collect();
        Self {
            train: mask(Split::Train),
            val: mask(Split::Val),
            test: mask(Split::Test),
        }
    }

    /// Node count the masks cover.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    #[must_use]
    pub fn counts(&self) -> MaskCounts {
        let ones = |mask: &[bool]| mask.iter().filter(|b| **b).count();
        MaskCounts {
            train: ones(&self.train),
            val: ones(&self.val),
            test: ones(&self.test),
            total: self.len(),
        }
    }

    /// Every node is in exactly one mask and the counts sum to the node count.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MaskPartition`] otherwise.
    pub fn check_partition(&self) -> Result<(), GraphError> {
        let counts = self.counts();
        let lengths_agree = self.val.len() == counts.total && self.test.len() == counts.total;
        let exactly_one = lengths_agree
            && (0..counts.total)
                .all(|i| u8::from(self.train[i]) + u8::from(self.val[i]) + u8::from(self.test[i]) == 1);

        if exactly_one && counts.train + counts.val + counts.test == counts.total {
            Ok(())
        } else {
            Err(GraphError::MaskPartition {
                train: counts.train,
                val: counts.val,
                test: counts.test,
                total: counts.total,
            })
        }
    }

    /// Write `train_mask`, `val_mask` and `test_mask` as single-column files
    /// (`.tsv`) plus all three as `masks.json`, under `dir` with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] on I/O failure.
    pub fn write(&self, dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, TableError> {
        let mut written = Vec::with_capacity(4);
        for (name, mask) in [
            ("train_mask", &self.train),
            ("val_mask", &self.val),
            ("test_mask", &self.test),
        ] {
            let path = dir.join(format!("{prefix}{name}.tsv"));
            write_column(&path, name, mask)?;
            written.push(path);
        }
        let path = dir.join(format!("{prefix}masks.json"));
        write_json(&path, self)?;
        written.push(path);
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Move `count` uniformly chosen nodes of `pool` from validation to test.
///
/// A pool smaller than `count` is an error; the test set is never shrunk.
fn carve_test(
    assignment: &mut [Split],
    pool: &[usize],
    count: usize,
    rng: &mut StdRng,
) -> Result<(), SplitError> {
    if count > pool.len() {
        return Err(SplitError::TestExceedsPool {
            requested: count,
            available: pool.len(),
        });
    }
    for pick in sample(rng, pool.len(), count).into_vec() {
        assignment[pool[pick]] = Split::Test;
    }
    Ok(())
}

fn finish(assignment: &[Split], strategy: &'static str) -> Result<Masks, GraphError> {
    let masks = Masks::from_assignment(assignment);
    masks.check_partition()?;
    let counts = masks.counts();
    info!(
        strategy,
        train = counts.train,
        val = counts.val,
        test = counts.test,
        total = counts.total,
        "generated masks"
    );
    Ok(masks)
}

/// Random split of `n` nodes.
///
/// # Errors
///
/// Returns [`GraphError::Split`] for invalid fractions and
/// [`GraphError::MaskPartition`] if the result is not a partition.
#[instrument(skip(rng))]
pub fn random_split(n: usize, fractions: SplitFractions, rng: &mut StdRng) -> Result<Masks, GraphError> {
    fractions.validate()?;

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let train_count = count_of(n, fractions.train).min(n);
    let mut assignment = vec![Split::Val; n];
    for &node in &order[..train_count] {
        assignment[node] = Split::Train;
    }

    let mut pool = order[train_count..].to_vec();
    pool.sort_unstable();
    carve_test(&mut assignment, &pool, count_of(n, fractions.test), rng)?;

    finish(&assignment, "random")
}

/// Largest connected component trains; the rest is the validation pool.
///
/// Ties between equally large components go to the one holding the lowest
/// row. With `test_split == 0` the validation mask is exactly the
/// complement of the training mask.
///
/// # Errors
///
/// Returns [`GraphError::Split`] if `test_split` is outside `[0, 1]` or
/// asks for more test nodes than lie outside the largest component, and
/// [`GraphError::MaskPartition`] if the result is not a partition.
#[instrument(skip(graph, rng), fields(nodes = graph.node_count()))]
pub fn extrapolation_split(
    graph: &MoveGraph,
    test_split: f64,
    rng: &mut StdRng,
) -> Result<Masks, GraphError> {
    check_fraction("test_split", test_split)?;

    let n = graph.node_count();
    let mut largest: &[usize] = &[];
    let components = graph.components();
    for component in &components {
        if component.len() > largest.len() {
            largest = component;
        }
    }

    let mut assignment = vec![Split::Val; n];
    for &node in largest {
        assignment[node] = Split::Train;
    }

    let pool: Vec<usize> = (0..n).filter(|i| assignment[*i] == Split::Val).collect();
    carve_test(&mut assignment, &pool, count_of(n, test_split), rng)?;

    finish(&assignment, "extrapolation")
}

/// Moves whose joined video has `column` set train; a random
/// `test_fraction` of the rest is carved out as test.
///
/// Moves with no video row count as unset.
///
/// # Errors
///
/// Returns [`GraphError::Split`] if `test_fraction` is outside `[0, 1]` and
/// [`GraphError::MaskPartition`] if the result is not a partition.
#[instrument(skip(moves, videos, rng), fields(moves = moves.len()))]
pub fn media_split(
    moves: &MoveTable,
    videos: &VideoTable,
    column: MediaColumn,
    test_fraction: f64,
    rng: &mut StdRng,
) -> Result<Masks, GraphError> {
    check_fraction("media_test_fraction", test_fraction)?;

    let mut assignment: Vec<Split> = videos
        .join(moves)
        .into_iter()
        .map(|video| {
            let present = video.is_some_and(|v| match column {
                MediaColumn::Link => v.link.is_some(),
                MediaColumn::Embed => v.embed.is_some(),
            });
            if present { Split::Train } else { Split::Val }
        })
        .collect();

    let pool: Vec<usize> = (0..assignment.len())
        .filter(|i| assignment[*i] == Split::Val)
        .collect();
    let count = count_of(pool.len(), test_fraction);
    carve_test(&mut assignment, &pool, count, rng)?;

    finish(&assignment, "media")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::{Move, Video};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn fractions(train: f64, val: f64, test: f64) -> SplitFractions {
        SplitFractions { train, val, test }
    }

    #[test]
    fn random_split_counts_are_exact() {
        let masks = random_split(100, fractions(0.6, 0.2, 0.2), &mut rng()).expect("split");
        let counts = masks.counts();
        assert_eq!((counts.train, counts.val, counts.test), (60, 20, 20));
        masks.check_partition().expect("partition");
    }

    #[test]
    fn random_split_rounds_down_without_losing_nodes() {
        let masks = random_split(7, fractions(0.5, 0.25, 0.25), &mut rng()).expect("split");
        let counts = masks.counts();
        assert_eq!(counts.train, 3);
        assert_eq!(counts.test, 1);
        assert_eq!(counts.val, 3);
    }

    #[test]
    fn fractions_outside_unit_interval_are_rejected() {
        let err = random_split(10, fractions(1.2, -0.1, -0.1), &mut rng()).expect_err("must fail");
        assert!(matches!(
            err,
            GraphError::Split(SplitError::OutOfRange { name: "train_split", .. })
        ));
    }

    #[test]
    fn fractions_must_sum_to_one() {
        let err = fractions(0.6, 0.3, 0.2).validate().expect_err("must fail");
        assert!(matches!(err, SplitError::BadSum { .. }));
        fractions(0.7, 0.2, 0.1).validate().expect("binary rounding is tolerated");
    }

    #[test]
    fn same_seed_same_masks() {
        let a = random_split(50, fractions(0.6, 0.2, 0.2), &mut rng()).expect("split");
        let b = random_split(50, fractions(0.6, 0.2, 0.2), &mut rng()).expect("split");
        assert_eq!(a, b);
    }

    fn two_components() -> MoveGraph {
        let table = MoveTable::new(vec![
            Move::new(1, "A").with_subseq("B"),
            Move::new(2, "B").with_subseq("C"),
            Move::new(3, "C"),
            Move::new(4, "D").with_subseq("E"),
            Move::new(5, "E"),
            Move::new(6, "F"),
        ]);
        MoveGraph::build(&table, false)
    }

    #[test]
    fn extrapolation_trains_on_largest_component() {
        let masks = extrapolation_split(&two_components(), 0.0, &mut rng()).expect("split");
        assert_eq!(masks.train, vec![true, true, true, false, false, false]);
        assert_eq!(masks.val, vec![false, false, false, true, true, true]);
        assert!(masks.test.iter().all(|t| !t));
    }

    #[test]
    fn extrapolation_carves_test_from_validation() {
        let masks = extrapolation_split(&two_components(), 0.5, &mut rng()).expect("split");
        let counts = masks.counts();
        assert_eq!(counts.train, 3);
        assert_eq!(counts.test, 3);
        assert_eq!(counts.val, 0);
        assert!(masks.train.iter().zip(&masks.test).all(|(a, b)| !(*a && *b)));
    }

    #[test]
    fn extrapolation_refuses_to_shrink_the_test_set() {
        let err = extrapolation_split(&two_components(), 0.9, &mut rng()).expect_err("must fail");
        assert!(matches!(
            err,
            GraphError::Split(SplitError::TestExceedsPool {
                requested: 5,
                available: 3,
            })
        ));
    }

    #[test]
    fn extrapolation_rejects_bad_test_split() {
        assert!(extrapolation_split(&two_components(), 1.5, &mut rng()).is_err());
    }

    #[test]
    fn media_split_uses_join_column() {
        let moves = MoveTable::new(vec![
            Move::new(1, "A"),
            Move::new(2, "B"),
            Move::new(3, "C"),
            Move::new(4, "D"),
            Move::new(5, "E"),
        ]);
        let videos = VideoTable::new(vec![
            Video::new(1, Some("https://a"), None),
            Video::new(2, None, Some("b.mp4")),
            Video::new(3, None, None),
            Video::new(4, None, None),
        ]);
        let masks = media_split(&moves, &videos, MediaColumn::Link, 0.5, &mut rng()).expect("split");
        assert_eq!(masks.train, vec![true, false, false, false, false]);
        let counts = masks.counts();
        assert_eq!(counts.test, 2);
        assert_eq!(counts.val, 2);

        let by_embed = media_split(&moves, &videos, MediaColumn::Embed, 0.0, &mut rng()).expect("split");
        assert_eq!(by_embed.train, vec![false, true, false, false, false]);
    }

    #[test]
    fn overlapping_masks_fail_the_partition_check() {
        let masks = Masks {
            train: vec![true, false],
            val: vec![true, true],
            test: vec![false, false],
        };
        assert!(matches!(
            masks.check_partition(),
            Err(GraphError::MaskPartition { train: 1, val: 2, test: 0, total: 2 })
        ));
    }

    #[test]
    fn writes_three_columns_and_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let masks = random_split(4, fractions(0.5, 0.5, 0.0), &mut rng()).expect("split");
        let written = masks.write(dir.path(), "random_").expect("write");
        assert_eq!(written.len(), 4);
        let train = std::fs::read_to_string(dir.path().join("random_train_mask.tsv")).expect("read");
        assert_eq!(train.lines().count(), 5);
        assert!(train.starts_with("train_mask\n"));
    }
}
