//! Repairs. Each takes tables by reference and returns repaired copies.

pub mod media;
pub mod prune;
pub mod sort;

pub use media::{canonical_media_name, canonicalize_embeds, mark_unavailable, media_files};
pub use prune::{PruneOutcome, PrunedMove, prune};
pub use sort::sort_edges;
