use thiserror::Error;

use crate::parsing::TreeParseError;

/// Error surface for the indexing and distance-computation stages.
///
/// A misbehaving cost model (negative or non-finite cost) is not a variant
/// here: `cost::assert_finite_cost` catches it with a `debug_assert!` at the
/// call sites that feed the engine's running sums, since release builds are
/// expected to trust the cost model rather than pay for a runtime check.
#[derive(Error, Debug)]
pub enum TedError {
    #[error(transparent)]
    InvalidTree(#[from] TreeParseError),

    #[error("overflow while computing descendant-sum for node at preorder id {preorder}")]
    Overflow { preorder: i32 },
}
