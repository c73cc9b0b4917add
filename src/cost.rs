//! Cost model polymorphism for the distance engine.
//!
//! Grounded on `capted/lib/CostModel.h` and `capted/lib/StringNodeData.h`:
//! three pure functions over a node's payload, monomorphized at each call
//! site rather than invoked through a vtable.

/// Delete, insert and rename costs for a single node label type `L`.
///
/// Implementations must be pure: equal inputs must always produce equal
/// outputs, and every cost should be non-negative.
pub trait CostModel<L> {
    fn delete(&self, node: &L) -> f64;
    fn insert(&self, node: &L) -> f64;
    fn rename(&self, from: &L, to: &L) -> f64;
}

/// Panics in debug builds if `cost` is negative or non-finite. Release
/// builds skip the check and trust the cost model, matching the engine's
/// policy of validating at the call sites that feed its running sums rather
/// than threading a `Result` through every cost lookup.
#[inline]
pub fn assert_finite_cost(cost: f64) -> f64 {
    debug_assert!(
        cost.is_finite() && cost >= 0.0,
        "cost model returned a negative or non-finite cost: {cost}"
    );
    cost
}

/// Unit cost model: delete and insert cost 1, rename costs 0 for equal
/// labels and 1 otherwise. The reference cost model used by the CLI and the
/// test corpus.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitCostModel;

impl<L: PartialEq> CostModel<L> for UnitCostModel {
    fn delete(&self, _node: &L) -> f64 {
        1.0
    }

    fn insert(&self, _node: &L) -> f64 {
        1.0
    }

    fn rename(&self, from: &L, to: &L) -> f64 {
        if from == to {
            0.0
        } else {
            1.0
        }
    }
}
