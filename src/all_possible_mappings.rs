//! Brute-force exponential-time tree edit distance, used only to cross-check
//! `Apted` on small trees. Grounded on
//! `capted/lib/distance/AllPossibleMappings.h`: generate every one-to-one
//! partial mapping between the two trees' nodes, keep only the ones that
//! respect ancestor-descendant order and sibling order, and return the
//! cheapest one under the cost model.
//!
//! Test-only: this is exponential in tree size and exists to validate the
//! engine, not to run in production.

use crate::cost::CostModel;
use crate::indexing::AptedIndex;

/// `(preorder1, preorder2)`, with `-1` meaning "not mapped" (deleted or
/// inserted) on that side.
type Mapping = Vec<(i32, i32)>;

fn remove_mapping_element(mapping: &mut Mapping, pair: (i32, i32)) {
    let before = mapping.len();
    mapping.retain(|&p| p != pair);
    debug_assert_eq!(mapping.len(), before - 1, "{pair:?} must be present exactly once");
}

/// Every one-to-one partial mapping between `0..size1` and `0..size2`,
/// including the all-deleted/all-inserted mapping and every mapping in
/// between: for each pair of subsets of equal size, one bijection between
/// them, with the remaining nodes marked deleted or inserted.
fn generate_all_one_to_one_mappings(size1: i32, size2: i32) -> Vec<Mapping> {
    let mut mappings: Vec<Mapping> = vec![Vec::with_capacity((size1 + size2) as usize)];
    for n1 in 0..size1 {
        mappings[0].push((n1, -1));
    }
    for n2 in 0..size2 {
        mappings[0].push((-1, n2));
    }

    for n1 in 0..size1 {
        let mappings_copy = mappings.clone();
        for n2 in 0..size2 {
            for m in &mappings_copy {
                let element_add = !m.iter().any(|&(a, b)| a != -1 && b != -1 && b == n2);
                if element_add {
                    let mut m_copy = m.clone();
                    m_copy.push((n1, n2));
                    remove_mapping_element(&mut m_copy, (n1, -1));
                    remove_mapping_element(&mut m_copy, (-1, n2));
                    mappings.push(m_copy);
                }
            }
        }
    }
    mappings
}

/// Ancestor-descendant and sibling-order preservation, checked via each
/// tree's `preL_to_preR` translation (the reference's own test).
fn is_ted_mapping<L>(mapping: &Mapping, idx1: &AptedIndex<L>, idx2: &AptedIndex<L>) -> bool {
    for &(e1_first, e1_second) in mapping {
        if e1_first == -1 || e1_second == -1 {
            continue;
        }
        for &(e2_first, e2_second) in mapping {
            if e2_first == -1 || e2_second == -1 {
                continue;
            }
            let a = e1_first < e2_first
                && idx1.prel_to_prer[e1_first as usize] < idx1.prel_to_prer[e2_first as usize];
            let b = e1_second < e2_second
                && idx2.prel_to_prer[e1_second as usize] < idx2.prel_to_prer[e2_second as usize];
            if (a && !b) || (!a && b) {
                return false;
            }

            let a = e1_first < e2_first
                && idx1.prel_to_prer[e1_first as usize] > idx1.prel_to_prer[e2_first as usize];
            let b = e1_second < e2_second
                && idx2.prel_to_prer[e1_second as usize] > idx2.prel_to_prer[e2_second as usize];
            if (a && !b) || (!a && b) {
                return false;
            }
        }
    }
    true
}

fn get_min_cost<L, C: CostModel<L>>(
    mappings: &[Mapping],
    idx1: &AptedIndex<L>,
    idx2: &AptedIndex<L>,
    cost_model: &C,
) -> f64 {
    let mut min_cost = (idx1.tree_size + idx2.tree_size) as f64;

    for m in mappings {
        let mut m_cost = 0.0;
        for &(e1, e2) in m {
            if e1 > -1 && e2 > -1 {
                m_cost += cost_model.rename(&idx1.prel_to_label[e1 as usize], &idx2.prel_to_label[e2 as usize]);
            } else if e1 > -1 {
                m_cost += cost_model.delete(&idx1.prel_to_label[e1 as usize]);
            } else {
                m_cost += cost_model.insert(&idx2.prel_to_label[e2 as usize]);
            }
            if m_cost >= min_cost {
                break;
            }
        }
        if m_cost < min_cost {
            min_cost = m_cost;
        }
    }
    min_cost
}

/// Exponential-time reference distance: tries every one-to-one mapping and
/// returns the cheapest one that is a valid tree edit mapping.
pub fn brute_force_edit_distance<L, C: CostModel<L>>(
    idx1: &AptedIndex<L>,
    idx2: &AptedIndex<L>,
    cost_model: &C,
) -> f64 {
    let mut mappings = generate_all_one_to_one_mappings(idx1.tree_size as i32, idx2.tree_size as i32);
    mappings.retain(|m| is_ted_mapping(m, idx1, idx2));
    get_min_cost(&mappings, idx1, idx2, cost_model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apted::Apted;
    use crate::cost::UnitCostModel;
    use indextree::{Arena, NodeId};

    /// An unlabeled ordered-tree shape: each entry is one child's own shape.
    /// A leaf is `vec![]`.
    type Shape = Vec<Shape>;

    fn compositions(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![Vec::new()];
        }
        let mut result = Vec::new();
        for first in 1..=n {
            for mut rest in compositions(n - first) {
                let mut v = vec![first];
                v.append(&mut rest);
                result.push(v);
            }
        }
        result
    }

    /// Every ordered-tree shape with exactly `n` nodes (count is the n-th
    /// Catalan number).
    fn enumerate_shapes(n: usize) -> Vec<Shape> {
        if n == 1 {
            return vec![Vec::new()];
        }
        let mut result = Vec::new();
        for composition in compositions(n - 1) {
            let mut combos: Vec<Vec<Shape>> = vec![Vec::new()];
            for &part_size in &composition {
                let part_shapes = enumerate_shapes(part_size);
                let mut next = Vec::with_capacity(combos.len() * part_shapes.len());
                for combo in &combos {
                    for shape in &part_shapes {
                        let mut c = combo.clone();
                        c.push(shape.clone());
                        next.push(c);
                    }
                }
                combos = next;
            }
            result.extend(combos);
        }
        result
    }

    /// Every label assignment of length `n` over an alphabet of `alphabet_size`.
    fn label_combinations(n: usize, alphabet_size: i32) -> Vec<Vec<i32>> {
        let mut result = vec![Vec::new()];
        for _ in 0..n {
            let mut next = Vec::with_capacity(result.len() * alphabet_size as usize);
            for combo in &result {
                for label in 0..alphabet_size {
                    let mut c = combo.clone();
                    c.push(label);
                    next.push(c);
                }
            }
            result = next;
        }
        result
    }

    fn shape_to_tree(shape: &Shape, labels: &[i32], counter: &mut usize, arena: &mut Arena<i32>) -> NodeId {
        let label = labels[*counter];
        *counter += 1;
        let node = arena.new_node(label);
        for child_shape in shape {
            let child_id = shape_to_tree(child_shape, labels, counter, arena);
            node.append(child_id, arena);
        }
        node
    }

    fn build_labeled_tree(shape: &Shape, labels: &[i32]) -> Arena<i32> {
        let mut arena = Arena::new();
        let mut counter = 0usize;
        shape_to_tree(shape, labels, &mut counter, &mut arena);
        arena
    }

    /// Every ordered labeled tree with 1..=max_size nodes over a
    /// two-symbol alphabet, exhaustively.
    fn all_labeled_trees(max_size: usize, alphabet_size: i32) -> Vec<Arena<i32>> {
        let mut trees = Vec::new();
        for n in 1..=max_size {
            for shape in enumerate_shapes(n) {
                for labels in label_combinations(n, alphabet_size) {
                    trees.push(build_labeled_tree(&shape, &labels));
                }
            }
        }
        trees
    }

    #[test]
    fn test_shape_counts_match_catalan_numbers() {
        assert_eq!(enumerate_shapes(1).len(), 1);
        assert_eq!(enumerate_shapes(2).len(), 1);
        assert_eq!(enumerate_shapes(3).len(), 2);
        assert_eq!(enumerate_shapes(4).len(), 5);
    }

    #[test]
    fn test_agrees_with_apted_on_every_small_tree_pair() {
        // Every ordered labeled tree with 1..=4 nodes over a 2-symbol
        // alphabet: 102 trees, so every pair has combined size <= 8.
        let trees = all_labeled_trees(4, 2);
        let cost_model = UnitCostModel;

        for t1 in &trees {
            let idx1 = AptedIndex::build(t1, &cost_model).unwrap();
            for t2 in &trees {
                let idx2 = AptedIndex::build(t2, &cost_model).unwrap();

                let mut apted = Apted::new(&cost_model);
                let fast = apted.compute_edit_distance(&idx1, &idx2);
                let brute = brute_force_edit_distance(&idx1, &idx2, &cost_model);

                assert!(
                    (fast - brute).abs() < 1e-9,
                    "disagreement: apted={fast} brute={brute}, size1={}, size2={}",
                    idx1.tree_size,
                    idx2.tree_size
                );
            }
        }
    }
}
