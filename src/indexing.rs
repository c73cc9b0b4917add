//! Node indexer: precomputes every traversal order and auxiliary sum the
//! APTED engine needs. Grounded on `capted/lib/node/NodeIndexer.h`.
//!
//! `AptedIndex` is immutable after construction -- unlike the reference
//! implementation, it carries no mutable "current node" cursor. The engine
//! threads the subtree root under consideration as an explicit function
//! parameter instead (see DESIGN.md).

use indextree::Arena;

use crate::cost::{assert_finite_cost, CostModel};
use crate::error::TedError;

/// All indices and aggregate sums APTED needs for one input tree.
#[derive(Debug)]
pub struct AptedIndex<L> {
    pub tree_size: usize,

    /// Label of each node, indexed in left-to-right preorder.
    pub prel_to_label: Vec<L>,

    /// Subtree size, indexed in left-to-right preorder.
    pub prel_to_size: Vec<i32>,
    /// Preorder id of the parent, or -1 for the root. Indexed in preorder.
    pub prel_to_parent: Vec<i32>,
    /// Preorder ids of each node's children, left to right. Indexed in preorder.
    pub prel_to_children: Vec<Vec<i32>>,

    /// Leftmost-leaf-descendant, indexed in left-to-right postorder.
    pub postl_to_lld: Vec<i32>,
    /// Rightmost-leaf-descendant, indexed in right-to-left postorder.
    pub postr_to_rld: Vec<i32>,

    /// Preorder of nearest leaf to the left, indexed in left-to-right preorder.
    pub prel_to_ln: Vec<i32>,
    /// Preorder of nearest leaf to the right, indexed in right-to-left preorder.
    pub prer_to_ln: Vec<i32>,

    /// True iff the node is the leftmost child of its parent. Indexed in preorder.
    pub prel_to_type_left: Vec<bool>,
    /// True iff the node is the rightmost child of its parent. Indexed in preorder.
    pub prel_to_type_right: Vec<bool>,

    pub prel_to_prer: Vec<i32>,
    pub prer_to_prel: Vec<i32>,
    pub prel_to_postl: Vec<i32>,
    pub postl_to_prel: Vec<i32>,
    pub prel_to_postr: Vec<i32>,
    pub postr_to_prel: Vec<i32>,

    /// Bound sums for the left/right/inner decomposition choice. Indexed in preorder.
    pub prel_to_kr_sum: Vec<i64>,
    pub prel_to_rev_kr_sum: Vec<i64>,
    pub prel_to_desc_sum: Vec<i64>,

    /// Subtree delete/insert cost, indexed in preorder.
    pub prel_to_sum_del_cost: Vec<f64>,
    pub prel_to_sum_ins_cost: Vec<f64>,

    /// Count of leaves that are the leftmost/rightmost child of their parent;
    /// used by the caller to pick between the postL and postR strategy pass.
    pub lchl: i32,
    pub rchl: i32,
}

impl<L: Copy> AptedIndex<L> {
    pub fn is_leaf(&self, preorder: i32) -> bool {
        self.prel_to_size[preorder as usize] == 1
    }

    pub fn preorder_to_lld(&self, preorder: i32) -> i32 {
        self.postl_to_prel[self.postl_to_lld[self.prel_to_postl[preorder as usize] as usize] as usize]
    }

    pub fn preorder_to_rld(&self, preorder: i32) -> i32 {
        self.postr_to_prel[self.postr_to_rld[self.prel_to_postr[preorder as usize] as usize] as usize]
    }

    pub fn postl_to_node(&self, postl: i32) -> &L {
        &self.prel_to_label[self.postl_to_prel[postl as usize] as usize]
    }

    pub fn postr_to_node(&self, postr: i32) -> &L {
        &self.prel_to_label[self.postr_to_prel[postr as usize] as usize]
    }

    /// Builds the full index for `tree` under `cost_model`.
    pub fn build<C: CostModel<L>>(tree: &Arena<L>, cost_model: &C) -> Result<Self, TedError> {
        let tree_size = tree.count();
        let Some(root) = tree.iter().next() else {
            return Ok(Self::empty());
        };
        let root_id = tree.get_node_id(root).expect("root must resolve to a NodeId");

        let mut idx = Self {
            tree_size,
            prel_to_label: vec![*root.get(); tree_size],
            prel_to_size: vec![0; tree_size],
            prel_to_parent: vec![-1; tree_size],
            prel_to_children: vec![Vec::new(); tree_size],
            postl_to_lld: vec![0; tree_size],
            postr_to_rld: vec![0; tree_size],
            prel_to_ln: vec![-1; tree_size],
            prer_to_ln: vec![-1; tree_size],
            prel_to_type_left: vec![false; tree_size],
            prel_to_type_right: vec![false; tree_size],
            prel_to_prer: vec![0; tree_size],
            prer_to_prel: vec![0; tree_size],
            prel_to_postl: vec![0; tree_size],
            postl_to_prel: vec![0; tree_size],
            prel_to_postr: vec![0; tree_size],
            postr_to_prel: vec![0; tree_size],
            prel_to_kr_sum: vec![0; tree_size],
            prel_to_rev_kr_sum: vec![0; tree_size],
            prel_to_desc_sum: vec![0; tree_size],
            prel_to_sum_del_cost: vec![0.0; tree_size],
            prel_to_sum_ins_cost: vec![0.0; tree_size],
            lchl: 0,
            rchl: 0,
        };

        let mut preorder_tmp = 0i32;
        index_nodes(root_id, tree, &mut idx, &mut preorder_tmp, -1)?;
        post_traversal_indexing(&mut idx, cost_model);
        Ok(idx)
    }

    fn empty() -> Self {
        Self {
            tree_size: 0,
            prel_to_label: Vec::new(),
            prel_to_size: Vec::new(),
            prel_to_parent: Vec::new(),
            prel_to_children: Vec::new(),
            postl_to_lld: Vec::new(),
            postr_to_rld: Vec::new(),
            prel_to_ln: Vec::new(),
            prer_to_ln: Vec::new(),
            prel_to_type_left: Vec::new(),
            prel_to_type_right: Vec::new(),
            prel_to_prer: Vec::new(),
            prer_to_prel: Vec::new(),
            prel_to_postl: Vec::new(),
            postl_to_prel: Vec::new(),
            prel_to_postr: Vec::new(),
            postr_to_prel: Vec::new(),
            prel_to_kr_sum: Vec::new(),
            prel_to_rev_kr_sum: Vec::new(),
            prel_to_desc_sum: Vec::new(),
            prel_to_sum_del_cost: Vec::new(),
            prel_to_sum_ins_cost: Vec::new(),
            lchl: 0,
            rchl: 0,
        }
    }
}

/// Recursive preorder pass. `postorder_in` is the running left-to-right
/// postorder counter threaded across sibling calls (this node's postorder id
/// is assigned only after all its children have been indexed). Returns
/// `(postorder_out, size_tmp, desc_sizes_tmp, kr_sizes_sum_tmp,
/// revkr_sizes_sum_tmp)` -- the stats the parent call needs about the subtree
/// just indexed, mirroring the reference implementation's temp fields
/// without requiring them to live as mutable indexer state.
fn index_nodes<L: Copy>(
    node_id: indextree::NodeId,
    tree: &Arena<L>,
    idx: &mut AptedIndex<L>,
    preorder_tmp: &mut i32,
    postorder_in: i32,
) -> Result<(i32, i32, i64, i64, i64), TedError> {
    let tree_size = idx.tree_size as i32;
    let preorder = *preorder_tmp;
    *preorder_tmp += 1;

    let mut current_size = 0i32;
    let mut children_count = 0i32;
    let mut desc_sizes = 0i64;
    let mut kr_sizes_sum = 0i64;
    let mut revkr_sizes_sum = 0i64;
    let mut postorder = postorder_in;

    let child_ids: Vec<_> = node_id.children(tree).collect();
    let n_children = child_ids.len();

    for (i, child_id) in child_ids.iter().enumerate() {
        children_count += 1;
        let current_preorder = *preorder_tmp;
        idx.prel_to_parent[current_preorder as usize] = preorder;

        let (po_after, size_tmp, desc_tmp, kr_tmp, revkr_tmp) =
            index_nodes(*child_id, tree, idx, preorder_tmp, postorder)?;
        postorder = po_after;
        idx.prel_to_children[preorder as usize].push(current_preorder);

        current_size += 1 + size_tmp;
        desc_sizes += desc_tmp;

        if children_count > 1 {
            kr_sizes_sum += kr_tmp + size_tmp as i64 + 1;
        } else {
            kr_sizes_sum += kr_tmp;
            idx.prel_to_type_left[current_preorder as usize] = true;
        }

        if i < n_children - 1 {
            revkr_sizes_sum += revkr_tmp + size_tmp as i64 + 1;
        } else {
            revkr_sizes_sum += revkr_tmp;
            idx.prel_to_type_right[current_preorder as usize] = true;
        }
    }

    postorder += 1;

    let current_desc_sizes = desc_sizes + current_size as i64 + 1;

    let size_plus_one = current_size as i64 + 1;
    let factor = size_plus_one
        .checked_add(3)
        .ok_or(TedError::Overflow { preorder })?;
    let product = size_plus_one
        .checked_mul(factor)
        .ok_or(TedError::Overflow { preorder })?;
    idx.prel_to_desc_sum[preorder as usize] = product / 2 - current_desc_sizes;
    idx.prel_to_kr_sum[preorder as usize] = kr_sizes_sum + current_size as i64 + 1;
    idx.prel_to_rev_kr_sum[preorder as usize] = revkr_sizes_sum + current_size as i64 + 1;

    idx.prel_to_label[preorder as usize] = *tree.get(node_id).unwrap().get();
    idx.prel_to_size[preorder as usize] = current_size + 1;

    let preorder_r = tree_size - 1 - postorder;
    idx.prel_to_prer[preorder as usize] = preorder_r;
    idx.prer_to_prel[preorder_r as usize] = preorder;

    idx.postl_to_prel[postorder as usize] = preorder;
    idx.prel_to_postl[preorder as usize] = postorder;
    idx.prel_to_postr[preorder as usize] = tree_size - 1 - preorder;
    idx.postr_to_prel[(tree_size - 1 - preorder) as usize] = preorder;

    Ok((postorder, current_size, current_desc_sizes, kr_sizes_sum, revkr_sizes_sum))
}

fn post_traversal_indexing<L: Copy, C: CostModel<L>>(idx: &mut AptedIndex<L>, cost_model: &C) {
    let tree_size = idx.tree_size as i32;
    let mut current_leaf = -1i32;

    for i in 0..tree_size {
        idx.prel_to_ln[i as usize] = current_leaf;
        if idx.is_leaf(i) {
            current_leaf = i;
        }

        let postl = i;
        let preorder = idx.postl_to_prel[postl as usize];
        idx.postl_to_lld[postl as usize] = if idx.prel_to_size[preorder as usize] == 1 {
            postl
        } else {
            let first_child = idx.prel_to_children[preorder as usize][0];
            idx.postl_to_lld[idx.prel_to_postl[first_child as usize] as usize]
        };

        let postr = i;
        let preorder = idx.postr_to_prel[postr as usize];
        idx.postr_to_rld[postr as usize] = if idx.prel_to_size[preorder as usize] == 1 {
            postr
        } else {
            let last_child = *idx.prel_to_children[preorder as usize].last().unwrap();
            idx.postr_to_rld[idx.prel_to_postr[last_child as usize] as usize]
        };

        if idx.prel_to_size[i as usize] == 1 {
            let parent = idx.prel_to_parent[i as usize];
            if parent > -1 {
                if parent + 1 == i {
                    idx.lchl += 1;
                } else if idx.prel_to_prer[parent as usize] + 1 == idx.prel_to_prer[i as usize] {
                    idx.rchl += 1;
                }
            }
        }

        let node_for_sum = tree_size - i - 1;
        let parent_for_sum = idx.prel_to_parent[node_for_sum as usize];
        let label = idx.prel_to_label[node_for_sum as usize];
        idx.prel_to_sum_del_cost[node_for_sum as usize] += assert_finite_cost(cost_model.delete(&label));
        idx.prel_to_sum_ins_cost[node_for_sum as usize] += assert_finite_cost(cost_model.insert(&label));
        if parent_for_sum > -1 {
            let del = idx.prel_to_sum_del_cost[node_for_sum as usize];
            let ins = idx.prel_to_sum_ins_cost[node_for_sum as usize];
            idx.prel_to_sum_del_cost[parent_for_sum as usize] += del;
            idx.prel_to_sum_ins_cost[parent_for_sum as usize] += ins;
        }
    }

    let mut current_leaf = -1i32;
    for i in 0..tree_size {
        idx.prer_to_ln[i as usize] = current_leaf;
        if idx.is_leaf(idx.prer_to_prel[i as usize]) {
            current_leaf = i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::UnitCostModel;
    use crate::parsing::{parse_tree, LabelDict};

    fn build(tree_str: &str) -> AptedIndex<i32> {
        let mut ld = LabelDict::new();
        let tree = parse_tree(tree_str, &mut ld).unwrap();
        AptedIndex::build(&tree, &UnitCostModel).unwrap()
    }

    #[test]
    fn test_root_size_equals_node_count() {
        let idx = build("{a{b{d}}{c}}");
        assert_eq!(idx.prel_to_size[0] as usize, idx.tree_size);
    }

    #[test]
    fn test_postorder_preorder_are_inverse() {
        let idx = build("{a{b{d}}{c}}");
        for preorder in 0..idx.tree_size as i32 {
            let postl = idx.prel_to_postl[preorder as usize];
            assert_eq!(idx.postl_to_prel[postl as usize], preorder);
        }
    }

    #[test]
    fn test_prer_prel_are_inverse() {
        let idx = build("{a{b{d}}{c}}");
        for preorder in 0..idx.tree_size as i32 {
            let prer = idx.prel_to_prer[preorder as usize];
            assert_eq!(idx.prer_to_prel[prer as usize], preorder);
        }
    }

    #[test]
    fn test_leaf_has_trivial_lld_rld() {
        let idx = build("{a{b}}");
        let leaf_preorder = 1;
        assert_eq!(idx.preorder_to_lld(leaf_preorder), leaf_preorder);
        assert_eq!(idx.preorder_to_rld(leaf_preorder), leaf_preorder);
    }

    #[test]
    fn test_sum_del_cost_is_subtree_node_count_under_unit_cost() {
        let idx = build("{a{b{d}}{c}}");
        assert_eq!(idx.prel_to_sum_del_cost[0], idx.tree_size as f64);
    }
}
