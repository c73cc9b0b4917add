//! APTED distance engine: strategy computer, single-path functions and the
//! recursive driver. Grounded on `capted/lib/distance/Apted.h` -- this is
//! the algorithmic core the rest of the crate exists to serve.
//!
//! The reference implementation tracks the subtree root under consideration
//! as mutable state on the node indexer (`setCurrentNode`/`getCurrentNode`).
//! Since `AptedIndex` is immutable after construction here, the current
//! subtree roots are threaded as explicit parameters through `gted` and the
//! single-path functions instead (see DESIGN.md, Open Questions).

use crate::cost::{assert_finite_cost, CostModel};
use crate::indexing::AptedIndex;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PathType {
    Left,
    Right,
    Inner,
}

fn signum(v: i32) -> i32 {
    match v {
        v if v < 0 => -1,
        v if v > 0 => 1,
        _ => 0,
    }
}

fn three_way_min(da: f64, db: f64, dc: f64) -> f64 {
    if da >= db {
        if db >= dc {
            dc
        } else {
            db
        }
    } else if da >= dc {
        dc
    } else {
        da
    }
}

/// Computes tree edit distance between two indexed trees under a cost model.
///
/// One `Apted` holds the scratch state (`delta`, `q`, the `fn`/`ft` sibling
/// arrays and the subproblem counter) for a single computation; build a new
/// one per pair of trees.
pub struct Apted<'a, L, C: CostModel<L>> {
    cost_model: &'a C,
    delta: Vec<Vec<f64>>,
    q: Vec<f64>,
    fn_arr: Vec<i32>,
    ft_arr: Vec<i32>,
    counter: u64,
    _marker: std::marker::PhantomData<L>,
}

impl<'a, L: Copy, C: CostModel<L>> Apted<'a, L, C> {
    pub fn new(cost_model: &'a C) -> Self {
        Self {
            cost_model,
            delta: Vec::new(),
            q: Vec::new(),
            fn_arr: Vec::new(),
            ft_arr: Vec::new(),
            counter: 0,
            _marker: std::marker::PhantomData,
        }
    }

    /// Number of single-path subproblems evaluated by the last computation.
    /// A benchmarking metric only, not part of the distance contract.
    pub fn subproblem_count(&self) -> u64 {
        self.counter
    }

    pub fn compute_edit_distance(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>) -> f64 {
        self.counter = 0;
        if it1.lchl < it1.rchl {
            self.compute_opt_strategy_post_l(it1, it2);
        } else {
            self.compute_opt_strategy_post_r(it1, it2);
        }
        self.ted_init(it1, it2);
        self.gted(it1, it2, 0, 0)
    }

    // -- strategy type classification -----------------------------------

    fn get_strategy_path_type(
        path_id_with_offset: i32,
        path_id_offset: i32,
        current_root_node_prel: i32,
        current_subtree_size: i32,
    ) -> PathType {
        if signum(path_id_with_offset) == -1 {
            return PathType::Left;
        }
        let mut path_id = path_id_with_offset.abs() - 1;
        if path_id >= path_id_offset {
            path_id -= path_id_offset;
        }
        if path_id == current_root_node_prel + current_subtree_size - 1 {
            PathType::Right
        } else {
            PathType::Inner
        }
    }

    // -- spf1: both subtrees size <= node count 1 on one side ------------

    fn spf1(&self, ni1: &AptedIndex<L>, root1: i32, ni2: &AptedIndex<L>, root2: i32) -> f64 {
        let size1 = ni1.prel_to_size[root1 as usize];
        let size2 = ni2.prel_to_size[root2 as usize];

        if size1 == 1 && size2 == 1 {
            let n1 = &ni1.prel_to_label[root1 as usize];
            let n2 = &ni2.prel_to_label[root2 as usize];
            let max_cost = assert_finite_cost(self.cost_model.delete(n1))
                + assert_finite_cost(self.cost_model.insert(n2));
            let ren_cost = assert_finite_cost(self.cost_model.rename(n1, n2));
            return ren_cost.min(max_cost);
        }

        if size1 == 1 {
            let n1 = &ni1.prel_to_label[root1 as usize];
            let mut cost = ni2.prel_to_sum_ins_cost[root2 as usize];
            let max_cost = cost + self.cost_model.delete(n1);
            let mut min_ren_minus_ins = cost;
            for i in root2..root2 + size2 {
                let n2 = &ni2.prel_to_label[i as usize];
                let node_ren_minus_ins = self.cost_model.rename(n1, n2) - self.cost_model.insert(n2);
                if node_ren_minus_ins < min_ren_minus_ins {
                    min_ren_minus_ins = node_ren_minus_ins;
                }
            }
            cost += min_ren_minus_ins;
            return cost.min(max_cost);
        }

        // size2 == 1
        let n2 = &ni2.prel_to_label[root2 as usize];
        let mut cost = ni1.prel_to_sum_del_cost[root1 as usize];
        let max_cost = cost + self.cost_model.insert(n2);
        let mut min_ren_minus_del = cost;
        for i in root1..root1 + size1 {
            let n1 = &ni1.prel_to_label[i as usize];
            let node_ren_minus_del = self.cost_model.rename(n1, n2) - self.cost_model.delete(n1);
            if node_ren_minus_del < min_ren_minus_del {
                min_ren_minus_del = node_ren_minus_del;
            }
        }
        cost += min_ren_minus_del;
        cost.min(max_cost)
    }

    // -- spfL / spfR: classical keyroot decomposition ---------------------

    fn compute_key_roots(
        it2: &AptedIndex<L>,
        subtree_root: i32,
        path_id: i32,
        key_roots: &mut [i32],
        mut index: usize,
    ) -> usize {
        key_roots[index] = subtree_root;
        index += 1;
        let mut path_node = path_id;
        while path_node > subtree_root {
            let parent = it2.prel_to_parent[path_node as usize];
            for &child in &it2.prel_to_children[parent as usize] {
                if child != path_node {
                    index = Self::compute_key_roots(it2, child, it2.preorder_to_lld(child), key_roots, index);
                }
            }
            path_node = parent;
        }
        index
    }

    fn compute_rev_key_roots(
        it2: &AptedIndex<L>,
        subtree_root: i32,
        path_id: i32,
        rev_key_roots: &mut [i32],
        mut index: usize,
    ) -> usize {
        rev_key_roots[index] = subtree_root;
        index += 1;
        let mut path_node = path_id;
        while path_node > subtree_root {
            let parent = it2.prel_to_parent[path_node as usize];
            for &child in &it2.prel_to_children[parent as usize] {
                if child != path_node {
                    index =
                        Self::compute_rev_key_roots(it2, child, it2.preorder_to_rld(child), rev_key_roots, index);
                }
            }
            path_node = parent;
        }
        index
    }

    fn tree_edit_dist(
        &mut self,
        it1: &AptedIndex<L>,
        it2: &AptedIndex<L>,
        it1_subtree: i32,
        it2_subtree: i32,
        forestdist: &mut [Vec<f64>],
        trees_swapped: bool,
    ) {
        let i = it1.prel_to_postl[it1_subtree as usize];
        let j = it2.prel_to_postl[it2_subtree as usize];
        let ioff = it1.postl_to_lld[i as usize] - 1;
        let joff = it2.postl_to_lld[j as usize] - 1;

        forestdist[0][0] = 0.0;
        for i1 in 1..=(i - ioff) {
            let node = it1.postl_to_node(i1 + ioff);
            let c = if trees_swapped {
                self.cost_model.insert(node)
            } else {
                self.cost_model.delete(node)
            };
            forestdist[i1 as usize][0] = forestdist[(i1 - 1) as usize][0] + c;
        }
        for j1 in 1..=(j - joff) {
            let node = it2.postl_to_node(j1 + joff);
            let c = if trees_swapped {
                self.cost_model.delete(node)
            } else {
                self.cost_model.insert(node)
            };
            forestdist[0][j1 as usize] = forestdist[0][(j1 - 1) as usize] + c;
        }

        for i1 in 1..=(i - ioff) {
            for j1 in 1..=(j - joff) {
                self.counter += 1;
                let node1 = it1.postl_to_node(i1 + ioff);
                let node2 = it2.postl_to_node(j1 + joff);
                let u = if trees_swapped {
                    self.cost_model.rename(node2, node1)
                } else {
                    self.cost_model.rename(node1, node2)
                };
                let del_cost = if trees_swapped {
                    self.cost_model.insert(node1)
                } else {
                    self.cost_model.delete(node1)
                };
                let ins_cost = if trees_swapped {
                    self.cost_model.delete(node2)
                } else {
                    self.cost_model.insert(node2)
                };
                let da = forestdist[(i1 - 1) as usize][j1 as usize] + del_cost;
                let db = forestdist[i1 as usize][(j1 - 1) as usize] + ins_cost;
                let dc;
                if it1.postl_to_lld[(i1 + ioff) as usize] == it1.postl_to_lld[i as usize]
                    && it2.postl_to_lld[(j1 + joff) as usize] == it2.postl_to_lld[j as usize]
                {
                    dc = forestdist[(i1 - 1) as usize][(j1 - 1) as usize] + u;
                    let val = forestdist[(i1 - 1) as usize][(j1 - 1) as usize];
                    let p1 = it1.postl_to_prel[(i1 + ioff) as usize];
                    let p2 = it2.postl_to_prel[(j1 + joff) as usize];
                    if trees_swapped {
                        self.delta[p2 as usize][p1 as usize] = val;
                    } else {
                        self.delta[p1 as usize][p2 as usize] = val;
                    }
                } else {
                    let lld1 = it1.postl_to_lld[(i1 + ioff) as usize];
                    let lld2 = it2.postl_to_lld[(j1 + joff) as usize];
                    let p1 = it1.postl_to_prel[(i1 + ioff) as usize];
                    let p2 = it2.postl_to_prel[(j1 + joff) as usize];
                    let delta_val = if trees_swapped {
                        self.delta[p2 as usize][p1 as usize]
                    } else {
                        self.delta[p1 as usize][p2 as usize]
                    };
                    dc = forestdist[(lld1 - 1 - ioff) as usize][(lld2 - 1 - joff) as usize] + delta_val + u;
                }
                forestdist[i1 as usize][j1 as usize] = three_way_min(da, db, dc);
            }
        }
    }

    fn spf_l(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>, current1: i32, current2: i32, trees_swapped: bool) -> f64 {
        let size2 = it2.prel_to_size[current2 as usize];
        let mut key_roots = vec![-1i32; size2 as usize];
        let path_id = it2.preorder_to_lld(current2);
        let first_key_root = Self::compute_key_roots(it2, current2, path_id, &mut key_roots, 0);

        let size1 = it1.prel_to_size[current1 as usize];
        let mut forestdist = vec![vec![0.0f64; (size2 + 1) as usize]; (size1 + 1) as usize];

        for i in (0..first_key_root).rev() {
            let kr = key_roots[i];
            self.tree_edit_dist(it1, it2, current1, kr, &mut forestdist, trees_swapped);
        }

        forestdist[size1 as usize][size2 as usize]
    }

    fn rev_tree_edit_dist(
        &mut self,
        it1: &AptedIndex<L>,
        it2: &AptedIndex<L>,
        it1_subtree: i32,
        it2_subtree: i32,
        forestdist: &mut [Vec<f64>],
        trees_swapped: bool,
    ) {
        let i = it1.prel_to_postr[it1_subtree as usize];
        let j = it2.prel_to_postr[it2_subtree as usize];
        let ioff = it1.postr_to_rld[i as usize] - 1;
        let joff = it2.postr_to_rld[j as usize] - 1;

        forestdist[0][0] = 0.0;
        for i1 in 1..=(i - ioff) {
            let node = it1.postr_to_node(i1 + ioff);
            let c = if trees_swapped {
                self.cost_model.insert(node)
            } else {
                self.cost_model.delete(node)
            };
            forestdist[i1 as usize][0] = forestdist[(i1 - 1) as usize][0] + c;
        }
        for j1 in 1..=(j - joff) {
            let node = it2.postr_to_node(j1 + joff);
            let c = if trees_swapped {
                self.cost_model.delete(node)
            } else {
                self.cost_model.insert(node)
            };
            forestdist[0][j1 as usize] = forestdist[0][(j1 - 1) as usize] + c;
        }

        for i1 in 1..=(i - ioff) {
            for j1 in 1..=(j - joff) {
                self.counter += 1;
                let node1 = it1.postr_to_node(i1 + ioff);
                let node2 = it2.postr_to_node(j1 + joff);
                let u = if trees_swapped {
                    self.cost_model.rename(node2, node1)
                } else {
                    self.cost_model.rename(node1, node2)
                };
                let del_cost = if trees_swapped {
                    self.cost_model.insert(node1)
                } else {
                    self.cost_model.delete(node1)
                };
                let ins_cost = if trees_swapped {
                    self.cost_model.delete(node2)
                } else {
                    self.cost_model.insert(node2)
                };
                let da = forestdist[(i1 - 1) as usize][j1 as usize] + del_cost;
                let db = forestdist[i1 as usize][(j1 - 1) as usize] + ins_cost;
                let dc;
                if it1.postr_to_rld[(i1 + ioff) as usize] == it1.postr_to_rld[i as usize]
                    && it2.postr_to_rld[(j1 + joff) as usize] == it2.postr_to_rld[j as usize]
                {
                    dc = forestdist[(i1 - 1) as usize][(j1 - 1) as usize] + u;
                    let val = forestdist[(i1 - 1) as usize][(j1 - 1) as usize];
                    let p1 = it1.postr_to_prel[(i1 + ioff) as usize];
                    let p2 = it2.postr_to_prel[(j1 + joff) as usize];
                    if trees_swapped {
                        self.delta[p2 as usize][p1 as usize] = val;
                    } else {
                        self.delta[p1 as usize][p2 as usize] = val;
                    }
                } else {
                    let rld1 = it1.postr_to_rld[(i1 + ioff) as usize];
                    let rld2 = it2.postr_to_rld[(j1 + joff) as usize];
                    let p1 = it1.postr_to_prel[(i1 + ioff) as usize];
                    let p2 = it2.postr_to_prel[(j1 + joff) as usize];
                    let delta_val = if trees_swapped {
                        self.delta[p2 as usize][p1 as usize]
                    } else {
                        self.delta[p1 as usize][p2 as usize]
                    };
                    dc = forestdist[(rld1 - 1 - ioff) as usize][(rld2 - 1 - joff) as usize] + delta_val + u;
                }
                forestdist[i1 as usize][j1 as usize] = three_way_min(da, db, dc);
            }
        }
    }

    fn spf_r(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>, current1: i32, current2: i32, trees_swapped: bool) -> f64 {
        let size2 = it2.prel_to_size[current2 as usize];
        let mut rev_key_roots = vec![-1i32; size2 as usize];
        let path_id = it2.preorder_to_rld(current2);
        let first_key_root = Self::compute_rev_key_roots(it2, current2, path_id, &mut rev_key_roots, 0);

        let size1 = it1.prel_to_size[current1 as usize];
        let mut forestdist = vec![vec![0.0f64; (size2 + 1) as usize]; (size1 + 1) as usize];

        for i in (0..first_key_root).rev() {
            let kr = rev_key_roots[i];
            self.rev_tree_edit_dist(it1, it2, current1, kr, &mut forestdist, trees_swapped);
        }

        forestdist[size1 as usize][size2 as usize]
    }

    // -- spfA: inner/heavy-path single-path function ----------------------

    #[allow(clippy::too_many_lines)]
    fn spf_a(
        &mut self,
        it1: &AptedIndex<L>,
        it2: &AptedIndex<L>,
        current1: i32,
        current2: i32,
        path_id: i32,
        path_type: PathType,
        trees_swapped: bool,
    ) -> f64 {
        let cost_model = self.cost_model;
        let current_subtree_prel1 = current1;
        let current_subtree_prel2 = current2;

        let mut current_forest_size1 = 0i32;
        let mut current_forest_size2;
        let mut tmp_forest_size1 = 0i32;
        let mut current_forest_cost1 = 0.0f64;
        let mut current_forest_cost2;
        let mut tmp_forest_cost1 = 0.0f64;

        let subtree_size2 = it2.prel_to_size[current_subtree_prel2 as usize];
        let subtree_size1 = it1.prel_to_size[current_subtree_prel1 as usize];

        let mut t: Vec<Vec<f64>> = vec![vec![0.0; (subtree_size2 + 1) as usize]; (subtree_size2 + 1) as usize];
        let mut s: Vec<Vec<f64>> = vec![vec![0.0; (subtree_size2 + 1) as usize]; (subtree_size1 + 1) as usize];

        let mut min_cost = 0.0f64;
        let mut sp1;
        let mut sp2;
        let mut sp3;
        let mut start_path_node = -1i32;
        let mut end_path_node = path_id;
        let mut it1_prel_off;
        let it2_prel_off = current_subtree_prel2;
        let mut it1_prer_off;
        let it2_prer_off = it2.prel_to_prer[it2_prel_off as usize];

        // Loop A -- walk up the path.
        while end_path_node >= current_subtree_prel1 {
            it1_prel_off = end_path_node;
            it1_prer_off = it1.prel_to_prer[end_path_node as usize];
            let mut r_f_last = -1i32;
            let mut l_f_last = -1i32;
            let end_path_node_in_prer = it1.prel_to_prer[end_path_node as usize];
            let start_path_node_in_prer = if start_path_node == -1 {
                i32::MAX
            } else {
                it1.prel_to_prer[start_path_node as usize]
            };
            let parent_of_end_path_node = it1.prel_to_parent[end_path_node as usize];
            let parent_of_end_path_node_in_prer = if parent_of_end_path_node == -1 {
                i32::MAX
            } else {
                it1.prel_to_prer[parent_of_end_path_node as usize]
            };

            let left_part = start_path_node - end_path_node > 1;
            let right_part = start_path_node >= 0 && start_path_node_in_prer - end_path_node_in_prer > 1;

            // Nodes to the left of the path.
            if path_type == PathType::Right || (path_type == PathType::Inner && left_part) {
                let (mut l_f_first, r_f_first);
                if start_path_node == -1 {
                    r_f_first = end_path_node_in_prer;
                    l_f_first = end_path_node;
                } else {
                    r_f_first = start_path_node_in_prer;
                    l_f_first = start_path_node - 1;
                }

                if !right_part {
                    r_f_last = end_path_node_in_prer;
                }

                let r_g_last = it2.prel_to_prer[current_subtree_prel2 as usize];
                let r_g_first = r_g_last + subtree_size2 - 1;
                l_f_last = if right_part { end_path_node + 1 } else { end_path_node };

                let fn_sentinel = self.fn_arr.len() - 1;
                self.fn_arr[fn_sentinel] = -1;
                for i in current_subtree_prel2..current_subtree_prel2 + subtree_size2 {
                    self.fn_arr[i as usize] = -1;
                    self.ft_arr[i as usize] = -1;
                }

                tmp_forest_size1 = current_forest_size1;
                tmp_forest_cost1 = current_forest_cost1;

                // Loop B -- for all nodes in G.
                let mut r_g = r_g_first;
                while r_g >= r_g_last {
                    let l_g_first = it2.prer_to_prel[r_g as usize];
                    let r_g_in_prel = it2.prer_to_prel[r_g as usize];
                    let r_g_minus1_in_prel = if r_g <= it2.prel_to_prer[current_subtree_prel2 as usize] {
                        i32::MAX
                    } else {
                        it2.prer_to_prel[(r_g - 1) as usize]
                    };
                    let parent_of_r_g_in_prel = it2.prel_to_parent[r_g_in_prel as usize];
                    let l_g_last = match path_type {
                        PathType::Right => {
                            if l_g_first == current_subtree_prel2 || r_g_minus1_in_prel != parent_of_r_g_in_prel {
                                l_g_first
                            } else {
                                it2.prel_to_parent[l_g_first as usize] + 1
                            }
                        }
                        _ => {
                            if l_g_first == current_subtree_prel2 {
                                l_g_first
                            } else {
                                current_subtree_prel2 + 1
                            }
                        }
                    };

                    update_fn_array(&mut self.fn_arr, it2.prel_to_ln[l_g_first as usize], l_g_first, current_subtree_prel2);
                    update_ft_array(&mut self.fn_arr, &mut self.ft_arr, it2.prel_to_ln[l_g_first as usize], l_g_first);

                    let mut r_f = r_f_first;

                    current_forest_size1 = tmp_forest_size1;
                    current_forest_cost1 = tmp_forest_cost1;

                    // Loop C -- for all nodes to the left of the path node.
                    let mut l_f = l_f_first;
                    while l_f >= l_f_last {
                        if l_f == l_f_last && !right_part {
                            r_f = r_f_last;
                        }

                        let l_f_node = &it1.prel_to_label[l_f as usize];
                        current_forest_size1 += 1;
                        current_forest_cost1 += if trees_swapped {
                            cost_model.insert(l_f_node)
                        } else {
                            cost_model.delete(l_f_node)
                        };
                        current_forest_size2 = it2.prel_to_size[l_g_first as usize];
                        current_forest_cost2 = if trees_swapped {
                            it2.prel_to_sum_del_cost[l_g_first as usize]
                        } else {
                            it2.prel_to_sum_ins_cost[l_g_first as usize]
                        };
                        let l_f_in_prer = it1.prel_to_prer[l_f as usize];
                        let f_forest_is_tree = l_f_in_prer == r_f;
                        let l_f_subtree_size = it1.prel_to_size[l_f as usize];
                        let l_f_is_consecutive = start_path_node - l_f == 1;
                        let l_f_is_left_sibling = l_f + l_f_subtree_size == start_path_node;

                        let sp1_s_row = (l_f + 1 - it1_prel_off) as usize;
                        let sp2_s_row = (l_f - it1_prel_off) as usize;
                        let mut sp3_s_row = 0usize;
                        let swrite_row = (l_f - it1_prel_off) as usize;

                        let mut sp1_source = 1;
                        let mut sp3_source = 1;

                        if f_forest_is_tree {
                            if l_f_subtree_size == 1 {
                                sp1_source = 3;
                            } else if l_f_is_consecutive {
                                sp1_source = 2;
                            }
                            sp3 = 0.0;
                            sp3_source = 2;
                        } else {
                            if l_f_is_consecutive {
                                sp1_source = 2;
                            }
                            sp3 = current_forest_cost1
                                - if trees_swapped {
                                    it1.prel_to_sum_ins_cost[l_f as usize]
                                } else {
                                    it1.prel_to_sum_del_cost[l_f as usize]
                                };
                            if l_f_is_left_sibling {
                                sp3_source = 3;
                            }
                        }

                        if sp3_source == 1 {
                            sp3_s_row = (l_f + l_f_subtree_size - it1_prel_off) as usize;
                        }

                        let mut l_g = l_g_first;

                        sp1 = match sp1_source {
                            1 => s[sp1_s_row][(l_g - it2_prel_off) as usize],
                            2 => t[(l_g - it2_prel_off) as usize][(r_g - it2_prer_off) as usize],
                            _ => current_forest_cost2,
                        };
                        sp1 += if trees_swapped {
                            cost_model.insert(l_f_node)
                        } else {
                            cost_model.delete(l_f_node)
                        };
                        min_cost = sp1;

                        if current_forest_size2 == 1 {
                            sp2 = current_forest_cost1;
                        } else {
                            sp2 = self.q[l_f as usize];
                        }
                        let l_g_node = &it2.prel_to_label[l_g as usize];
                        sp2 += if trees_swapped {
                            cost_model.delete(l_g_node)
                        } else {
                            cost_model.insert(l_g_node)
                        };
                        if sp2 < min_cost {
                            min_cost = sp2;
                        }

                        if sp3 < min_cost {
                            sp3 += if trees_swapped {
                                self.delta[l_g as usize][l_f as usize]
                            } else {
                                self.delta[l_f as usize][l_g as usize]
                            };
                            if sp3 < min_cost {
                                sp3 += if trees_swapped {
                                    cost_model.rename(l_g_node, l_f_node)
                                } else {
                                    cost_model.rename(l_f_node, l_g_node)
                                };
                                if sp3 < min_cost {
                                    min_cost = sp3;
                                }
                            }
                        }

                        s[swrite_row][(l_g - it2_prel_off) as usize] = min_cost;

                        l_g = self.ft_arr[l_g as usize];
                        self.counter += 1;

                        // Loop D -- for all nodes to the left of rG.
                        while l_g >= l_g_last {
                            current_forest_size2 += 1;
                            let l_g_node = &it2.prel_to_label[l_g as usize];
                            current_forest_cost2 += if trees_swapped {
                                cost_model.delete(l_g_node)
                            } else {
                                cost_model.insert(l_g_node)
                            };
                            let del_or_ins_l_f = if trees_swapped {
                                cost_model.insert(l_f_node)
                            } else {
                                cost_model.delete(l_f_node)
                            };
                            sp1 = match sp1_source {
                                1 => s[sp1_s_row][(l_g - it2_prel_off) as usize] + del_or_ins_l_f,
                                2 => t[(l_g - it2_prel_off) as usize][(r_g - it2_prer_off) as usize] + del_or_ins_l_f,
                                _ => current_forest_cost2 + del_or_ins_l_f,
                            };

                            let fn_lg = self.fn_arr[l_g as usize];
                            sp2 = s[sp2_s_row][(fn_lg - it2_prel_off) as usize]
                                + if trees_swapped {
                                    cost_model.delete(l_g_node)
                                } else {
                                    cost_model.insert(l_g_node)
                                };
                            min_cost = sp1;
                            if sp2 < min_cost {
                                min_cost = sp2;
                            }

                            sp3 = if trees_swapped {
                                self.delta[l_g as usize][l_f as usize]
                            } else {
                                self.delta[l_f as usize][l_g as usize]
                            };
                            if sp3 < min_cost {
                                let fn_idx = self.fn_arr[(l_g + it2.prel_to_size[l_g as usize] - 1) as usize];
                                sp3 += match sp3_source {
                                    1 => s[sp3_s_row][(fn_idx - it2_prel_off) as usize],
                                    2 => {
                                        current_forest_cost2
                                            - if trees_swapped {
                                                it2.prel_to_sum_del_cost[l_g as usize]
                                            } else {
                                                it2.prel_to_sum_ins_cost[l_g as usize]
                                            }
                                    }
                                    _ => t[(fn_idx - it2_prel_off) as usize][(r_g - it2_prer_off) as usize],
                                };
                                if sp3 < min_cost {
                                    sp3 += if trees_swapped {
                                        cost_model.rename(l_g_node, l_f_node)
                                    } else {
                                        cost_model.rename(l_f_node, l_g_node)
                                    };
                                    if sp3 < min_cost {
                                        min_cost = sp3;
                                    }
                                }
                            }
                            s[swrite_row][(l_g - it2_prel_off) as usize] = min_cost;
                            l_g = self.ft_arr[l_g as usize];
                            self.counter += 1;
                        }
                        l_f -= 1;
                    }

                    if r_g_minus1_in_prel == parent_of_r_g_in_prel {
                        if !right_part {
                            if left_part {
                                let val = s[(l_f_last + 1 - it1_prel_off) as usize]
                                    [(r_g_minus1_in_prel + 1 - it2_prel_off) as usize];
                                if trees_swapped {
                                    self.delta[parent_of_r_g_in_prel as usize][end_path_node as usize] = val;
                                } else {
                                    self.delta[end_path_node as usize][parent_of_r_g_in_prel as usize] = val;
                                }
                            }
                            if end_path_node > 0
                                && end_path_node == parent_of_end_path_node + 1
                                && end_path_node_in_prer == parent_of_end_path_node_in_prer + 1
                            {
                                let val = s[(l_f_last - it1_prel_off) as usize]
                                    [(r_g_minus1_in_prel + 1 - it2_prel_off) as usize];
                                if trees_swapped {
                                    self.delta[parent_of_r_g_in_prel as usize][parent_of_end_path_node as usize] = val;
                                } else {
                                    self.delta[parent_of_end_path_node as usize][parent_of_r_g_in_prel as usize] = val;
                                }
                            }
                        }

                        let mut l_f2 = l_f_first;
                        while l_f2 >= l_f_last {
                            self.q[l_f2 as usize] =
                                s[(l_f2 - it1_prel_off) as usize][(parent_of_r_g_in_prel + 1 - it2_prel_off) as usize];
                            l_f2 -= 1;
                        }
                    }

                    let mut l_g = l_g_first;
                    while l_g >= l_g_last {
                        t[(l_g - it2_prel_off) as usize][(r_g - it2_prer_off) as usize] =
                            s[(l_f_last - it1_prel_off) as usize][(l_g - it2_prel_off) as usize];
                        l_g = self.ft_arr[l_g as usize];
                    }

                    r_g -= 1;
                }
            }

            // Nodes to the right of the path.
            if path_type == PathType::Left
                || (path_type == PathType::Inner && right_part)
                || (path_type == PathType::Inner && !left_part && !right_part)
            {
                let (l_f_first, mut r_f_first);
                if start_path_node == -1 {
                    l_f_first = end_path_node;
                    r_f_first = it1.prel_to_prer[end_path_node as usize];
                } else {
                    r_f_first = it1.prel_to_prer[start_path_node as usize] - 1;
                    l_f_first = end_path_node + 1;
                }

                let l_f_last = end_path_node;
                let l_g_last = current_subtree_prel2;
                let l_g_first = l_g_last + subtree_size2 - 1;
                let r_f_last = it1.prel_to_prer[end_path_node as usize];

                let fn_sentinel = self.fn_arr.len() - 1;
                self.fn_arr[fn_sentinel] = -1;
                for i in current_subtree_prel2..current_subtree_prel2 + subtree_size2 {
                    self.fn_arr[i as usize] = -1;
                    self.ft_arr[i as usize] = -1;
                }

                tmp_forest_size1 = current_forest_size1;
                tmp_forest_cost1 = current_forest_cost1;

                let mut l_g = l_g_first;
                while l_g >= l_g_last {
                    let r_g_first = it2.prel_to_prer[l_g as usize];
                    update_fn_array(
                        &mut self.fn_arr,
                        it2.prer_to_ln[r_g_first as usize],
                        r_g_first,
                        it2.prel_to_prer[current_subtree_prel2 as usize],
                    );
                    update_ft_array(&mut self.fn_arr, &mut self.ft_arr, it2.prer_to_ln[r_g_first as usize], r_g_first);

                    let mut l_f = l_f_first;
                    let l_g_minus1_in_prer = if l_g <= current_subtree_prel2 {
                        i32::MAX
                    } else {
                        it2.prel_to_prer[(l_g - 1) as usize]
                    };
                    let parent_of_l_g = it2.prel_to_parent[l_g as usize];
                    let parent_of_l_g_in_prer = if parent_of_l_g == -1 {
                        -1
                    } else {
                        it2.prel_to_prer[parent_of_l_g as usize]
                    };

                    current_forest_size1 = tmp_forest_size1;
                    current_forest_cost1 = tmp_forest_cost1;

                    let r_g_last = match path_type {
                        PathType::Left => {
                            if l_g == current_subtree_prel2 || it2.prel_to_children[parent_of_l_g as usize][0] != l_g {
                                r_g_first
                            } else {
                                it2.prel_to_prer[parent_of_l_g as usize] + 1
                            }
                        }
                        _ => {
                            if r_g_first == it2.prel_to_prer[current_subtree_prel2 as usize] {
                                r_g_first
                            } else {
                                it2.prel_to_prer[current_subtree_prel2 as usize]
                            }
                        }
                    };

                    let mut r_f = r_f_first;
                    while r_f >= r_f_last {
                        if r_f == r_f_last {
                            l_f = l_f_last;
                        }
                        let r_f_in_prel = it1.prer_to_prel[r_f as usize];

                        current_forest_size1 += 1;
                        let r_f_node_for_cost = &it1.prel_to_label[r_f_in_prel as usize];
                        current_forest_cost1 += if trees_swapped {
                            cost_model.insert(r_f_node_for_cost)
                        } else {
                            cost_model.delete(r_f_node_for_cost)
                        };

                        current_forest_size2 = it2.prel_to_size[l_g as usize];
                        current_forest_cost2 = if trees_swapped {
                            it2.prel_to_sum_del_cost[l_g as usize]
                        } else {
                            it2.prel_to_sum_ins_cost[l_g as usize]
                        };
                        let r_f_subtree_size = it1.prel_to_size[r_f_in_prel as usize];

                        let (r_f_is_consecutive, r_f_is_right_sibling) = if start_path_node > 0 {
                            (
                                start_path_node_in_prer - r_f == 1,
                                r_f + r_f_subtree_size == start_path_node_in_prer,
                            )
                        } else {
                            (false, false)
                        };

                        let f_forest_is_tree = r_f_in_prel == l_f;
                        let r_f_node = &it1.prel_to_label[r_f_in_prel as usize];

                        let sp1_s_row = (r_f + 1 - it1_prer_off) as usize;
                        let sp2_s_row = (r_f - it1_prer_off) as usize;
                        let mut sp3_s_row = 0usize;
                        let swrite_row = (r_f - it1_prer_off) as usize;
                        let sp1_t_row = (l_g - it2_prel_off) as usize;
                        let sp3_t_row = (l_g - it2_prel_off) as usize;

                        let mut sp1_source = 1;
                        let mut sp3_source = 1;

                        if f_forest_is_tree {
                            if r_f_subtree_size == 1 {
                                sp1_source = 3;
                            } else if r_f_is_consecutive {
                                sp1_source = 2;
                            }
                            sp3 = 0.0;
                            sp3_source = 2;
                        } else {
                            if r_f_is_consecutive {
                                sp1_source = 2;
                            }
                            sp3 = current_forest_cost1
                                - if trees_swapped {
                                    it1.prel_to_sum_ins_cost[r_f_in_prel as usize]
                                } else {
                                    it1.prel_to_sum_del_cost[r_f_in_prel as usize]
                                };
                            if r_f_is_right_sibling {
                                sp3_source = 3;
                            }
                        }

                        if sp3_source == 1 {
                            sp3_s_row = (r_f + r_f_subtree_size - it1_prer_off) as usize;
                        }

                        sp2 = if current_forest_size2 == 1 {
                            current_forest_cost1
                        } else {
                            self.q[r_f as usize]
                        };

                        let mut r_g = r_g_first;
                        let r_g_first_in_prel = it2.prer_to_prel[r_g_first as usize];
                        current_forest_size2 += 1;

                        sp1 = match sp1_source {
                            1 => s[sp1_s_row][(r_g - it2_prer_off) as usize],
                            2 => t[sp1_t_row][(r_g - it2_prer_off) as usize],
                            _ => current_forest_cost2,
                        };
                        sp1 += if trees_swapped {
                            cost_model.insert(r_f_node)
                        } else {
                            cost_model.delete(r_f_node)
                        };
                        min_cost = sp1;

                        let r_g_first_node = &it2.prel_to_label[r_g_first_in_prel as usize];
                        sp2 += if trees_swapped {
                            cost_model.delete(r_g_first_node)
                        } else {
                            cost_model.insert(r_g_first_node)
                        };
                        if sp2 < min_cost {
                            min_cost = sp2;
                        }

                        if sp3 < min_cost {
                            sp3 += if trees_swapped {
                                self.delta[r_g_first_in_prel as usize][r_f_in_prel as usize]
                            } else {
                                self.delta[r_f_in_prel as usize][r_g_first_in_prel as usize]
                            };
                            if sp3 < min_cost {
                                sp3 += if trees_swapped {
                                    cost_model.rename(r_g_first_node, r_f_node)
                                } else {
                                    cost_model.rename(r_f_node, r_g_first_node)
                                };
                                if sp3 < min_cost {
                                    min_cost = sp3;
                                }
                            }
                        }

                        s[swrite_row][(r_g - it2_prer_off) as usize] = min_cost;
                        r_g = self.ft_arr[r_g as usize];
                        self.counter += 1;

                        // Loop D' -- for all nodes to the right of lG.
                        while r_g >= r_g_last {
                            let r_g_in_prel = it2.prer_to_prel[r_g as usize];
                            current_forest_size2 += 1;
                            let r_g_node = &it2.prel_to_label[r_g_in_prel as usize];
                            current_forest_cost2 += if trees_swapped {
                                cost_model.delete(r_g_node)
                            } else {
                                cost_model.insert(r_g_node)
                            };
                            let del_or_ins_r_f = if trees_swapped {
                                cost_model.insert(r_f_node)
                            } else {
                                cost_model.delete(r_f_node)
                            };
                            sp1 = match sp1_source {
                                1 => s[sp1_s_row][(r_g - it2_prer_off) as usize] + del_or_ins_r_f,
                                2 => t[sp1_t_row][(r_g - it2_prer_off) as usize] + del_or_ins_r_f,
                                _ => current_forest_cost2 + del_or_ins_r_f,
                            };
                            let fn_rg = self.fn_arr[r_g as usize];
                            sp2 = s[sp2_s_row][(fn_rg - it2_prer_off) as usize]
                                + if trees_swapped {
                                    cost_model.delete(r_g_node)
                                } else {
                                    cost_model.insert(r_g_node)
                                };
                            min_cost = sp1;
                            if sp2 < min_cost {
                                min_cost = sp2;
                            }
                            sp3 = if trees_swapped {
                                self.delta[r_g_in_prel as usize][r_f_in_prel as usize]
                            } else {
                                self.delta[r_f_in_prel as usize][r_g_in_prel as usize]
                            };
                            if sp3 < min_cost {
                                let fn_idx = self.fn_arr[(r_g + it2.prel_to_size[r_g_in_prel as usize] - 1) as usize];
                                sp3 += match sp3_source {
                                    1 => s[sp3_s_row][(fn_idx - it2_prer_off) as usize],
                                    2 => {
                                        current_forest_cost2
                                            - if trees_swapped {
                                                it2.prel_to_sum_del_cost[r_g_in_prel as usize]
                                            } else {
                                                it2.prel_to_sum_ins_cost[r_g_in_prel as usize]
                                            }
                                    }
                                    _ => t[sp3_t_row][(fn_idx - it2_prer_off) as usize],
                                };
                                if sp3 < min_cost {
                                    sp3 += if trees_swapped {
                                        cost_model.rename(r_g_node, r_f_node)
                                    } else {
                                        cost_model.rename(r_f_node, r_g_node)
                                    };
                                    if sp3 < min_cost {
                                        min_cost = sp3;
                                    }
                                }
                            }
                            s[swrite_row][(r_g - it2_prer_off) as usize] = min_cost;
                            r_g = self.ft_arr[r_g as usize];
                            self.counter += 1;
                        }
                        r_f -= 1;
                    }

                    if l_g > current_subtree_prel2 && l_g - 1 == parent_of_l_g {
                        if right_part {
                            let val = s[(r_f_last + 1 - it1_prer_off) as usize]
                                [(l_g_minus1_in_prer + 1 - it2_prer_off) as usize];
                            if trees_swapped {
                                self.delta[parent_of_l_g as usize][end_path_node as usize] = val;
                            } else {
                                self.delta[end_path_node as usize][parent_of_l_g as usize] = val;
                            }
                        }
                        if end_path_node > 0
                            && end_path_node == parent_of_end_path_node + 1
                            && end_path_node_in_prer == parent_of_end_path_node_in_prer + 1
                        {
                            let val = s[(r_f_last - it1_prer_off) as usize]
                                [(l_g_minus1_in_prer + 1 - it2_prer_off) as usize];
                            if trees_swapped {
                                self.delta[parent_of_l_g as usize][parent_of_end_path_node as usize] = val;
                            } else {
                                self.delta[parent_of_end_path_node as usize][parent_of_l_g as usize] = val;
                            }
                        }

                        let mut r_f2 = r_f_first;
                        while r_f2 >= r_f_last {
                            self.q[r_f2 as usize] = s[(r_f2 - it1_prer_off) as usize]
                                [(parent_of_l_g_in_prer + 1 - it2_prer_off) as usize];
                            r_f2 -= 1;
                        }
                    }

                    let mut r_g = r_g_first;
                    while r_g >= r_g_last {
                        t[(l_g - it2_prel_off) as usize][(r_g - it2_prer_off) as usize] =
                            s[(r_f_last - it1_prer_off) as usize][(r_g - it2_prer_off) as usize];
                        r_g = self.ft_arr[r_g as usize];
                    }

                    l_g -= 1;
                }
            }

            start_path_node = end_path_node;
            end_path_node = it1.prel_to_parent[end_path_node as usize];
        }

        // `min_cost` from the last node processed by the final iteration of
        // Loop A is the distance between the two subtrees rooted at
        // current1/current2.
        min_cost
    }

    // -- strategy computer -------------------------------------------------

    fn compute_opt_strategy_post_l(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>) {
        let size1 = it1.tree_size as i32;
        let size2 = it2.tree_size as i32;

        self.delta = vec![vec![0.0; size2 as usize]; size1 as usize];

        let mut cost1_l: Vec<Vec<f64>> = vec![Vec::new(); size1 as usize];
        let mut cost1_r: Vec<Vec<f64>> = vec![Vec::new(); size1 as usize];
        let mut cost1_i: Vec<Vec<f64>> = vec![Vec::new(); size1 as usize];
        let mut cost2_l = vec![0.0f64; size2 as usize];
        let mut cost2_r = vec![0.0f64; size2 as usize];
        let mut cost2_i = vec![0.0f64; size2 as usize];
        let mut cost2_path = vec![0i32; size2 as usize];
        let leaf_row = vec![0.0f64; size2 as usize];
        let path_id_offset = size1;

        let mut rows_l: Vec<Vec<f64>> = Vec::new();
        let mut rows_r: Vec<Vec<f64>> = Vec::new();
        let mut rows_i: Vec<Vec<f64>> = Vec::new();

        for v in 0..size1 {
            let v_in_prel = it1.postl_to_prel[v as usize];
            let is_v_leaf = it1.is_leaf(v_in_prel);
            let parent_v_prel = it1.prel_to_parent[v_in_prel as usize];
            let parent_v_postl = if parent_v_prel != -1 {
                it1.prel_to_postl[parent_v_prel as usize]
            } else {
                -1
            };

            let size_v = it1.prel_to_size[v_in_prel as usize];
            let left_path_v = -(it1.prer_to_prel[(it1.prel_to_prer[v_in_prel as usize] + size_v - 1) as usize] + 1);
            let right_path_v = v_in_prel + size_v - 1 + 1;
            let kr_sum_v = it1.prel_to_kr_sum[v_in_prel as usize];
            let revkr_sum_v = it1.prel_to_rev_kr_sum[v_in_prel as usize];
            let desc_sum_v = it1.prel_to_desc_sum[v_in_prel as usize];

            if is_v_leaf {
                cost1_l[v as usize] = leaf_row.clone();
                cost1_r[v as usize] = leaf_row.clone();
                cost1_i[v as usize] = leaf_row.clone();
                for i in 0..size2 {
                    self.delta[v_in_prel as usize][it2.postl_to_prel[i as usize] as usize] = v_in_prel as f64;
                }
            }

            if parent_v_prel != -1 && cost1_l[parent_v_postl as usize].is_empty() {
                if let (Some(rl), Some(rr), Some(ri)) = (rows_l.pop(), rows_r.pop(), rows_i.pop()) {
                    cost1_l[parent_v_postl as usize] = rl;
                    cost1_r[parent_v_postl as usize] = rr;
                    cost1_i[parent_v_postl as usize] = ri;
                } else {
                    cost1_l[parent_v_postl as usize] = vec![0.0; size2 as usize];
                    cost1_r[parent_v_postl as usize] = vec![0.0; size2 as usize];
                    cost1_i[parent_v_postl as usize] = vec![0.0; size2 as usize];
                }
            }

            cost2_l.fill(0.0);
            cost2_r.fill(0.0);
            cost2_i.fill(0.0);
            cost2_path.fill(0);

            for w in 0..size2 {
                let w_in_prel = it2.postl_to_prel[w as usize];
                let parent_w_prel = it2.prel_to_parent[w_in_prel as usize];
                let parent_w_postl = if parent_w_prel != -1 {
                    it2.prel_to_postl[parent_w_prel as usize]
                } else {
                    -1
                };

                let size_w = it2.prel_to_size[w_in_prel as usize];
                if it2.is_leaf(w_in_prel) {
                    cost2_l[w as usize] = 0.0;
                    cost2_r[w as usize] = 0.0;
                    cost2_i[w as usize] = 0.0;
                    cost2_path[w as usize] = w_in_prel;
                }

                let mut min_cost = f64::MAX;
                let mut strategy_path = -1i32;

                if size_v <= 1 || size_w <= 1 {
                    min_cost = size_v.max(size_w) as f64;
                } else {
                    let mut tmp_cost = size_v as f64 * it2.prel_to_kr_sum[w_in_prel as usize] as f64
                        + cost1_l[v as usize][w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = left_path_v;
                    }
                    tmp_cost = size_v as f64 * it2.prel_to_rev_kr_sum[w_in_prel as usize] as f64
                        + cost1_r[v as usize][w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = right_path_v;
                    }
                    tmp_cost = size_v as f64 * it2.prel_to_desc_sum[w_in_prel as usize] as f64
                        + cost1_i[v as usize][w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = self.delta[v_in_prel as usize][w_in_prel as usize] as i32 + 1;
                    }
                    tmp_cost = size_w as f64 * kr_sum_v as f64 + cost2_l[w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = -(it2.prer_to_prel
                            [(it2.prel_to_prer[w_in_prel as usize] + size_w - 1) as usize]
                            + path_id_offset
                            + 1);
                    }
                    tmp_cost = size_w as f64 * revkr_sum_v as f64 + cost2_r[w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = w_in_prel + size_w - 1 + path_id_offset + 1;
                    }
                    tmp_cost = size_w as f64 * desc_sum_v as f64 + cost2_i[w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = cost2_path[w as usize] + path_id_offset + 1;
                    }
                }

                if parent_v_prel != -1 {
                    cost1_r[parent_v_postl as usize][w as usize] += min_cost;
                    let tmp_cost = -min_cost + cost1_i[v as usize][w as usize];
                    if tmp_cost < cost1_i[parent_v_postl as usize][w as usize] {
                        cost1_i[parent_v_postl as usize][w as usize] = tmp_cost;
                        self.delta[parent_v_prel as usize][w_in_prel as usize] =
                            self.delta[v_in_prel as usize][w_in_prel as usize];
                    }
                    if it1.prel_to_type_right[v_in_prel as usize] {
                        let r = cost1_r[parent_v_postl as usize][w as usize];
                        cost1_i[parent_v_postl as usize][w as usize] += r;
                        cost1_r[parent_v_postl as usize][w as usize] += cost1_r[v as usize][w as usize] - min_cost;
                    }
                    if it1.prel_to_type_left[v_in_prel as usize] {
                        cost1_l[parent_v_postl as usize][w as usize] += cost1_l[v as usize][w as usize];
                    } else {
                        cost1_l[parent_v_postl as usize][w as usize] += min_cost;
                    }
                }
                if parent_w_prel != -1 {
                    cost2_r[parent_w_postl as usize] += min_cost;
                    let tmp_cost = -min_cost + cost2_i[w as usize];
                    if tmp_cost < cost2_i[parent_w_postl as usize] {
                        cost2_i[parent_w_postl as usize] = tmp_cost;
                        cost2_path[parent_w_postl as usize] = cost2_path[w as usize];
                    }
                    if it2.prel_to_type_right[w_in_prel as usize] {
                        let r = cost2_r[parent_w_postl as usize];
                        cost2_i[parent_w_postl as usize] += r;
                        cost2_r[parent_w_postl as usize] += cost2_r[w as usize] - min_cost;
                    }
                    if it2.prel_to_type_left[w_in_prel as usize] {
                        cost2_l[parent_w_postl as usize] += cost2_l[w as usize];
                    } else {
                        cost2_l[parent_w_postl as usize] += min_cost;
                    }
                }
                self.delta[v_in_prel as usize][w_in_prel as usize] = strategy_path as f64;
            }

            if !it1.is_leaf(v_in_prel) {
                cost1_l[v as usize].fill(0.0);
                cost1_r[v as usize].fill(0.0);
                cost1_i[v as usize].fill(0.0);
                rows_l.push(std::mem::take(&mut cost1_l[v as usize]));
                rows_r.push(std::mem::take(&mut cost1_r[v as usize]));
                rows_i.push(std::mem::take(&mut cost1_i[v as usize]));
            }
        }
    }

    fn compute_opt_strategy_post_r(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>) {
        let size1 = it1.tree_size as i32;
        let size2 = it2.tree_size as i32;

        self.delta = vec![vec![0.0; size2 as usize]; size1 as usize];

        let mut cost1_l: Vec<Vec<f64>> = vec![Vec::new(); size1 as usize];
        let mut cost1_r: Vec<Vec<f64>> = vec![Vec::new(); size1 as usize];
        let mut cost1_i: Vec<Vec<f64>> = vec![Vec::new(); size1 as usize];
        let mut cost2_l = vec![0.0f64; size2 as usize];
        let mut cost2_r = vec![0.0f64; size2 as usize];
        let mut cost2_i = vec![0.0f64; size2 as usize];
        let mut cost2_path = vec![0i32; size2 as usize];
        let leaf_row = vec![0.0f64; size2 as usize];
        let path_id_offset = size1;

        let mut rows_l: Vec<Vec<f64>> = Vec::new();
        let mut rows_r: Vec<Vec<f64>> = Vec::new();
        let mut rows_i: Vec<Vec<f64>> = Vec::new();

        for v in (0..size1).rev() {
            let is_v_leaf = it1.is_leaf(v);
            let parent_v = it1.prel_to_parent[v as usize];

            let size_v = it1.prel_to_size[v as usize];
            let left_path_v = -(it1.prer_to_prel[(it1.prel_to_prer[v as usize] + size_v - 1) as usize] + 1);
            let right_path_v = v + size_v - 1 + 1;
            let kr_sum_v = it1.prel_to_kr_sum[v as usize];
            let revkr_sum_v = it1.prel_to_rev_kr_sum[v as usize];
            let desc_sum_v = it1.prel_to_desc_sum[v as usize];

            if is_v_leaf {
                cost1_l[v as usize] = leaf_row.clone();
                cost1_r[v as usize] = leaf_row.clone();
                cost1_i[v as usize] = leaf_row.clone();
                for i in 0..size2 {
                    self.delta[v as usize][i as usize] = v as f64;
                }
            }

            if parent_v != -1 && cost1_l[parent_v as usize].is_empty() {
                if let (Some(rl), Some(rr), Some(ri)) = (rows_l.pop(), rows_r.pop(), rows_i.pop()) {
                    cost1_l[parent_v as usize] = rl;
                    cost1_r[parent_v as usize] = rr;
                    cost1_i[parent_v as usize] = ri;
                } else {
                    cost1_l[parent_v as usize] = vec![0.0; size2 as usize];
                    cost1_r[parent_v as usize] = vec![0.0; size2 as usize];
                    cost1_i[parent_v as usize] = vec![0.0; size2 as usize];
                }
            }

            cost2_l.fill(0.0);
            cost2_r.fill(0.0);
            cost2_i.fill(0.0);
            cost2_path.fill(0);

            for w in (0..size2).rev() {
                let size_w = it2.prel_to_size[w as usize];
                if it2.is_leaf(w) {
                    cost2_l[w as usize] = 0.0;
                    cost2_r[w as usize] = 0.0;
                    cost2_i[w as usize] = 0.0;
                    cost2_path[w as usize] = w;
                }

                let mut min_cost = f64::MAX;
                let mut strategy_path = -1i32;

                if size_v <= 1 || size_w <= 1 {
                    min_cost = size_v.max(size_w) as f64;
                } else {
                    let mut tmp_cost =
                        size_v as f64 * it2.prel_to_kr_sum[w as usize] as f64 + cost1_l[v as usize][w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = left_path_v;
                    }
                    tmp_cost =
                        size_v as f64 * it2.prel_to_rev_kr_sum[w as usize] as f64 + cost1_r[v as usize][w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = right_path_v;
                    }
                    tmp_cost =
                        size_v as f64 * it2.prel_to_desc_sum[w as usize] as f64 + cost1_i[v as usize][w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = self.delta[v as usize][w as usize] as i32 + 1;
                    }
                    tmp_cost = size_w as f64 * kr_sum_v as f64 + cost2_l[w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path =
                            -(it2.prer_to_prel[(it2.prel_to_prer[w as usize] + size_w - 1) as usize] + path_id_offset + 1);
                    }
                    tmp_cost = size_w as f64 * revkr_sum_v as f64 + cost2_r[w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = w + size_w - 1 + path_id_offset + 1;
                    }
                    tmp_cost = size_w as f64 * desc_sum_v as f64 + cost2_i[w as usize];
                    if tmp_cost < min_cost {
                        min_cost = tmp_cost;
                        strategy_path = cost2_path[w as usize] + path_id_offset + 1;
                    }
                }

                if parent_v != -1 {
                    cost1_l[parent_v as usize][w as usize] += min_cost;
                    let tmp_cost = -min_cost + cost1_i[v as usize][w as usize];
                    if tmp_cost < cost1_i[parent_v as usize][w as usize] {
                        cost1_i[parent_v as usize][w as usize] = tmp_cost;
                        self.delta[parent_v as usize][w as usize] = self.delta[v as usize][w as usize];
                    }
                    if it1.prel_to_type_left[v as usize] {
                        let l = cost1_l[parent_v as usize][w as usize];
                        cost1_i[parent_v as usize][w as usize] += l;
                        cost1_l[parent_v as usize][w as usize] += cost1_l[v as usize][w as usize] - min_cost;
                    }
                    if it1.prel_to_type_right[v as usize] {
                        cost1_r[parent_v as usize][w as usize] += cost1_r[v as usize][w as usize];
                    } else {
                        cost1_r[parent_v as usize][w as usize] += min_cost;
                    }
                }
                let parent_w = it2.prel_to_parent[w as usize];
                if parent_w != -1 {
                    cost2_l[parent_w as usize] += min_cost;
                    let tmp_cost = -min_cost + cost2_i[w as usize];
                    if tmp_cost < cost2_i[parent_w as usize] {
                        cost2_i[parent_w as usize] = tmp_cost;
                        cost2_path[parent_w as usize] = cost2_path[w as usize];
                    }
                    if it2.prel_to_type_left[w as usize] {
                        let l = cost2_l[parent_w as usize];
                        cost2_i[parent_w as usize] += l;
                        cost2_l[parent_w as usize] += cost2_l[w as usize] - min_cost;
                    }
                    if it2.prel_to_type_right[w as usize] {
                        cost2_r[parent_w as usize] += cost2_r[w as usize];
                    } else {
                        cost2_r[parent_w as usize] += min_cost;
                    }
                }
                self.delta[v as usize][w as usize] = strategy_path as f64;
            }

            if !it1.is_leaf(v) {
                cost1_l[v as usize].fill(0.0);
                cost1_r[v as usize].fill(0.0);
                cost1_i[v as usize].fill(0.0);
                rows_l.push(std::mem::take(&mut cost1_l[v as usize]));
                rows_r.push(std::mem::take(&mut cost1_r[v as usize]));
                rows_i.push(std::mem::take(&mut cost1_i[v as usize]));
            }
        }
    }

    fn ted_init(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>) {
        let size1 = it1.tree_size as i32;
        let size2 = it2.tree_size as i32;
        let max_size = size1.max(size2) + 1;

        self.q = vec![0.0; max_size as usize];
        self.fn_arr = vec![-1; (max_size + 1) as usize];
        self.ft_arr = vec![-1; (max_size + 1) as usize];

        for x in 0..size1 {
            let size_x = it1.prel_to_size[x as usize];
            for y in 0..size2 {
                let size_y = it2.prel_to_size[y as usize];
                if size_x == 1 && size_y == 1 {
                    self.delta[x as usize][y as usize] = 0.0;
                } else if size_x == 1 {
                    let label = &it2.prel_to_label[y as usize];
                    self.delta[x as usize][y as usize] =
                        it2.prel_to_sum_ins_cost[y as usize] - self.cost_model.insert(label);
                } else if size_y == 1 {
                    let label = &it1.prel_to_label[x as usize];
                    self.delta[x as usize][y as usize] =
                        it1.prel_to_sum_del_cost[x as usize] - self.cost_model.delete(label);
                }
            }
        }
    }

    // -- driver -------------------------------------------------------------

    fn gted(&mut self, it1: &AptedIndex<L>, it2: &AptedIndex<L>, current1: i32, current2: i32) -> f64 {
        let subtree_size1 = it1.prel_to_size[current1 as usize];
        let subtree_size2 = it2.prel_to_size[current2 as usize];

        if subtree_size1 == 1 || subtree_size2 == 1 {
            return self.spf1(it1, current1, it2, current2);
        }

        let strategy_path_id = self.delta[current1 as usize][current2 as usize] as i32;
        let path_id_offset = it1.tree_size as i32;
        let mut current_path_node = strategy_path_id.abs() - 1;

        if current_path_node < path_id_offset {
            let strategy_path_type =
                Self::get_strategy_path_type(strategy_path_id, path_id_offset, current1, subtree_size1);
            loop {
                let parent = it1.prel_to_parent[current_path_node as usize];
                if parent < current1 {
                    break;
                }
                for &child in it1.prel_to_children[parent as usize].clone().iter() {
                    if child != current_path_node {
                        self.gted(it1, it2, child, current2);
                    }
                }
                current_path_node = parent;
            }

            return match strategy_path_type {
                PathType::Left => self.spf_l(it1, it2, current1, current2, false),
                PathType::Right => self.spf_r(it1, it2, current1, current2, false),
                PathType::Inner => {
                    self.spf_a(it1, it2, current1, current2, strategy_path_id.abs() - 1, strategy_path_type, false)
                }
            };
        }

        current_path_node -= path_id_offset;
        let strategy_path_type =
            Self::get_strategy_path_type(strategy_path_id, path_id_offset, current2, subtree_size2);
        loop {
            let parent = it2.prel_to_parent[current_path_node as usize];
            if parent < current2 {
                break;
            }
            for &child in it2.prel_to_children[parent as usize].clone().iter() {
                if child != current_path_node {
                    self.gted(it1, it2, current1, child);
                }
            }
            current_path_node = parent;
        }

        match strategy_path_type {
            PathType::Left => self.spf_l(it2, it1, current2, current1, true),
            PathType::Right => self.spf_r(it2, it1, current2, current1, true),
            PathType::Inner => self.spf_a(
                it2,
                it1,
                current2,
                current1,
                strategy_path_id.abs() - path_id_offset - 1,
                strategy_path_type,
                true,
            ),
        }
    }
}

fn update_fn_array(fn_arr: &mut [i32], ln_for_node: i32, node: i32, current_subtree_prel: i32) {
    let sentinel = fn_arr.len() - 1;
    if ln_for_node >= current_subtree_prel {
        fn_arr[node as usize] = fn_arr[ln_for_node as usize];
        fn_arr[ln_for_node as usize] = node;
    } else {
        fn_arr[node as usize] = fn_arr[sentinel];
        fn_arr[sentinel] = node;
    }
}

fn update_ft_array(fn_arr: &mut [i32], ft_arr: &mut [i32], ln_for_node: i32, node: i32) {
    ft_arr[node as usize] = ln_for_node;
    if fn_arr[node as usize] > -1 {
        ft_arr[fn_arr[node as usize] as usize] = node;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::UnitCostModel;
    use crate::parsing::{parse_tree, LabelDict};

    fn ted(t1: &str, t2: &str) -> f64 {
        let mut ld = LabelDict::new();
        let tree1 = parse_tree(t1, &mut ld).unwrap();
        let tree2 = parse_tree(t2, &mut ld).unwrap();
        let idx1 = AptedIndex::build(&tree1, &UnitCostModel).unwrap();
        let idx2 = AptedIndex::build(&tree2, &UnitCostModel).unwrap();
        let mut apted = Apted::new(&UnitCostModel);
        apted.compute_edit_distance(&idx1, &idx2)
    }

    #[test]
    fn test_identical_trees_have_zero_distance() {
        assert_eq!(ted("{a{b}{c}}", "{a{b}{c}}"), 0.0);
    }

    #[test]
    fn test_single_label_swap() {
        assert_eq!(ted("{a}", "{b}"), 1.0);
    }

    #[test]
    fn test_sibling_reorder() {
        assert_eq!(ted("{a{b}{c}}", "{a{c}{b}}"), 2.0);
    }

    #[test]
    fn test_depth_shift() {
        assert_eq!(ted("{a{b{d}}{c}}", "{a{b}{c{d}}}"), 2.0);
    }

    #[test]
    fn test_heavy_path_example() {
        assert_eq!(ted("{f{d{a}{c{b}}}{e}}", "{f{c{d{a}{b}}}{e}}"), 2.0);
    }

    #[test]
    fn test_single_node_against_chain() {
        assert_eq!(ted("{a}", "{a{b{c{d{e}}}}}"), 4.0);
    }

    #[test]
    fn test_delete_everything_equals_sum_of_delete_costs() {
        let mut ld = LabelDict::new();
        let t1 = parse_tree("{a{b}{c{d}}}", &mut ld).unwrap();
        let t2 = parse_tree("{z}", &mut ld).unwrap();
        let idx1 = AptedIndex::build(&t1, &UnitCostModel).unwrap();
        let idx2 = AptedIndex::build(&t2, &UnitCostModel).unwrap();
        let mut apted = Apted::new(&UnitCostModel);
        // distance to a single differently-labeled node is (n-1) deletes + 1 rename
        assert_eq!(apted.compute_edit_distance(&idx1, &idx2), idx1.tree_size as f64);
    }

    #[test]
    fn test_symmetry_under_unit_cost() {
        let forward = ted("{a{b}{c{d}}}", "{a{c{d}}{b}}");
        let backward = ted("{a{c{d}}{b}}", "{a{b}{c{d}}}");
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_adding_one_leaf_increases_distance_by_one() {
        let base = ted("{a{b}{c}}", "{a{b}{c}}");
        let with_leaf = ted("{a{b}{c}}", "{a{b}{c}{d}}");
        assert_eq!(with_leaf - base, 1.0);
    }
}
