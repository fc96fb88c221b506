//! Constant-time lowest-common-ancestor queries over a suffix tree,
//! after "The LCA Problem Revisited" (Bender & Farach-Colton 2000).
//!
//! Three layers stack up to the O(1) query: the depths of an Euler tour
//! of the tree form a ±1 array; the array is cut into ⌈log₂(n)/2⌉-sized
//! blocks whose minima go into a sparse table; and within-block queries
//! hit fully tabulated answers shared by every block of the same ±1
//! shape.

pub mod euler_tour;
pub mod normalized_blocks;
pub mod sparse_table;
pub mod tour_partition;

use std::cell::RefCell;

use debug_print::debug_println;

use crate::error::Error;
use crate::suffix_tree::{NodeId, SuffixTree};

use euler_tour::EulerTour;
use normalized_blocks::BlockRmqDatabase;
use sparse_table::SparseTable;
use tour_partition::TourPartition;

/// A suffix tree packaged with the structures for O(1) LCA lookups.
pub struct LcaSuffixTree {
    tree: SuffixTree,
    tour: EulerTour,
    partition: TourPartition,
    block_sparse_table: SparseTable,
    // Block tables materialize on first contact with their signature;
    // queries stay `&self`.
    block_rmq_db: RefCell<BlockRmqDatabase>,
}

impl LcaSuffixTree {
    pub fn new(text: &[u8]) -> Result<LcaSuffixTree, Error> {
        let tree = SuffixTree::new(text)?;
        let tour = EulerTour::new(&tree);
        let partition = TourPartition::new(tour.depths())?;
        let block_sparse_table = SparseTable::new(partition.block_minima())?;
        let block_rmq_db = BlockRmqDatabase::new(partition.block_length())?;
        debug_println!(
            "lca structure: tour of {} over {} blocks of {}",
            tour.len(),
            partition.num_blocks(),
            partition.block_length()
        );
        Ok(LcaSuffixTree {
            tree,
            tour,
            partition,
            block_sparse_table,
            block_rmq_db: RefCell::new(block_rmq_db),
        })
    }

    /// The underlying suffix tree.
    pub fn tree(&self) -> &SuffixTree {
        &self.tree
    }

    /// Lowest common ancestor of two nodes, in constant time.
    ///
    /// The LCA is the shallowest node between the two nodes' first tour
    /// positions. Its depth is found among three candidates: the tail of
    /// the first node's block, the head of the second node's block, and
    /// the sparse-table minimum of the whole blocks strictly between.
    pub fn lca(&self, node1: NodeId, node2: NodeId) -> Result<NodeId, Error> {
        let tour_pos_1 = self.tour.first_instance(self.tree.node_index(node1));
        let tour_pos_2 = self.tour.first_instance(self.tree.node_index(node2));
        let start_pos = tour_pos_1.min(tour_pos_2);
        let end_pos = tour_pos_1.max(tour_pos_2);

        let block_index_1 = self.partition.block_index(start_pos);
        let block_index_2 = self.partition.block_index(end_pos);
        let pos_in_block_1 = self.partition.pos_in_block(start_pos);
        let pos_in_block_2 = self.partition.pos_in_block(end_pos);

        let depths = self.tour.depths();
        let block_1 = self.partition.block(depths, block_index_1);
        let block_2 = self.partition.block(depths, block_index_2);
        let block_length = self.partition.block_length();

        let mut db = self.block_rmq_db.borrow_mut();

        let pos_of_min_depth = if block_index_1 == block_index_2 {
            let min_pos = db.lookup(block_1, pos_in_block_1, pos_in_block_2 + 1)?;
            block_index_1 * block_length + min_pos
        } else {
            // From the first position to its block's end, and from the
            // second block's start to the second position.
            let min_pos_1 = db.lookup(block_1, pos_in_block_1, block_1.len())?;
            let min_pos_2 = db.lookup(block_2, 0, pos_in_block_2 + 1)?;
            let min_depth_1 = block_1[min_pos_1];
            let min_depth_2 = block_2[min_pos_2];

            let (between_pos, between_depth) = if block_index_2 > block_index_1 + 1 {
                let between_block = self.block_sparse_table.lookup(
                    self.partition.block_minima(),
                    block_index_1 + 1,
                    block_index_2,
                )?;
                let pos = between_block * block_length
                    + self.partition.minima_positions()[between_block];
                (pos, depths[pos])
            } else {
                (usize::MAX, usize::MAX)
            };

            if min_depth_1 <= between_depth && min_depth_1 <= min_depth_2 {
                block_index_1 * block_length + min_pos_1
            } else if min_depth_2 <= between_depth && min_depth_2 <= min_depth_1 {
                block_index_2 * block_length + min_pos_2
            } else {
                between_pos
            }
        };

        Ok(self.tour.nodes()[pos_of_min_depth])
    }

    /// LCA by walking both nodes up to the root; the reference the O(1)
    /// lookup is checked against.
    fn lca_by_walking(&self, node1: NodeId, node2: NodeId) -> NodeId {
        let mut chain = Vec::new();
        let mut current = Some(node1);
        while let Some(node) = current {
            chain.push(node);
            current = self.tree.parent(node);
        }
        let mut current = Some(node2);
        while let Some(node) = current {
            if chain.contains(&node) {
                return node;
            }
            current = self.tree.parent(node);
        }
        self.tree.root()
    }

    /// Self-check: O(1) answers must match the walking reference for
    /// every pair of nodes.
    pub fn verify_lca(&self) -> Result<(), Error> {
        let node_array = self.tree.node_array();
        for &node1 in &node_array {
            for &node2 in &node_array {
                let fast = self.lca(node1, node2)?;
                let slow = self.lca_by_walking(node1, node2);
                if fast != slow {
                    return Err(Error::invariant(format!(
                        "lca of nodes {} and {} should be {} but was {}",
                        self.tree.node_index(node1),
                        self.tree.node_index(node2),
                        self.tree.node_index(slow),
                        self.tree.node_index(fast)
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn banana_lca_pairs() {
        let tree = LcaSuffixTree::new(b"BANANA").unwrap();
        let nodes = tree.tree().node_array();
        let by_index = |i: usize| nodes[i];

        for ((a, b), expected) in [((9, 7), 7), ((7, 9), 7), ((4, 6), 2), ((8, 5), 0)] {
            let lca = tree.lca(by_index(a), by_index(b)).unwrap();
            assert_eq!(tree.tree().node_index(lca), expected);
        }
    }

    #[test]
    fn lca_of_a_node_with_itself() {
        let tree = LcaSuffixTree::new(b"MISSISSIPPI").unwrap();
        for node in tree.tree().node_array() {
            assert_eq!(tree.lca(node, node).unwrap(), node);
        }
    }

    #[test]
    fn lca_with_the_root_is_the_root() {
        let tree = LcaSuffixTree::new(b"MISSISSIPPI").unwrap();
        let root = tree.tree().root();
        for node in tree.tree().node_array() {
            assert_eq!(tree.lca(root, node).unwrap(), root);
            assert_eq!(tree.lca(node, root).unwrap(), root);
        }
    }

    #[test]
    fn all_pairs_match_the_walking_reference() {
        for text in ["BANANA", "MISSISSIPPI", "AAAAAAAAAA", "ABCDEFG"] {
            let tree = LcaSuffixTree::new(text.as_bytes()).unwrap();
            tree.verify_lca().unwrap();
        }
    }

    #[test]
    fn euler_structures_verify_together() {
        let tree = LcaSuffixTree::new(b"ABRACADABRA").unwrap();
        tree.tour.verify(&tree.tree).unwrap();
        tree.partition.verify(tree.tour.depths()).unwrap();
        tree.block_sparse_table.verify(tree.partition.block_minima()).unwrap();
        tree.block_rmq_db.borrow_mut().verify().unwrap();
    }

    #[test]
    fn random_trees_verify_lca() {
        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let len = rng.gen_range(1..40);
            let text: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let tree = LcaSuffixTree::new(&text).unwrap();
            tree.verify_lca().unwrap();
        }
    }
}
