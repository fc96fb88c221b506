use crate::error::Error;
use crate::suffix_tree::{NodeId, SuffixTree};

/// Euler tour of a suffix tree: the node sequence of a depth-first
/// traversal that records a node on arrival and again after returning
/// from each child, the node depths along it, and the position of each
/// node's first appearance.
pub struct EulerTour {
    nodes: Vec<NodeId>,
    depths: Vec<usize>,
    first_instances: Vec<usize>,
    num_nodes: usize,
}

impl EulerTour {
    pub fn new(tree: &SuffixTree) -> EulerTour {
        let num_nodes = tree.num_nodes();
        let length = 2 * num_nodes - 1;
        let mut nodes = Vec::with_capacity(length);
        let mut depths = Vec::with_capacity(length);
        // Position 0 doubles as "not seen yet"; only the root may keep it.
        let mut first_instances = vec![0; num_nodes];

        tree.euler_walk(
            tree.root(),
            &mut |tree, node, depth: usize| {
                let index = tree.node_index(node);
                if first_instances[index] == 0 && node != tree.root() {
                    first_instances[index] = nodes.len();
                }
                nodes.push(node);
                depths.push(depth);
                depth + 1
            },
            0,
        );
        debug_assert_eq!(nodes.len(), length);

        EulerTour { nodes, depths, first_instances, num_nodes }
    }

    /// Tour length, `2 * num_nodes - 1`.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    /// First tour position of the node with the given preorder label.
    pub fn first_instance(&self, node_index: usize) -> usize {
        self.first_instances[node_index]
    }

    /// Self-check of the tour invariants.
    pub fn verify(&self, tree: &SuffixTree) -> Result<(), Error> {
        for i in 0..self.depths.len() - 1 {
            if self.depths[i].abs_diff(self.depths[i + 1]) != 1 {
                return Err(Error::invariant(format!(
                    "consecutive tour depths at {i} do not differ by one"
                )));
            }
        }

        let root = tree.root();
        if self.nodes[0] != root {
            return Err(Error::invariant("first tour element is not the root"));
        }
        if *self.nodes.last().unwrap() != root {
            return Err(Error::invariant("last tour element is not the root"));
        }

        // A node sandwiched between two visits of its parent is a leaf,
        // and the tree has one leaf per suffix.
        let leaf_count = (0..self.nodes.len() - 2)
            .filter(|&i| self.nodes[i] == self.nodes[i + 2])
            .count();
        if leaf_count != tree.string_length() {
            return Err(Error::invariant(format!(
                "tour shows {leaf_count} leaves for a string of length {}",
                tree.string_length()
            )));
        }

        // Labels are handed out in visit order, so first instances grow
        // strictly; entry 0 alone is pinned to the root at position 0.
        for i in 1..self.num_nodes {
            if self.first_instances[i] <= self.first_instances[i - 1] {
                return Err(Error::invariant(format!(
                    "first instances are not increasing at node {i}"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for EulerTour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "EulerTour over {} nodes:", self.num_nodes)?;
        for (position, (&node, &depth)) in self.nodes.iter().zip(&self.depths).enumerate() {
            writeln!(f, "  {position}: node {node} at depth {depth}")?;
        }
        writeln!(f, "first instances: {:?}", self.first_instances)
    }
}
