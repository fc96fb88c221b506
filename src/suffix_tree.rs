use debug_print::debug_println;
use slab::Slab;

use crate::error::Error;

/// Index of a node in the tree's arena.
pub type NodeId = usize;

/// Byte appended to every input so that each suffix ends at a leaf.
pub const SENTINEL: u8 = b'$';

/// A suffix-tree node. Nodes live in the tree's arena and reference each
/// other by [`NodeId`]; siblings form a doubly-linked list kept in
/// insertion order.
#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    /// Construction-time link to the node spelling this node's longest
    /// proper suffix.
    suffix_link: Option<NodeId>,
    /// Start of one suffix whose path runs through this node.
    path_position: usize,
    /// First index of the incoming edge label.
    edge_start: usize,
    /// Last index of the incoming edge label. Ignored for leaves, whose
    /// edges end at the tree's open end.
    edge_end: usize,
    /// Preorder label assigned after construction; root is 0.
    index: usize,
    /// Number of characters on the path from the root to this node.
    edge_depth: usize,
}

/// Suffix tree over `text · $`, built online with Ukkonen's algorithm
/// ("On-line construction of suffix-trees", Ukkonen 1995).
///
/// Edge labels are index pairs into the tree's copy of the text. Leaf
/// edges share the single open end that advances once per phase, and
/// the skip/count trick is used when rewalking after a suffix link.
pub struct SuffixTree {
    text: Vec<u8>,
    nodes: Slab<Node>,
    root: NodeId,
    /// Inclusive index of the last character currently on every leaf edge.
    end: usize,
    num_nodes: usize,
}

/// Where an extension starts: a node and an offset into its incoming edge.
#[derive(Clone, Copy)]
struct ActivePoint {
    node: NodeId,
    edge_pos: usize,
}

/// Mutable construction state threaded through the phases.
struct Ukkonen {
    pos: ActivePoint,
    /// The at-most-one internal node still waiting for its suffix link.
    suffixless: Option<NodeId>,
    extension: usize,
    repeated_extension: bool,
}

impl SuffixTree {
    /// Builds the suffix tree of `text`. The input must not contain the
    /// reserved sentinel byte `$`.
    pub fn new(text: &[u8]) -> Result<SuffixTree, Error> {
        if let Some(position) = text.iter().position(|&b| b == SENTINEL) {
            return Err(Error::SentinelInInput { byte: SENTINEL, position });
        }

        let mut owned = Vec::with_capacity(text.len() + 1);
        owned.extend_from_slice(text);
        owned.push(SENTINEL);

        let mut nodes = Slab::with_capacity(2 * owned.len());
        let root = nodes.insert(Node {
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
            suffix_link: None,
            path_position: 0,
            edge_start: 0,
            edge_end: 0,
            index: 0,
            edge_depth: 0,
        });

        let mut tree = SuffixTree { text: owned, nodes, root, end: 0, num_nodes: 0 };

        // The longest suffix is a child of the root before the first phase.
        let first = tree.alloc_node(Some(root), 0, tree.text.len() - 1, 0);
        tree.nodes[root].first_child = Some(first);

        let mut state = Ukkonen {
            pos: ActivePoint { node: root, edge_pos: 0 },
            suffixless: None,
            extension: 1,
            repeated_extension: false,
        };

        for phase_end in 1..tree.text.len() {
            tree.phase(&mut state, phase_end);
        }

        let mut counter = 0;
        tree.label(root, 0, &mut counter);
        tree.num_nodes = counter;
        debug_println!(
            "suffix tree over {} bytes: {} nodes",
            tree.text.len(),
            tree.num_nodes
        );
        Ok(tree)
    }

    fn alloc_node(
        &mut self,
        parent: Option<NodeId>,
        edge_start: usize,
        edge_end: usize,
        path_position: usize,
    ) -> NodeId {
        self.nodes.insert(Node {
            parent,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
            suffix_link: None,
            path_position,
            edge_start,
            edge_end,
            index: 0,
            edge_depth: 0,
        })
    }

    /// One phase of Ukkonen's algorithm: advance the open end, then run
    /// explicit extensions until the phase completes or rule 3 stops it.
    fn phase(&mut self, state: &mut Ukkonen, phase_end: usize) {
        // Leaves trick: every leaf grows by one character at once.
        self.end = phase_end;

        while state.extension <= phase_end {
            let begin = state.extension;
            let rule_3 = self.extend(state, begin, phase_end);
            if rule_3 {
                // The same extension repeats first in the next phase and
                // must not follow a suffix link then.
                state.repeated_extension = true;
                break;
            }
            state.repeated_extension = false;
            state.extension += 1;
        }
    }

    /// A single explicit extension of `text[begin..=end]`. Returns true
    /// if rule 3 applied (the string was already present).
    fn extend(&mut self, state: &mut Ukkonen, begin: usize, end: usize) -> bool {
        let path_position = begin;
        let mut begin = begin;
        let chars_found;

        if !state.repeated_extension {
            self.follow_suffix_link(&mut state.pos);
        }

        if state.pos.node == self.root {
            // Trace the whole extension string from the root.
            let (node, edge_pos, found) = self.trace_string(self.root, begin, end, false);
            state.pos.node = node;
            state.pos.edge_pos = edge_pos;
            chars_found = found;
        } else {
            // Everything but the last character is already in place;
            // try to match just that character from the current point.
            begin = end;
            if self.is_last_char_in_edge(state.pos.node, state.pos.edge_pos) {
                match self.find_child(state.pos.node, self.text[end]) {
                    Some(child) => {
                        state.pos.node = child;
                        state.pos.edge_pos = 0;
                        chars_found = 1;
                    }
                    None => chars_found = 0,
                }
            } else {
                let next = self.nodes[state.pos.node].edge_start + state.pos.edge_pos + 1;
                if self.text[next] == self.text[end] {
                    state.pos.edge_pos += 1;
                    chars_found = 1;
                } else {
                    chars_found = 0;
                }
            }
        }

        if chars_found == end - begin + 1 {
            // Rule 3: already present. Backfill the pending suffix link.
            if let Some(waiting) = state.suffixless.take() {
                let parent = self.nodes[state.pos.node].parent;
                self.nodes[waiting].suffix_link = parent;
            }
            return true;
        }

        if self.is_last_char_in_edge(state.pos.node, state.pos.edge_pos)
            || state.pos.node == self.root
        {
            // Rule 2, new child: the point sits on a node boundary.
            if self.nodes[state.pos.node].first_child.is_some() {
                self.add_leaf_child(state.pos.node, begin + chars_found, end, path_position);
                if let Some(waiting) = state.suffixless.take() {
                    self.nodes[waiting].suffix_link = Some(state.pos.node);
                }
            }
        } else {
            // Rule 2, split: the point is inside an edge.
            let internal =
                self.split_edge(state.pos.node, begin + chars_found, end, path_position, state.pos.edge_pos);
            if let Some(waiting) = state.suffixless {
                self.nodes[waiting].suffix_link = Some(internal);
            }
            if self.label_length(internal) == 1 && self.nodes[internal].parent == Some(self.root) {
                // Single-character children of the root link to the root.
                self.nodes[internal].suffix_link = Some(self.root);
                state.suffixless = None;
            } else {
                state.suffixless = Some(internal);
            }
            state.pos.node = internal;
        }
        false
    }

    /// Appends a new leaf as the last child of `node`.
    fn add_leaf_child(
        &mut self,
        node: NodeId,
        edge_start: usize,
        edge_end: usize,
        path_position: usize,
    ) -> NodeId {
        let leaf = self.alloc_node(Some(node), edge_start, edge_end, path_position);
        // The caller guarantees at least one existing child.
        let mut last = self.nodes[node].first_child.unwrap();
        while let Some(next) = self.nodes[last].next_sibling {
            last = next;
        }
        self.connect_siblings(Some(last), Some(leaf));
        leaf
    }

    /// Splits `node`'s incoming edge after `edge_pos` matched characters,
    /// attaching a fresh leaf for the extension. Returns the new internal
    /// node, which takes `node`'s place among its siblings.
    fn split_edge(
        &mut self,
        node: NodeId,
        edge_start: usize,
        edge_end: usize,
        path_position: usize,
        edge_pos: usize,
    ) -> NodeId {
        let parent = self.nodes[node].parent;
        let internal = self.alloc_node(
            parent,
            self.nodes[node].edge_start,
            self.nodes[node].edge_start + edge_pos,
            self.nodes[node].path_position,
        );
        self.nodes[node].edge_start += edge_pos + 1;

        let leaf = self.alloc_node(Some(internal), edge_start, edge_end, path_position);

        let prev = self.nodes[node].prev_sibling;
        let next = self.nodes[node].next_sibling;
        self.connect_siblings(prev, Some(internal));
        self.connect_siblings(Some(internal), next);
        self.nodes[node].prev_sibling = None;

        if let Some(parent) = parent {
            if self.nodes[parent].first_child == Some(node) {
                self.nodes[parent].first_child = Some(internal);
            }
        }

        self.nodes[internal].first_child = Some(node);
        self.nodes[node].parent = Some(internal);
        self.connect_siblings(Some(node), Some(leaf));
        internal
    }

    fn connect_siblings(&mut self, left: Option<NodeId>, right: Option<NodeId>) {
        if let Some(left) = left {
            self.nodes[left].next_sibling = right;
        }
        if let Some(right) = right {
            self.nodes[right].prev_sibling = left;
        }
    }

    /// Moves the active point to where the next extension starts, via the
    /// suffix link of the node (or of its parent, rewalking the edge label
    /// with the skip/count trick).
    fn follow_suffix_link(&self, pos: &mut ActivePoint) {
        if pos.node == self.root {
            return;
        }

        let node = &self.nodes[pos.node];
        if node.suffix_link.is_none() || !self.is_last_char_in_edge(pos.node, pos.edge_pos) {
            match node.parent {
                Some(parent) if parent != self.root => {
                    let gamma_begin = node.edge_start;
                    let gamma_end = node.edge_start + pos.edge_pos;
                    // The parent's link exists by Ukkonen's lemma.
                    let link = self.nodes[parent].suffix_link.unwrap();
                    let (node, edge_pos, _) = self.trace_string(link, gamma_begin, gamma_end, true);
                    pos.node = node;
                    pos.edge_pos = edge_pos;
                }
                _ => {
                    // Parent is the root: retrace from the root instead.
                    pos.node = self.root;
                }
            }
        } else {
            let link = node.suffix_link.unwrap();
            pos.node = link;
            pos.edge_pos = self.label_length(link) - 1;
        }
    }

    /// Walks `text[begin..=end]` down from `node`, one edge at a time.
    /// Returns the last node touched, the offset of the last matched
    /// character in its edge, and the number of characters matched.
    fn trace_string(
        &self,
        mut node: NodeId,
        mut begin: usize,
        end: usize,
        skip: bool,
    ) -> (NodeId, usize, usize) {
        let mut chars_found = 0;
        loop {
            let (next, edge_pos, found, done) = self.trace_single_edge(node, begin, end, skip);
            node = next;
            begin += found;
            chars_found += found;
            if done {
                return (node, edge_pos, chars_found);
            }
        }
    }

    /// One step of [`trace_string`]: match as much of `text[begin..=end]`
    /// as fits on a single outgoing edge. With `skip` enabled the edge is
    /// jumped over by length comparison alone (the label is known to match).
    fn trace_single_edge(
        &self,
        node: NodeId,
        begin: usize,
        end: usize,
        skip: bool,
    ) -> (NodeId, usize, usize, bool) {
        let child = match self.find_child(node, self.text[begin]) {
            Some(child) => child,
            // No edge starts with the right character: search is done.
            None => return (node, self.label_length(node) - 1, 0, true),
        };

        let length = self.label_length(child);
        let str_len = end - begin + 1;

        if skip {
            return if length <= str_len {
                (child, length - 1, length, length >= str_len)
            } else {
                (child, str_len - 1, str_len, true)
            };
        }

        let limit = length.min(str_len);
        let edge_start = self.nodes[child].edge_start;
        let mut edge_pos = 1;
        while edge_pos < limit {
            if self.text[edge_start + edge_pos] != self.text[begin + edge_pos] {
                return (child, edge_pos - 1, edge_pos, true);
            }
            edge_pos += 1;
        }
        (child, limit - 1, limit, limit >= str_len)
    }

    /// Child of `node` whose edge label starts with `character`.
    fn find_child(&self, node: NodeId, character: u8) -> Option<NodeId> {
        let mut child = self.nodes[node].first_child;
        while let Some(id) = child {
            if self.text[self.nodes[id].edge_start] == character {
                return Some(id);
            }
            child = self.nodes[id].next_sibling;
        }
        None
    }

    /// Inclusive end index of `node`'s edge label; leaves end at the
    /// tree's open end.
    fn label_end(&self, node: NodeId) -> usize {
        if self.nodes[node].first_child.is_none() {
            self.end
        } else {
            self.nodes[node].edge_end
        }
    }

    /// Character count of `node`'s edge label (the root's placeholder
    /// edge counts as 1, which the extension logic relies on).
    fn label_length(&self, node: NodeId) -> usize {
        self.label_end(node) - self.nodes[node].edge_start + 1
    }

    fn is_last_char_in_edge(&self, node: NodeId, edge_pos: usize) -> bool {
        edge_pos == self.label_length(node) - 1
    }

    /// Preorder labelling pass: assigns `index` and accumulates
    /// `edge_depth` down every path.
    fn label(&mut self, node: NodeId, depth: usize, counter: &mut usize) {
        self.nodes[node].index = *counter;
        self.nodes[node].edge_depth = depth;
        *counter += 1;
        let mut child = self.nodes[node].first_child;
        while let Some(id) = child {
            let child_depth = depth + self.label_length(id);
            self.label(id, child_depth, counter);
            child = self.nodes[id].next_sibling;
        }
    }

    /// Looks `query` up in the tree. Returns the start of one occurrence
    /// in the text if `query` is a substring. The empty query matches at
    /// position 0.
    pub fn find_substring(&self, query: &[u8]) -> Option<usize> {
        if query.is_empty() {
            return Some(0);
        }
        let mut node = self.find_child(self.root, query[0])?;
        let mut j = 0;
        loop {
            let mut k = self.nodes[node].edge_start;
            let label_end = self.label_end(node);
            while j < query.len() && k <= label_end && self.text[k] == query[j] {
                j += 1;
                k += 1;
            }
            if j == query.len() {
                return Some(self.nodes[node].path_position);
            }
            if k > label_end {
                node = self.find_child(node, query[j])?;
            } else {
                return None;
            }
        }
    }

    /// Depth-first traversal. `visit` receives the carry value produced
    /// at the node's parent and returns the carry for its children.
    pub fn walk<T, F>(&self, node: NodeId, visit: &mut F, carry: T)
    where
        T: Copy,
        F: FnMut(&SuffixTree, NodeId, T) -> T,
    {
        let next = visit(self, node, carry);
        let mut child = self.nodes[node].first_child;
        while let Some(id) = child {
            self.walk(id, visit, next);
            child = self.nodes[id].next_sibling;
        }
    }

    /// Like [`walk`](Self::walk), but also revisits the node (with its
    /// original carry value) after returning from each child, producing
    /// the Euler tour of the tree.
    pub fn euler_walk<T, F>(&self, node: NodeId, visit: &mut F, carry: T)
    where
        T: Copy,
        F: FnMut(&SuffixTree, NodeId, T) -> T,
    {
        let next = visit(self, node, carry);
        let mut child = self.nodes[node].first_child;
        while let Some(id) = child {
            self.euler_walk(id, visit, next);
            visit(self, node, carry);
            child = self.nodes[id].next_sibling;
        }
    }

    /// Handles of all nodes, indexed by their preorder label.
    pub fn node_array(&self) -> Vec<NodeId> {
        let mut array = vec![self.root; self.num_nodes];
        self.walk(
            self.root,
            &mut |tree, node, _| {
                array[tree.nodes[node].index] = node;
                0usize
            },
            0usize,
        );
        array
    }

    /// Leaf handle for each suffix start position of the text (the
    /// sentinel-only suffix is omitted).
    pub fn leaf_array(&self) -> Vec<NodeId> {
        let mut map = vec![self.root; self.text.len() - 1];
        self.walk(
            self.root,
            &mut |tree, node, depth: usize| {
                let current = depth + tree.edge_length(node);
                if tree.is_leaf(node) {
                    let suffix_start = tree.text.len() - current;
                    if suffix_start < map.len() {
                        map[suffix_start] = node;
                    }
                }
                current
            },
            0,
        );
        map
    }

    /// Checks a leaf array by walking each leaf back to the root and
    /// comparing the accumulated suffix length with the position.
    pub fn verify_leaf_array(&self, leaf_array: &[NodeId]) -> Result<(), Error> {
        for (position, &leaf) in leaf_array.iter().enumerate() {
            let mut node = leaf;
            let mut suffix_depth = 0;
            while let Some(parent) = self.nodes[node].parent {
                suffix_depth += self.edge_length(node);
                node = parent;
            }
            if position != self.text.len() - suffix_depth {
                return Err(Error::invariant(format!(
                    "leaf at position {position} spells a suffix of length {suffix_depth}"
                )));
            }
        }
        Ok(())
    }

    /// Self-check: every substring of the text must be found where it
    /// actually occurs.
    pub fn verify(&self) -> Result<(), Error> {
        for k in 0..self.text.len() - 1 {
            for j in 0..=k {
                let query = &self.text[j..=k];
                match self.find_substring(query) {
                    Some(i) if self.text.get(i..i + query.len()) == Some(query) => {}
                    Some(i) => {
                        return Err(Error::invariant(format!(
                            "substring ({j}, {k}) found at non-matching position {i}"
                        )))
                    }
                    None => {
                        return Err(Error::invariant(format!("substring ({j}, {k}) not found")))
                    }
                }
            }
        }
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Length of the tree's text, sentinel included.
    pub fn string_length(&self) -> usize {
        self.text.len()
    }

    pub(crate) fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.nodes[node].first_child.is_none()
    }

    /// Character count of `node`'s incoming edge; 0 for the root.
    pub fn edge_length(&self, node: NodeId) -> usize {
        if self.nodes[node].parent.is_none() {
            0
        } else {
            self.label_length(node)
        }
    }

    pub fn child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].first_child
    }

    pub fn sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].next_sibling
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    pub fn node_index(&self, node: NodeId) -> usize {
        self.nodes[node].index
    }

    pub fn edge_depth(&self, node: NodeId) -> usize {
        self.nodes[node].edge_depth
    }

    pub fn path_position(&self, node: NodeId) -> usize {
        self.nodes[node].path_position
    }

    fn fmt_subtree(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        node: NodeId,
        depth: usize,
    ) -> std::fmt::Result {
        if node != self.root {
            for _ in 1..depth {
                write!(f, "|")?;
            }
            let label = &self.text[self.nodes[node].edge_start..=self.label_end(node)];
            writeln!(f, "+{}\t{}", label.escape_ascii(), self.nodes[node].index)?;
        }
        let mut child = self.nodes[node].first_child;
        while let Some(id) = child {
            self.fmt_subtree(f, id, depth + 1)?;
            child = self.nodes[id].next_sibling;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SuffixTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "SuffixTree of \"{}\" ({} nodes)",
            self.text.escape_ascii(),
            self.num_nodes
        )?;
        self.fmt_subtree(f, self.root, 0)
    }
}
