use crate::error::Error;
use crate::suffix_tree::SuffixTree;

use super::augmented_string::AugmentedString;

/// Identifier of a substring equivalence class. Class 0 is reserved for
/// positions with no valid substring.
pub type ClassId = usize;

/// Assigns an id to every suffix start of the tree's text so that two
/// positions share an id iff the first `substr_length` characters of
/// their suffixes are equal.
///
/// One DFS suffices: entering an edge that crosses depth
/// `substr_length` opens a fresh class, and every sufficiently deep
/// leaf below it belongs to that class. For example, "MISSISSIPPI"
/// with length 3:
///
/// ```text
///     M I S S I S S I P P I
///     1 2 3 4 2 3 5 6 7 0 0
/// ```
///
/// The id values depend on traversal order; only equality between them
/// is meaningful.
fn annotate_substr_classes(tree: &SuffixTree, substr_length: usize) -> Vec<ClassId> {
    let text_length = tree.string_length();
    let mut substr_classes = vec![0; text_length - 1];
    let mut class_label = 0;

    tree.walk(
        tree.root(),
        &mut |tree, node, prev_suf_length: usize| {
            if node == tree.root() {
                return 0;
            }
            let current_suf_length = prev_suf_length + tree.edge_length(node);
            if prev_suf_length < substr_length && current_suf_length >= substr_length {
                class_label += 1;
            }
            // The sentinel is part of the leaf depth, hence the -1.
            if tree.is_leaf(node) && current_suf_length - 1 >= substr_length {
                substr_classes[text_length - current_suf_length] = class_label;
            }
            current_suf_length
        },
        0,
    );
    substr_classes
}

/// The two class tables driving the palindrome sweep: for position `i`
/// of the query, `forward(i)` classifies `s[i .. i+L)` and `reverse(i)`
/// classifies the reversal of `s[i-L .. i)`. A forward and a reverse
/// class are equal exactly when the right window is the reversed left
/// window, which is what makes a candidate arm pair.
pub struct EquivClassTable {
    forward_classes: Vec<ClassId>,
    reverse_classes: Vec<ClassId>,
    query_length: usize,
    num_classes: usize,
}

impl EquivClassTable {
    pub fn new(
        augmented_string: &AugmentedString,
        substr_length: usize,
    ) -> Result<EquivClassTable, Error> {
        let query_length = augmented_string.query_length();
        if substr_length == 0 || substr_length > query_length {
            return Err(Error::ArmLengthRange { min_arm: substr_length, len: query_length });
        }

        let substr_classes =
            annotate_substr_classes(augmented_string.tree().tree(), substr_length);

        let valid = query_length - substr_length + 1;
        let mut forward_classes = vec![0; query_length + 1];
        forward_classes[..valid].copy_from_slice(&substr_classes[..valid]);

        // Window i of the reverse half classifies the left window ending
        // at query position n - i.
        let mut reverse_classes = vec![0; query_length + 1];
        for i in 0..valid {
            reverse_classes[query_length - i] = substr_classes[query_length + 1 + i];
        }

        let num_classes = 1 + forward_classes
            .iter()
            .chain(reverse_classes.iter())
            .copied()
            .max()
            .unwrap_or(0);

        Ok(EquivClassTable { forward_classes, reverse_classes, query_length, num_classes })
    }

    /// Class of `s[position .. position+L)`, or 0 past the valid range.
    pub fn forward(&self, position: usize) -> ClassId {
        self.forward_classes[position]
    }

    /// Class of the reversal of `s[position-L .. position)`, or 0 below
    /// the valid range.
    pub fn reverse(&self, position: usize) -> ClassId {
        self.reverse_classes[position]
    }

    /// Total number of class ids, the reserved 0 included.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Self-check against direct substring comparison.
    pub fn verify(&self, query: &[u8], substr_length: usize) -> Result<(), Error> {
        let table_length = self.query_length + 1;
        let forward_window = |i: usize| &query[i..i + substr_length];
        let reverse_window =
            |i: usize| query[i - substr_length..i].iter().rev().copied().collect::<Vec<u8>>();

        for i in 0..table_length {
            if i + substr_length > self.query_length {
                if self.forward_classes[i] != 0 {
                    return Err(Error::invariant(format!(
                        "forward position {i} has no valid window but class {}",
                        self.forward_classes[i]
                    )));
                }
            }
            if i < substr_length {
                if self.reverse_classes[i] != 0 {
                    return Err(Error::invariant(format!(
                        "reverse position {i} has no valid window but class {}",
                        self.reverse_classes[i]
                    )));
                }
            }
        }

        for i in (0..table_length).filter(|i| i + substr_length <= self.query_length) {
            for j in (0..table_length).filter(|j| j + substr_length <= self.query_length) {
                let same_substr = forward_window(i) == forward_window(j);
                let same_id = self.forward_classes[i] == self.forward_classes[j];
                if same_substr != same_id {
                    return Err(Error::invariant(format!(
                        "forward/forward mismatch at positions {i} and {j}"
                    )));
                }
            }
            for j in (0..table_length).filter(|&j| j >= substr_length) {
                let same_substr = forward_window(i) == reverse_window(j).as_slice();
                let same_id = self.forward_classes[i] == self.reverse_classes[j];
                if same_substr != same_id {
                    return Err(Error::invariant(format!(
                        "forward/reverse mismatch at positions {i} and {j}"
                    )));
                }
            }
        }

        for i in (0..table_length).filter(|&i| i >= substr_length) {
            for j in (0..table_length).filter(|&j| j >= substr_length) {
                let same_substr = reverse_window(i) == reverse_window(j);
                let same_id = self.reverse_classes[i] == self.reverse_classes[j];
                if same_substr != same_id {
                    return Err(Error::invariant(format!(
                        "reverse/reverse mismatch at positions {i} and {j}"
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

    fn table_for(text: &[u8], substr_length: usize) -> EquivClassTable {
        let augmented = AugmentedString::new(text).unwrap();
        EquivClassTable::new(&augmented, substr_length).unwrap()
    }

    #[test]
    fn mississippi_substring_classes() {
        // The annotation works on any suffix tree, augmented or not.
        let tree = SuffixTree::new(b"MISSISSIPPI").unwrap();
        let classes = annotate_substr_classes(&tree, 3);

        // ISS at 1 and 4, SSI at 2 and 5.
        assert_eq!(classes[1], classes[4]);
        assert_eq!(classes[2], classes[5]);
        assert_ne!(classes[1], classes[2]);
        assert_ne!(classes[0], classes[1]);
        // No length-3 window starts this close to the end.
        assert_eq!(classes[9], 0);
        assert_eq!(classes[10], 0);
        // Everything further left has one.
        assert!(classes[..9].iter().all(|&class| class != 0));
    }

    #[test]
    fn banana_tables_match_the_worked_example() {
        let table = table_for(b"BANANA", 3);

        // ANA forward at 1 and 3, and backward at 4 and 6.
        assert_eq!(table.forward(1), table.forward(3));
        assert_eq!(table.forward(1), table.reverse(4));
        assert_eq!(table.forward(1), table.reverse(6));
        // NAN reads the same both ways.
        assert_eq!(table.forward(2), table.reverse(5));
        // BAN only occurs forward, NAB only backward.
        assert_ne!(table.forward(0), table.reverse(3));

        for i in 4..=6 {
            assert_eq!(table.forward(i), 0);
        }
        for i in 0..=2 {
            assert_eq!(table.reverse(i), 0);
        }

        table.verify(b"BANANA", 3).unwrap();
    }

    #[test]
    fn class_zero_is_reserved_for_invalid_windows() {
        let table = table_for(b"ABCD", 2);
        assert_eq!(table.forward(3), 0);
        assert_eq!(table.forward(4), 0);
        assert_eq!(table.reverse(0), 0);
        assert_eq!(table.reverse(1), 0);
        assert!(table.forward(0) != 0 && table.reverse(2) != 0);
    }

    #[test]
    fn num_classes_bounds_every_id() {
        let table = table_for(b"MISSISSIPPI", 3);
        for i in 0..=11 {
            assert!(table.forward(i) < table.num_classes());
            assert!(table.reverse(i) < table.num_classes());
        }
    }

    #[test]
    fn arm_length_bounds_are_checked() {
        let augmented = AugmentedString::new(b"ABC").unwrap();
        assert!(matches!(
            EquivClassTable::new(&augmented, 0),
            Err(Error::ArmLengthRange { min_arm: 0, len: 3 })
        ));
        assert!(matches!(
            EquivClassTable::new(&augmented, 4),
            Err(Error::ArmLengthRange { min_arm: 4, len: 3 })
        ));
    }

    #[test]
    fn random_tables_verify() {
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let len = rng.gen_range(3..30);
            let text: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let substr_length = rng.gen_range(1..=len.min(5));
            let table = table_for(&text, substr_length);
            table.verify(&text, substr_length).unwrap();
        }
    }
}
