//! Length-constrained gapped palindrome search.
//!
//! Finds every maximal pair of reverse-equal arms around a bounded gap
//! in a byte string, in time linear in the text plus the output, using
//! the algorithm of Kolpakov & Kucherov ("Searching for gapped
//! palindromes", https://doi.org/10.1016/j.tcs.2009.09.013). The
//! index machinery it runs on — an Ukkonen suffix tree and a
//! Bender–Farach-Colton constant-time LCA structure — is exposed for
//! use on its own.
//!
//! ```
//! use palgap::{find_palindromes, SearchParams};
//!
//! let found = find_palindromes(b"MADAMIBCDEMADAM", SearchParams::new(3, 2, 5)).unwrap();
//! assert!(found.iter().any(|p| p.arm_len() == 5));
//! ```

pub mod error;
pub mod gapped;
pub mod lca;
pub mod manacher;
pub mod suffix_tree;

pub use error::Error;
pub use gapped::augmented_string::AugmentedString;
pub use gapped::equiv_class::{ClassId, EquivClassTable};
pub use gapped::equiv_class_array::{EquivClassArray, ItemId};
pub use gapped::{find_palindromes, for_each_palindrome, Palindrome, SearchParams};
pub use lca::LcaSuffixTree;
pub use suffix_tree::{NodeId, SuffixTree};
