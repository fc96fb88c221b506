//! Enumeration of maximal gapped palindromes with bounded arm and gap
//! lengths, after "Searching for gapped palindromes" (Kolpakov &
//! Kucherov 2009, https://doi.org/10.1016/j.tcs.2009.09.013).
//!
//! A gapped palindrome is a pair of reverse-equal arms around a gap:
//! in `MADAMIBCDEMADAM` the arms `MADAM` ... `MADAM` surround the gap
//! `IBCDE`. The sweep classifies every length-L window of the query by
//! an integer id (equal ids ⇔ equal windows), walks the text once, and
//! pairs each right-arm window with the stored left-arm windows of the
//! same class inside the gap bounds. A matching pair is extended to its
//! maximal arm length with one LCA query on the augmented suffix tree.

pub mod augmented_string;
pub mod equiv_class;
pub mod equiv_class_array;

use std::ops::ControlFlow;

use derive_new::new;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::suffix_tree::SENTINEL;

use augmented_string::{AugmentedString, SEPARATOR};
use equiv_class::EquivClassTable;
use equiv_class_array::EquivClassArray;

/// One maximal gapped palindrome: `text[left_start..left_end]` read
/// backward equals `text[right_start..right_end]`, and the gap is the
/// region between the arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Palindrome {
    pub left_start: usize,
    pub left_end: usize,
    pub right_start: usize,
    pub right_end: usize,
}

impl Palindrome {
    pub fn arm_len(&self) -> usize {
        self.left_end - self.left_start
    }

    pub fn gap_len(&self) -> usize {
        self.right_start - self.left_end
    }
}

/// Bounds for the palindrome search: arms of at least `min_arm`
/// characters around a gap of `min_gap` to `max_gap` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchParams {
    pub min_arm: usize,
    pub min_gap: usize,
    pub max_gap: usize,
}

/// Collects every maximal gapped palindrome of `text` within `params`.
pub fn find_palindromes(text: &[u8], params: SearchParams) -> Result<Vec<Palindrome>, Error> {
    let mut palindromes = Vec::new();
    for_each_palindrome(text, params, |palindrome| {
        palindromes.push(palindrome);
        ControlFlow::Continue(())
    })?;
    Ok(palindromes)
}

/// Streams every maximal gapped palindrome of `text` within `params` to
/// `emit`, in increasing order of right-arm start and then of left-arm
/// end. `emit` may break to stop the sweep early.
pub fn for_each_palindrome<F>(text: &[u8], params: SearchParams, mut emit: F) -> Result<(), Error>
where
    F: FnMut(Palindrome) -> ControlFlow<()>,
{
    let SearchParams { min_arm, min_gap, max_gap } = params;
    if min_gap > max_gap {
        return Err(Error::GapRange { min_gap, max_gap });
    }
    if min_arm == 0 {
        return Err(Error::ArmLengthRange { min_arm, len: text.len() });
    }
    if let Some(position) = text.iter().position(|&b| b == SEPARATOR || b == SENTINEL) {
        return Err(Error::SentinelInInput { byte: text[position], position });
    }
    if min_arm > text.len() {
        // No window of that length exists; nothing to enumerate.
        return Ok(());
    }

    let augmented_string = AugmentedString::new(text)?;
    let table = EquivClassTable::new(&augmented_string, min_arm)?;
    let mut array = EquivClassArray::new(table.num_classes());

    // Gaps shorter than two cannot lose maximality to an inward
    // extension, so the flanking-character filter only applies beyond.
    let near_gap = min_gap.max(2);

    for j in 0..text.len() {
        let left_class = table.reverse(j);
        if left_class == 0 {
            continue;
        }
        array.add(left_class, j, text)?;

        let right_class = table.forward(j);
        if right_class == 0 {
            continue;
        }

        // Drop left arms that have fallen out of the gap window for
        // good; the cursor never has to back up.
        let mut cursor = array.previous_start_item(right_class)?;
        while let Some(item) = cursor {
            if array.position(item) + max_gap >= j {
                break;
            }
            cursor = array.next_item(item);
        }
        array.set_previous_start_item(right_class, cursor)?;

        while let Some(item) = cursor {
            let position = array.position(item);
            if position + near_gap > j {
                break;
            }
            if text[position] != text[j - 1] {
                // The arms cannot grow toward each other: maximal.
                let flow = emit_maximal(&augmented_string, position, j, &mut emit)?;
                if flow.is_break() {
                    return Ok(());
                }
                cursor = array.next_item(item);
            } else {
                // The whole run shares the flanking character and fails
                // with it; skip to the next run in one hop.
                cursor = array.next_run(item);
            }
        }

        // Gap lengths 1 and 0 pair the window ending at j-1 or j with
        // the window starting at j; no inward extension is possible.
        for gap in (min_gap..=max_gap.min(1)).rev() {
            let position = j - gap;
            if table.reverse(position) == right_class {
                let flow = emit_maximal(&augmented_string, position, j, &mut emit)?;
                if flow.is_break() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

/// Extends the verified length-L match ending at `left_end` and starting
/// at `right_start` to its maximal arm length and hands it to `emit`.
fn emit_maximal<F>(
    augmented_string: &AugmentedString,
    left_end: usize,
    right_start: usize,
    emit: &mut F,
) -> Result<ControlFlow<()>, Error>
where
    F: FnMut(Palindrome) -> ControlFlow<()>,
{
    let arm = augmented_string.common_prefix_suffix_length(left_end - 1, right_start)?;
    Ok(emit(Palindrome {
        left_start: left_end - arm,
        left_end,
        right_start,
        right_end: right_start + arm,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// O(n²) reference: every maximal palindrome by direct comparison.
    fn brute_force(text: &[u8], params: SearchParams) -> Vec<Palindrome> {
        let mut palindromes = Vec::new();
        for right_start in 0..text.len() {
            let lowest = right_start.saturating_sub(params.max_gap);
            for left_end in (lowest..=right_start).rev() {
                let gap = right_start - left_end;
                if gap < params.min_gap || gap > params.max_gap {
                    continue;
                }
                let mut arm = 0;
                while right_start + arm < text.len()
                    && arm < left_end
                    && text[left_end - 1 - arm] == text[right_start + arm]
                {
                    arm += 1;
                }
                if arm < params.min_arm {
                    continue;
                }
                // Inward extension possible: a longer palindrome with a
                // two-shorter gap subsumes this one.
                if gap >= 2 && text[left_end] == text[right_start - 1] {
                    continue;
                }
                palindromes.push(Palindrome {
                    left_start: left_end - arm,
                    left_end,
                    right_start,
                    right_end: right_start + arm,
                });
            }
        }
        palindromes.sort();
        palindromes
    }

    fn assert_matches_brute_force(text: &[u8], params: SearchParams) {
        let mut fast = find_palindromes(text, params).unwrap();
        fast.sort();
        let slow = brute_force(text, params);
        assert_eq!(fast, slow, "text {:?} params {:?}", String::from_utf8_lossy(text), params);
    }

    #[test]
    fn spans_the_two_madam_occurrences() {
        let text = b"MADAMIBCDEMADAM";
        let found = find_palindromes(text, SearchParams::new(3, 2, 5)).unwrap();
        assert!(found.contains(&Palindrome {
            left_start: 0,
            left_end: 5,
            right_start: 10,
            right_end: 15,
        }));
        for palindrome in &found {
            assert!(palindrome.arm_len() >= 3);
            assert!((2..=5).contains(&palindrome.gap_len()));
        }
    }

    #[test]
    fn arms_are_reverse_equal_and_maximal() {
        let text = b"ABXABXCBA";
        let params = SearchParams::new(2, 2, 5);
        let found = find_palindromes(text, params).unwrap();

        for p in &found {
            let left: Vec<u8> = text[p.left_start..p.left_end].iter().rev().copied().collect();
            assert_eq!(left, &text[p.right_start..p.right_end]);

            // Not extensible outward.
            if p.left_start > 0 && p.right_end < text.len() {
                assert_ne!(text[p.left_start - 1], text[p.right_end]);
            }
            // Not extensible inward.
            if p.gap_len() >= 2 {
                assert_ne!(text[p.left_end], text[p.right_start - 1]);
            }
        }

        // Both AB...BA pairs are distinct maximal palindromes.
        assert!(found.len() >= 2);
        assert_matches_brute_force(text, params);
    }

    #[test]
    fn emission_order_is_deterministic() {
        let text = b"ABCBABCBA";
        let found = find_palindromes(text, SearchParams::new(1, 0, 4)).unwrap();
        let mut sorted_by_sweep_order = found.clone();
        sorted_by_sweep_order.sort_by_key(|p| (p.right_start, p.left_end));
        assert_eq!(found, sorted_by_sweep_order);
    }

    #[test]
    fn zero_and_one_gaps_are_ordinary_palindromes() {
        // Even palindrome AA at 1 and odd palindrome ABA at 4..7.
        let text = b"XAAYABAZ";
        let found = find_palindromes(text, SearchParams::new(1, 0, 1)).unwrap();
        assert!(found.contains(&Palindrome {
            left_start: 1,
            left_end: 2,
            right_start: 2,
            right_end: 3,
        }));
        assert!(found.contains(&Palindrome {
            left_start: 4,
            left_end: 5,
            right_start: 6,
            right_end: 7,
        }));
        assert_matches_brute_force(text, SearchParams::new(1, 0, 1));
    }

    #[test]
    fn respects_the_gap_window() {
        let text = b"ABCXYDEFFEDXYCBA";
        for (min_gap, max_gap) in [(0, 3), (2, 6), (4, 10), (0, 16)] {
            let params = SearchParams::new(2, min_gap, max_gap);
            for palindrome in find_palindromes(text, params).unwrap() {
                assert!((min_gap..=max_gap).contains(&palindrome.gap_len()));
            }
            assert_matches_brute_force(text, params);
        }
    }

    #[test]
    fn early_stop_truncates_the_sweep() {
        let text = b"AAAAAAAAAA";
        let params = SearchParams::new(1, 0, 9);
        let all = find_palindromes(text, params).unwrap();
        assert!(all.len() > 3);

        let mut seen = Vec::new();
        for_each_palindrome(text, params, |palindrome| {
            seen.push(palindrome);
            if seen.len() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen, all[..3]);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            find_palindromes(b"ABC", SearchParams::new(0, 0, 1)),
            Err(Error::ArmLengthRange { min_arm: 0, len: 3 })
        ));
        assert!(matches!(
            find_palindromes(b"ABC", SearchParams::new(1, 3, 2)),
            Err(Error::GapRange { min_gap: 3, max_gap: 2 })
        ));
        assert!(matches!(
            find_palindromes(b"A#C", SearchParams::new(1, 0, 1)),
            Err(Error::SentinelInInput { byte: b'#', position: 1 })
        ));
    }

    #[test]
    fn degenerate_inputs_yield_nothing() {
        assert!(find_palindromes(b"", SearchParams::new(1, 0, 5)).unwrap().is_empty());
        assert!(find_palindromes(b"AB", SearchParams::new(3, 0, 5)).unwrap().is_empty());
        assert!(find_palindromes(b"ABCDEFG", SearchParams::new(2, 0, 6)).unwrap().is_empty());
    }

    #[test]
    fn periodic_strings_match_the_reference() {
        // All-equal and alternating inputs exercise the run skipping.
        assert_matches_brute_force(b"AAAAAAAAAAAA", SearchParams::new(1, 0, 11));
        assert_matches_brute_force(b"AAAAAAAAAAAA", SearchParams::new(2, 2, 5));
        assert_matches_brute_force(b"ABABABABABAB", SearchParams::new(1, 0, 11));
        assert_matches_brute_force(b"ABABABABABAB", SearchParams::new(3, 1, 6));
    }

    #[test]
    fn random_strings_match_the_reference() {
        let mut rng = rand::thread_rng();
        for _ in 0..40 {
            let len = rng.gen_range(1..50);
            let text: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let min_arm = rng.gen_range(1..=4);
            let min_gap = rng.gen_range(0..6);
            let max_gap = min_gap + rng.gen_range(0..len);
            assert_matches_brute_force(&text, SearchParams::new(min_arm, min_gap, max_gap));
        }
    }
}
