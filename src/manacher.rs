//! Maximal ordinary (gap-free) palindromes at every center, via
//! Manacher's algorithm in O(n).

use crate::error::Error;

/// Centers live between characters as well as on them, so a string of
/// length n has 2n+1 of them; these map a center and radius back to
/// query positions.
fn query_start(center: usize, radius: usize) -> usize {
    center / 2 - radius
}

fn query_end(center: usize, radius: usize) -> usize {
    if center % 2 == 0 {
        center / 2 + radius - 1
    } else {
        center / 2 + radius
    }
}

/// Radius of the maximal palindrome at each of the `2n + 1` centers of
/// `text`:
///
/// ```text
///      B A N A N A
///     0000010201000
/// ```
///
/// Even centers sit between characters (radius counts character pairs),
/// odd centers on them (radius counts pairs around the middle
/// character).
pub fn palindrome_radii(text: &[u8]) -> Vec<usize> {
    let radii_length = 2 * text.len() + 1;
    let mut radii = vec![0usize; radii_length];
    if text.is_empty() {
        return radii;
    }

    // Center of the known palindrome reaching furthest right.
    let mut current_center = 0;

    // The first and last centers stay zero.
    for position in 1..radii_length - 1 {
        let right_boundary = current_center + 2 * radii[current_center];

        // Inside a known palindrome the mirrored center bounds us below.
        if right_boundary > position {
            let mirror = 2 * current_center - position;
            let max_radius = (right_boundary - position) / 2;
            radii[position] = max_radius.min(radii[mirror]);
        }

        loop {
            if query_start(position, radii[position]) == 0 {
                break;
            }
            if query_end(position, radii[position]) == text.len() - 1 {
                break;
            }
            if text[query_start(position, radii[position] + 1)]
                == text[query_end(position, radii[position] + 1)]
            {
                radii[position] += 1;
            } else {
                break;
            }
        }

        if 2 * radii[position] + position > right_boundary {
            current_center = position;
        }
    }
    radii
}

/// The longest palindromic substring, resolved from the radii.
pub fn longest_palindrome<'t>(text: &'t [u8], radii: &[usize]) -> &'t [u8] {
    let mut max_radius = 0;
    let mut max_center = 0;
    for (center, &radius) in radii.iter().enumerate() {
        if radius > max_radius {
            max_radius = radius;
            max_center = center;
        }
    }
    if max_radius == 0 {
        // Any single character; match the first one.
        return &text[..text.len().min(1)];
    }
    let start = query_start(max_center, max_radius);
    let length = if max_center % 2 == 1 { 2 * max_radius + 1 } else { 2 * max_radius };
    &text[start..start + length]
}

/// Self-check: each radius must describe a palindrome that cannot be
/// extended.
pub fn verify_radii(text: &[u8], radii: &[usize]) -> Result<(), Error> {
    if radii.len() != 2 * text.len() + 1 {
        return Err(Error::invariant("radii array has the wrong length"));
    }
    if text.is_empty() {
        return Ok(());
    }
    if radii[0] != 0 || radii[2 * text.len()] != 0 {
        return Err(Error::invariant("outermost centers must have radius zero"));
    }

    for center in 1..2 * text.len() {
        let radius = radii[center];
        let start = query_start(center, radius);
        let end = query_end(center, radius);

        if start > 0 && end < text.len() - 1 && text[start - 1] == text[end + 1] {
            return Err(Error::invariant(format!(
                "palindrome at center {center} with radius {radius} is not maximal"
            )));
        }
        if radius == 0 {
            continue;
        }
        for offset in 0..end - start {
            if text[start + offset] != text[end - offset] {
                return Err(Error::invariant(format!(
                    "center {center} radius {radius} is not a palindrome"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn banana_radii() {
        let radii = palindrome_radii(b"BANANA");
        assert_eq!(radii, [0, 0, 0, 0, 0, 1, 0, 2, 0, 1, 0, 0, 0]);
        verify_radii(b"BANANA", &radii).unwrap();
    }

    #[test]
    fn panama_radius_covers_the_whole_string() {
        let text = b"AMANAPLANACANALPANAMA";
        let radii = palindrome_radii(text);
        assert_eq!(radii[21], 10);
        verify_radii(text, &radii).unwrap();
        assert_eq!(longest_palindrome(text, &radii), text);
    }

    #[test]
    fn longest_palindrome_of_even_length() {
        let text = b"XABBAY";
        let radii = palindrome_radii(text);
        assert_eq!(longest_palindrome(text, &radii), b"ABBA");
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(palindrome_radii(b""), [0]);
        assert_eq!(palindrome_radii(b"A"), [0, 0, 0]);
        verify_radii(b"", &palindrome_radii(b"")).unwrap();
        assert_eq!(longest_palindrome(b"A", &palindrome_radii(b"A")), b"A");
        assert_eq!(longest_palindrome(b"AB", &palindrome_radii(b"AB")), b"A");
    }

    #[test]
    fn random_radii_verify() {
        let mut rng = rand::thread_rng();
        for _ in 0..30 {
            let len = rng.gen_range(1..80);
            let text: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let radii = palindrome_radii(&text);
            verify_radii(&text, &radii).unwrap();
        }
    }
}
