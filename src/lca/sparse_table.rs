use crate::error::Error;

fn floor_log2(value: usize) -> usize {
    (usize::BITS - 1 - value.leading_zeros()) as usize
}

/// Sparse table for O(1) range-minimum queries over a fixed array.
/// `table[i][j]` holds the position of the minimum of the `2^j`-length
/// interval starting at `i`; a query combines the two power-of-two
/// intervals covering its range.
pub struct SparseTable {
    table: Vec<Vec<usize>>,
    nrows: usize,
}

impl SparseTable {
    pub fn new(array: &[usize]) -> Result<SparseTable, Error> {
        if array.is_empty() {
            return Err(Error::EmptyRange { at: 0 });
        }
        let nrows = array.len();
        let ncols = floor_log2(nrows) + 1;

        let mut table = vec![vec![0usize; ncols]; nrows];
        for j in 0..ncols {
            for i in 0..nrows {
                if j == 0 {
                    table[i][j] = i;
                    continue;
                }
                let first_min_pos = table[i][j - 1];
                let second_start = i + (1 << (j - 1));
                if second_start >= nrows {
                    table[i][j] = first_min_pos;
                    continue;
                }
                let second_min_pos = table[second_start][j - 1];
                table[i][j] = if array[first_min_pos] <= array[second_min_pos] {
                    first_min_pos
                } else {
                    second_min_pos
                };
            }
        }
        Ok(SparseTable { table, nrows })
    }

    /// Position of the minimum of `array[i..j)`; ties break toward the
    /// smaller index. Reversed bounds are swapped; an empty range is an
    /// error.
    pub fn lookup(&self, array: &[usize], i: usize, j: usize) -> Result<usize, Error> {
        if i == j {
            return Err(Error::EmptyRange { at: i });
        }
        let start = i.min(j);
        let end = i.max(j);
        if end - start == 1 {
            return Ok(start);
        }

        let width = floor_log2(end - start);
        let first_min_pos = self.table[start][width];

        let second_start = end - (1 << width);
        if second_start >= self.nrows {
            return Ok(first_min_pos);
        }
        let second_min_pos = self.table[second_start][width];

        Ok(if array[first_min_pos] <= array[second_min_pos] {
            first_min_pos
        } else {
            second_min_pos
        })
    }

    /// Self-check: compare every range against a linear scan.
    pub fn verify(&self, array: &[usize]) -> Result<(), Error> {
        for i in 0..=array.len() {
            for j in 0..=array.len() {
                if i == j {
                    continue;
                }
                let start = i.min(j);
                let end = i.max(j);
                let expected = (start..end).min_by_key(|&p| array[p]).unwrap();
                let got = self.lookup(array, i, j)?;
                if got != expected {
                    return Err(Error::invariant(format!(
                        "minimum of [{start}, {end}) is at {expected}, lookup said {got}"
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
    fn lookups_match_linear_scans() {
        let array = [9, 3, 7, 1, 8, 1, 2, 6, 4, 5, 0, 2];
        let table = SparseTable::new(&array).unwrap();
        table.verify(&array).unwrap();
    }

    #[test]
    fn ties_break_toward_the_smaller_index() {
        let array = [2, 1, 1, 1, 2];
        let table = SparseTable::new(&array).unwrap();
        assert_eq!(table.lookup(&array, 0, 5).unwrap(), 1);
        assert_eq!(table.lookup(&array, 2, 4).unwrap(), 2);
    }

    #[test]
    fn empty_ranges_and_arrays_are_rejected() {
        assert!(matches!(SparseTable::new(&[]), Err(Error::EmptyRange { at: 0 })));
        let table = SparseTable::new(&[1, 2, 3]).unwrap();
        assert!(matches!(table.lookup(&[1, 2, 3], 2, 2), Err(Error::EmptyRange { at: 2 })));
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let array = [4, 0, 3, 2];
        let table = SparseTable::new(&array).unwrap();
        assert_eq!(table.lookup(&array, 3, 0).unwrap(), 1);
    }

    #[test]
    fn random_tables_verify() {
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            let len = rng.gen_range(1..80);
            let array: Vec<usize> = (0..len).map(|_| rng.gen_range(0..20)).collect();
            let table = SparseTable::new(&array).unwrap();
            table.verify(&array).unwrap();
        }
    }
}
