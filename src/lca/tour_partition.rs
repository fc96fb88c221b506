use crate::error::Error;

/// Block size for a depth array of length `len`: `max(1, ⌈log₂(len)/2⌉)`.
pub(crate) fn block_size_for(len: usize) -> usize {
    if len == 1 {
        return 1;
    }
    ((len as f64).log2() / 2.0).ceil() as usize
}

/// Fixed-size blocking of the Euler tour depth array, with the minimum
/// value and its in-block position recorded per block. The partition
/// does not keep the values; callers pass the same array back in when a
/// block is needed.
pub struct TourPartition {
    num_blocks: usize,
    block_length: usize,
    total_length: usize,
    block_minima: Vec<usize>,
    minima_positions: Vec<usize>,
}

impl TourPartition {
    pub fn new(values: &[usize]) -> Result<TourPartition, Error> {
        if values.is_empty() {
            return Err(Error::EmptyRange { at: 0 });
        }
        let block_length = block_size_for(values.len());
        let num_blocks = values.len().div_ceil(block_length);

        let mut block_minima = Vec::with_capacity(num_blocks);
        let mut minima_positions = Vec::with_capacity(num_blocks);
        for block in values.chunks(block_length) {
            // min_by_key keeps the first position on ties.
            let (position, &minimum) =
                block.iter().enumerate().min_by_key(|&(_, &value)| value).unwrap();
            block_minima.push(minimum);
            minima_positions.push(position);
        }

        Ok(TourPartition {
            num_blocks,
            block_length,
            total_length: values.len(),
            block_minima,
            minima_positions,
        })
    }

    pub fn block_index(&self, position: usize) -> usize {
        position / self.block_length
    }

    pub fn pos_in_block(&self, position: usize) -> usize {
        position % self.block_length
    }

    /// The `block_index`-th block of `values`. All blocks have the
    /// partition's block length except possibly the last.
    pub fn block<'v>(&self, values: &'v [usize], block_index: usize) -> &'v [usize] {
        let start = block_index * self.block_length;
        let end = self.total_length.min(start + self.block_length);
        &values[start..end]
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    pub fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn block_minima(&self) -> &[usize] {
        &self.block_minima
    }

    pub fn minima_positions(&self) -> &[usize] {
        &self.minima_positions
    }

    /// Self-check against the array the partition was built from.
    pub fn verify(&self, values: &[usize]) -> Result<(), Error> {
        if values.len() != self.total_length {
            return Err(Error::invariant("partition built from a different array length"));
        }

        let mut block_counts = vec![0usize; self.num_blocks];
        let mut last_block = 0;
        for position in 0..values.len() {
            let block = self.block_index(position);
            if block != last_block && block != last_block + 1 {
                return Err(Error::invariant("block assignments are not increasing"));
            }
            last_block = block;
            block_counts[block] += 1;
        }

        for (index, &count) in block_counts.iter().enumerate() {
            if index != self.num_blocks - 1 {
                if count != self.block_length {
                    return Err(Error::invariant(format!(
                        "non-final block {index} has length {count}"
                    )));
                }
            } else if count == 0 {
                return Err(Error::invariant("final block is empty"));
            }
        }

        for index in 0..self.num_blocks {
            let block = self.block(values, index);
            let (position, &minimum) =
                block.iter().enumerate().min_by_key(|&(_, &value)| value).unwrap();
            if minimum != self.block_minima[index] || position != self.minima_positions[index] {
                return Err(Error::invariant(format!("incorrect minimum in block {index}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_grows_with_the_log() {
        assert_eq!(block_size_for(1), 1);
        assert_eq!(block_size_for(2), 1);
        assert_eq!(block_size_for(4), 1);
        assert_eq!(block_size_for(5), 2);
        assert_eq!(block_size_for(16), 2);
        assert_eq!(block_size_for(17), 3);
        assert_eq!(block_size_for(64), 3);
    }

    #[test]
    fn partitions_cover_the_array() {
        let values = [5, 4, 3, 2, 3, 4, 3, 2, 1, 2, 3, 4, 5, 6, 7, 6, 5];
        let partition = TourPartition::new(&values).unwrap();
        partition.verify(&values).unwrap();

        let rebuilt: Vec<usize> = (0..partition.num_blocks())
            .flat_map(|index| partition.block(&values, index).to_vec())
            .collect();
        assert_eq!(rebuilt, values);
    }

    #[test]
    fn minima_prefer_the_first_position() {
        // Two equal minima inside one block; the earlier one wins.
        let values = [3, 1, 2, 1, 3, 2, 2, 2];
        let partition = TourPartition::new(&values).unwrap();
        assert_eq!(partition.block_length(), 2);
        assert_eq!(partition.block_minima(), &[1, 1, 2, 2]);
        assert_eq!(partition.minima_positions(), &[1, 1, 1, 0]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(TourPartition::new(&[]), Err(Error::EmptyRange { at: 0 })));
    }
}
