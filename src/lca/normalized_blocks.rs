use crate::error::Error;

/// Identifier of a ±1 block: bit `len − 2 − k` is set iff the block
/// steps up between positions `k` and `k + 1`. Blocks with the same
/// signature have their minima in the same positions.
pub(crate) fn block_signature(block: &[usize]) -> usize {
    let mut signature = 0;
    for k in 0..block.len() - 1 {
        if block[k + 1] > block[k] {
            signature |= 1 << (block.len() - k - 2);
        }
    }
    signature
}

/// Fully tabulated range-minimum answers for one block shape.
/// `table[i][j]` is the position of the minimum of `block[i..i+j+2)`.
pub struct BlockRmqTable {
    table: Vec<Vec<usize>>,
    block_size: usize,
}

impl BlockRmqTable {
    pub fn new(block: &[usize]) -> BlockRmqTable {
        let block_size = block.len();
        let mut table: Vec<Vec<usize>> =
            (0..block_size).map(|i| vec![0usize; block_size - i]).collect();

        for i in 0..block_size {
            for j in 0..block_size - i {
                let range_end = j + i + 1;
                if range_end - i == 1 {
                    table[i][j] = i;
                    continue;
                }
                let prev_min_pos = table[i][j - 1];
                if block[prev_min_pos] <= block[range_end - 1] {
                    table[i][j] = prev_min_pos;
                } else {
                    table[i][j] = range_end - 1;
                }
            }
        }
        BlockRmqTable { table, block_size }
    }

    /// Position of the minimum of `block[i..j)`. Reversed bounds are
    /// swapped; empty or out-of-block ranges are errors.
    pub fn lookup(&self, i: usize, j: usize) -> Result<usize, Error> {
        if i == j {
            return Err(Error::EmptyRange { at: i });
        }
        let start = i.min(j);
        let end = i.max(j);
        if end > self.block_size {
            return Err(Error::RangePastEnd { end, size: self.block_size });
        }
        Ok(self.table[start][end - start - 1])
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Self-check against a linear scan over the block it was built from.
    pub fn verify(&self, block: &[usize]) -> Result<(), Error> {
        for i in 0..=self.block_size {
            for j in 0..=self.block_size {
                if i == j {
                    continue;
                }
                let start = i.min(j);
                let end = i.max(j);
                let expected = (start..end).min_by_key(|&p| block[p]).unwrap();
                let got = self.lookup(i, j)?;
                if got != expected {
                    return Err(Error::invariant(format!(
                        "block minimum of [{start}, {end}) is at {expected}, lookup said {got}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Lazily populated collection of [`BlockRmqTable`]s, keyed by ±1 block
/// signature. Sized for one block length; the single shorter remainder
/// block an input can produce gets its own slot.
pub struct BlockRmqDatabase {
    block_size: usize,
    tables: Vec<Option<BlockRmqTable>>,
    remainder: Option<(usize, BlockRmqTable)>,
}

impl BlockRmqDatabase {
    pub fn new(block_size: usize) -> Result<BlockRmqDatabase, Error> {
        if block_size == 0 {
            return Err(Error::EmptyRange { at: 0 });
        }
        let num_signatures = 1 << (block_size - 1);
        let mut tables = Vec::with_capacity(num_signatures);
        tables.resize_with(num_signatures, || None);
        Ok(BlockRmqDatabase { block_size, tables, remainder: None })
    }

    /// Position of the minimum of `block[i..j)`, instantiating the table
    /// for the block's signature on first use.
    pub fn lookup(&mut self, block: &[usize], i: usize, j: usize) -> Result<usize, Error> {
        if block.len() > self.block_size {
            return Err(Error::BlockTooLarge { got: block.len(), max: self.block_size });
        }

        if block.len() < self.block_size {
            // The remainder block: a given input only ever has one.
            let signature = block_signature(block);
            let (seen, table) = self
                .remainder
                .get_or_insert_with(|| (signature, BlockRmqTable::new(block)));
            if *seen != signature {
                return Err(Error::RemainderMismatch);
            }
            return table.lookup(i, j);
        }

        let signature = block_signature(block);
        let table =
            self.tables[signature].get_or_insert_with(|| BlockRmqTable::new(block));
        table.lookup(i, j)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Self-check: run every possible signature through the database
    /// twice (once building the table, once reusing it).
    pub fn verify(&mut self) -> Result<(), Error> {
        for signature in 0..self.tables.len() {
            let mut block = vec![0usize; self.block_size];
            block[0] = self.block_size + 2;
            for k in 0..self.block_size - 1 {
                if signature & (1 << (self.block_size - 2 - k)) != 0 {
                    block[k + 1] = block[k] + 1;
                } else {
                    block[k + 1] = block[k] - 1;
                }
            }
            debug_assert_eq!(block_signature(&block), signature);

            for _ in 0..2 {
                let expected = (0..block.len()).min_by_key(|&p| block[p]).unwrap();
                let got = self.lookup(&block, 0, self.block_size)?;
                if got != expected {
                    return Err(Error::invariant(format!(
                        "database lookup for signature {signature} returned {got}, expected {expected}"
                    )));
                }
            }
        }
        Ok(())
    }
}
