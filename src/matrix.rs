//! The input matrix of an exact cover instance, stored as packed bit rows.
//!
//! Every subset of the universe M = {0, ..., m-1} is an m-bit row. The
//! search only ever asks a handful of questions about rows (emptiness,
//! fullness, disjointness, unions), so the rows are packed into 64-bit
//! words and the queries reduce to word-wise operations.

use thiserror::Error;

const WORD_BITS: usize = u64::BITS as usize;

/// An error found while building an [`InputMatrix`].
///
/// Both variants are malformed input: they are reported before any search
/// runs, never during one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// A row does not have the same width as the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A cell holds something other than 0 or 1.
    #[error("cell ({row}, {col}) holds {value}, expected 0 or 1")]
    NonBinaryCell { row: usize, col: usize, value: u8 },
}

/// How the union of a partial cover is tracked during the search.
///
/// The baseline EC algorithm carries the actual union row; the EC Plus
/// variant only carries its cardinality. The variant is chosen once at the
/// start of a search and never mixes with the other within one run: the
/// popcount sum is a faithful stand-in for the union size only because the
/// compatibility table guarantees that every row added to a partial cover
/// is disjoint from all rows already in it.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub enum Union {
    /// The bitwise union of the rows selected so far.
    Bits(Vec<u64>),
    /// The summed popcount of the rows selected so far.
    Card(usize),
}

/// Selects the [`Union`] representation for a search.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub enum UnionMode {
    Bits,
    Cardinality,
}

/// An n×m binary matrix whose rows are the candidate subsets of an exact
/// cover instance.
///
/// Row order is the enumeration order of the search and therefore has
/// semantic meaning; the matrix is immutable after construction.
#[cfg_attr(test, derive(Debug))]
pub struct InputMatrix {
    words: Vec<u64>,
    words_per_row: usize,
    n: usize,
    m: usize,
    card: Vec<usize>,
}

impl InputMatrix {
    /// Builds a matrix from dense 0/1 rows.
    ///
    /// The width m is taken from the first row. Every row must have exactly
    /// m cells, each 0 or 1.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<InputMatrix, MatrixError> {
        let n = rows.len();
        let m = rows.first().map_or(0, Vec::len);
        let words_per_row = m.div_ceil(WORD_BITS);

        let mut words = vec![0u64; n * words_per_row];
        let mut card = vec![0usize; n];

        for (i, row) in rows.iter().enumerate() {
            if row.len() != m {
                return Err(MatrixError::RowWidth {
                    row: i,
                    expected: m,
                    found: row.len(),
                });
            }
            for (c, &cell) in row.iter().enumerate() {
                match cell {
                    0 => (),
                    1 => {
                        words[i * words_per_row + c / WORD_BITS] |= 1 << (c % WORD_BITS);
                        card[i] += 1;
                    }
                    value => {
                        return Err(MatrixError::NonBinaryCell {
                            row: i,
                            col: c,
                            value,
                        })
                    }
                }
            }
        }

        Ok(InputMatrix {
            words,
            words_per_row,
            n,
            m,
            card,
        })
    }

    /// Number of rows (candidate subsets).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of columns (size of the universe M).
    pub fn m(&self) -> usize {
        self.m
    }

    fn row(&self, i: usize) -> &[u64] {
        &self.words[i * self.words_per_row..(i + 1) * self.words_per_row]
    }

    /// Returns whether cell (i, c) is set.
    pub fn bit(&self, i: usize, c: usize) -> bool {
        self.row(i)[c / WORD_BITS] & (1 << (c % WORD_BITS)) != 0
    }

    /// Returns row i as dense 0/1 cells.
    pub fn row_cells(&self, i: usize) -> Vec<u8> {
        (0..self.m).map(|c| self.bit(i, c) as u8).collect()
    }

    /// Returns whether row i has no set bits.
    pub fn row_empty(&self, i: usize) -> bool {
        self.card[i] == 0
    }

    /// Returns whether row i covers the whole universe on its own.
    pub fn row_full(&self, i: usize) -> bool {
        self.card[i] == self.m
    }

    /// Returns whether rows i and j have no element in common.
    pub fn rows_disjoint(&self, i: usize, j: usize) -> bool {
        self.row(i)
            .iter()
            .zip(self.row(j))
            .all(|(a, b)| a & b == 0)
    }

    /// Per-row popcounts, precomputed at construction.
    pub fn popcounts(&self) -> &[usize] {
        &self.card
    }

    /// Union descriptor for the seed pair (i, j) and whether it already
    /// covers the universe. The rows must be disjoint; the caller checks
    /// that first.
    pub fn pair_union(&self, i: usize, j: usize, mode: UnionMode) -> (Union, bool) {
        match mode {
            UnionMode::Bits => {
                let union: Vec<u64> = self
                    .row(i)
                    .iter()
                    .zip(self.row(j))
                    .map(|(a, b)| a | b)
                    .collect();
                let full = popcount(&union) == self.m;
                (Union::Bits(union), full)
            }
            UnionMode::Cardinality => {
                let sum = self.card[i] + self.card[j];
                (Union::Card(sum), sum == self.m)
            }
        }
    }

    /// Union descriptor extended with row k, and whether the result covers
    /// the universe. Same disjointness precondition as [`pair_union`].
    ///
    /// [`pair_union`]: InputMatrix::pair_union
    pub fn extend_union(&self, union: &Union, k: usize) -> (Union, bool) {
        match union {
            Union::Bits(words) => {
                let extended: Vec<u64> = words
                    .iter()
                    .zip(self.row(k))
                    .map(|(a, b)| a | b)
                    .collect();
                let full = popcount(&extended) == self.m;
                (Union::Bits(extended), full)
            }
            Union::Card(sum) => {
                let extended = sum + self.card[k];
                (Union::Card(extended), extended == self.m)
            }
        }
    }

    /// Columns no row covers. A non-empty result means the instance cannot
    /// have a cover at all.
    pub fn empty_columns(&self) -> Vec<usize> {
        let mut reached = vec![0u64; self.words_per_row];
        for i in 0..self.n {
            for (acc, w) in reached.iter_mut().zip(self.row(i)) {
                *acc |= w;
            }
        }
        (0..self.m)
            .filter(|&c| reached[c / WORD_BITS] & (1 << (c % WORD_BITS)) == 0)
            .collect()
    }
}

fn popcount(words: &[u64]) -> usize {
    words.iter().map(|w| w.count_ones() as usize).sum()
}
