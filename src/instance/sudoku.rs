//! Sudoku puzzles as exact cover instances.
//!
//! A d×d puzzle maps to n = d³ candidate rows (one per cell/value
//! combination) over m = 4·d² constraint columns: one block each for cell,
//! row, column and box constraints. A clue cell contributes a single
//! candidate row; an empty cell contributes d of them. Candidates ruled out
//! by a clue keep an all-zero row, which the search skips, so the matrix
//! shape depends only on d.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::instance::{row_line, InstanceError};
use crate::matrix::InputMatrix;

// Values are stored as u8, which caps the supported side at the largest
// perfect square below 256.
const MAX_DIM: usize = 225;

/// A d×d Sudoku board; 0 marks an empty cell.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub struct Board {
    dim: usize,
    base: usize,
    cells: Vec<u8>,
}

impl Board {
    /// Generates a completely filled valid board.
    ///
    /// Uses the shuffled band/stack pattern construction: a base pattern
    /// that is valid by arithmetic, with row groups, column groups and the
    /// symbols all permuted at random.
    pub fn generate(dim: usize, rng: &mut impl Rng) -> Result<Board, InstanceError> {
        let base = checked_base(dim)?;

        // Band/stack order: groups are shuffled, and the lines within each
        // group are shuffled again per group.
        fn shuffled_axis(base: usize, rng: &mut impl Rng) -> Vec<usize> {
            let mut groups: Vec<usize> = (0..base).collect();
            groups.shuffle(rng);
            let mut axis = Vec::with_capacity(base * base);
            for g in groups {
                let mut members: Vec<usize> = (0..base).collect();
                members.shuffle(rng);
                axis.extend(members.into_iter().map(|x| g * base + x));
            }
            axis
        }

        let rows = shuffled_axis(base, rng);
        let cols = shuffled_axis(base, rng);
        let mut nums: Vec<u8> = (1..=dim as u8).collect();
        nums.shuffle(rng);

        let pattern = |r: usize, c: usize| (base * (r % base) + r / base + c) % dim;

        let mut cells = vec![0u8; dim * dim];
        for &r in &rows {
            for &c in &cols {
                cells[r * dim + c] = nums[pattern(r, c)];
            }
        }

        Ok(Board { dim, base, cells })
    }

    /// Derives a puzzle by blanking ⌊d²·difficulty⌋ cells at random.
    pub fn puzzle(&self, difficulty: f64, rng: &mut impl Rng) -> Result<Board, InstanceError> {
        if !(0.0..=1.0).contains(&difficulty) {
            return Err(InstanceError::BadDifficulty(difficulty));
        }

        let mut cells = self.cells.clone();
        let empties = (self.cells.len() as f64 * difficulty).floor() as usize;
        for cell in sample(rng, self.cells.len(), empties) {
            cells[cell] = 0;
        }

        Ok(Board {
            dim: self.dim,
            base: self.base,
            cells,
        })
    }

    /// Decodes an exact cover of the encoded matrix back into the solved
    /// board. Expects exactly one candidate row per cell.
    pub fn from_cover(cover: &[usize], dim: usize) -> Result<Board, InstanceError> {
        let base = checked_base(dim)?;
        if cover.len() != dim * dim {
            return Err(InstanceError::BadCover {
                found: cover.len(),
                dim,
            });
        }

        let mut cells = vec![0u8; dim * dim];
        for &idx in cover {
            if idx >= dim * dim * dim {
                return Err(InstanceError::BadCover {
                    found: cover.len(),
                    dim,
                });
            }
            let value = (idx % dim) as u8 + 1;
            cells[idx / dim] = value;
        }

        Ok(Board { dim, base, cells })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Value at (row, col); 0 if the cell is empty.
    pub fn value(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.dim + col]
    }

    /// Encodes the board as the d³×4d² exact cover matrix.
    pub fn encode(&self) -> Result<InputMatrix, InstanceError> {
        let d = self.dim;
        let mut rows = vec![vec![0u8; 4 * d * d]; d * d * d];

        for r in 0..d {
            for c in 0..d {
                let clue = self.cells[r * d + c];
                let candidates = if clue == 0 { 1..=d as u8 } else { clue..=clue };
                for value in candidates {
                    self.set_constraint_row(&mut rows, r, c, value);
                }
            }
        }

        Ok(InputMatrix::from_rows(&rows)?)
    }

    fn set_constraint_row(&self, rows: &mut [Vec<u8>], r: usize, c: usize, value: u8) {
        let d = self.dim;
        let v = value as usize - 1;
        let row = &mut rows[r * d * d + c * d + v];

        row[r * d + c] = 1; // cell constraint
        row[d * d + r * d + v] = 1; // row constraint
        row[2 * d * d + c * d + v] = 1; // column constraint
        row[3 * d * d + d * (self.base * (r / self.base) + c / self.base) + v] = 1; // box constraint
    }

    /// Renders the board as a framed grid, one string line per grid line,
    /// every line starting with `prefix`.
    pub fn render(&self, prefix: &str) -> String {
        let width = self.dim.to_string().len();
        let mut border = String::new();
        for _ in 0..self.base {
            border.push_str("+-");
            border.push_str(&"-".repeat((width + 1) * self.base));
        }
        border.push('+');

        let mut lines = vec![format!("{prefix}{border}")];
        for r in 0..self.dim {
            let mut line = String::from(prefix);
            for c in 0..self.dim {
                if c % self.base == 0 {
                    line.push_str("| ");
                }
                match self.cells[r * self.dim + c] {
                    0 => line.push_str(&" ".repeat(width)),
                    v => line.push_str(&format!("{:0width$}", v)),
                }
                line.push(' ');
            }
            line.push('|');
            lines.push(line);
            if r % self.base == self.base - 1 {
                lines.push(format!("{prefix}{border}"));
            }
        }
        lines.join("\n")
    }
}

fn checked_base(dim: usize) -> Result<usize, InstanceError> {
    let base = (dim as f64).sqrt() as usize;
    if dim == 0 || dim > MAX_DIM || base * base != dim {
        return Err(InstanceError::BadDimension(dim));
    }
    Ok(base)
}

/// A generated puzzle together with its encoded matrix.
pub struct SudokuInstance {
    pub matrix: InputMatrix,
    pub puzzle: Board,
    pub difficulty: f64,
    pub generated_at: DateTime<Local>,
}

/// Generates a puzzle of side `dim` and encodes it.
pub fn generate(
    dim: usize,
    difficulty: f64,
    rng: &mut impl Rng,
) -> Result<SudokuInstance, InstanceError> {
    let puzzle = Board::generate(dim, rng)?.puzzle(difficulty, rng)?;
    let matrix = puzzle.encode()?;

    Ok(SudokuInstance {
        matrix,
        puzzle,
        difficulty,
        generated_at: Local::now(),
    })
}

/// Writes the instance to a file, with the rendered puzzle in the headers.
pub fn write_instance(path: &Path, inst: &SudokuInstance) -> Result<(), InstanceError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, ";;; Exact-Cover (Sudoku)")?;
    writeln!(
        out,
        ";;; Generated at: {}",
        inst.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, ";;; Dimension: {}", inst.puzzle.dim())?;
    writeln!(out, ";;; Difficulty: {}", inst.difficulty)?;
    writeln!(out, ";;; Sudoku puzzle:")?;
    writeln!(out, "{}", inst.puzzle.render(";;; "))?;

    for i in 0..inst.matrix.n() {
        writeln!(out, "{}", row_line(&inst.matrix.row_cells(i)))?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn assert_valid_group(values: impl Iterator<Item = u8>, dim: usize) {
        let group: BTreeSet<u8> = values.collect();
        assert_eq!(group, (1..=dim as u8).collect::<BTreeSet<u8>>());
    }

    #[test]
    fn generated_board_is_valid() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = Board::generate(9, &mut rng).unwrap();

        for r in 0..9 {
            assert_valid_group((0..9).map(|c| board.value(r, c)), 9);
        }
        for c in 0..9 {
            assert_valid_group((0..9).map(|r| board.value(r, c)), 9);
        }
        for br in 0..3 {
            for bc in 0..3 {
                assert_valid_group(
                    (0..9).map(|i| board.value(br * 3 + i / 3, bc * 3 + i % 3)),
                    9,
                );
            }
        }
    }

    #[test]
    fn non_square_dimensions_are_rejected() {
        let mut rng = StdRng::seed_from_u64(11);
        assert!(matches!(
            Board::generate(8, &mut rng),
            Err(InstanceError::BadDimension(8))
        ));
        assert!(matches!(
            Board::generate(0, &mut rng),
            Err(InstanceError::BadDimension(0))
        ));
    }

    #[test]
    fn puzzle_blanks_the_requested_share() {
        let mut rng = StdRng::seed_from_u64(11);
        let puzzle = Board::generate(9, &mut rng)
            .unwrap()
            .puzzle(0.5, &mut rng)
            .unwrap();
        let blanks = (0..9)
            .flat_map(|r| (0..9).map(move |c| (r, c)))
            .filter(|&(r, c)| puzzle.value(r, c) == 0)
            .count();
        assert_eq!(blanks, 40); // floor(81 * 0.5)
    }

    #[test]
    fn encoding_has_fixed_shape_and_row_weights() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = Board::generate(4, &mut rng).unwrap();

        let full = board.encode().unwrap();
        assert_eq!(full.n(), 64);
        assert_eq!(full.m(), 64);
        let nonzero = (0..full.n()).filter(|&i| !full.row_empty(i)).count();
        assert_eq!(nonzero, 16); // one candidate per clue cell
        for i in 0..full.n() {
            assert!(full.popcounts()[i] == 0 || full.popcounts()[i] == 4);
        }

        let blank = board.puzzle(1.0, &mut rng).unwrap().encode().unwrap();
        let nonzero = (0..blank.n()).filter(|&i| !blank.row_empty(i)).count();
        assert_eq!(nonzero, 64); // d candidates per empty cell
    }

    #[test]
    fn cover_decodes_back_to_the_board() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = Board::generate(4, &mut rng).unwrap();

        let cover: Vec<usize> = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .map(|(r, c)| r * 16 + c * 4 + board.value(r, c) as usize - 1)
            .collect();

        assert_eq!(Board::from_cover(&cover, 4).unwrap(), board);
        assert!(matches!(
            Board::from_cover(&cover[1..], 4),
            Err(InstanceError::BadCover { found: 15, dim: 4 })
        ));
    }

    #[test]
    fn render_frames_every_box() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = Board::generate(4, &mut rng).unwrap();
        let rendered = board.render(";;; ");
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 7); // 4 rows + 3 borders
        assert!(lines.iter().all(|l| l.starts_with(";;; ")));
        assert_eq!(lines[0], ";;; +-----+-----+");
        assert!(lines[1].ends_with('|'));
    }
}
