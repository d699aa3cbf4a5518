//! Problem instances and the text files they travel in.
//!
//! An instance file is line oriented: `;;;`-prefixed lines carry headers
//! and commentary, and a matrix row is any line whose last field is the
//! sentinel `-`. Everything else is ignored, so generators are free to
//! embed extra material (a rendered Sudoku puzzle, generation parameters)
//! without confusing the reader.
//!
//! Generators for the two instance families live in the submodules:
//! [`rand`] for random 0/1 matrices and [`sudoku`] for encoded puzzles.

pub mod rand;
pub mod sudoku;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::matrix::{InputMatrix, MatrixError};

/// Errors of the instance layer: file I/O, parsing and generation. These
/// never reach the search core, which only ever sees a valid
/// [`InputMatrix`].
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("line {line}: {token:?} is not a matrix cell")]
    BadCell { line: usize, token: String },
    #[error("{0}")]
    BadHeader(String),
    #[error("{path}: unparsable result line {line:?}")]
    BadResultField { path: PathBuf, line: String },
    #[error("cannot generate {n} unique non-empty rows over {m} elements")]
    TooManyRows { n: usize, m: usize },
    #[error("probability {0} is not within [0, 1]")]
    BadProbability(f64),
    #[error("difficulty {0} is not within [0, 1]")]
    BadDifficulty(f64),
    #[error("sudoku dimension {0} must be a perfect square no larger than 225")]
    BadDimension(usize),
    #[error("a cover of {found} rows does not decode to a {dim}x{dim} sudoku")]
    BadCover { found: usize, dim: usize },
}

/// What kind of problem an instance file encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    /// A plain exact cover matrix.
    Plain,
    /// A Sudoku puzzle of side `dim` encoded as constraint rows.
    Sudoku { dim: usize },
}

/// An instance read from a file.
pub struct Instance {
    pub matrix: InputMatrix,
    pub kind: InstanceKind,
}

/// Reads an instance file.
///
/// A header containing the token `Sudoku` marks a Sudoku encoding; its
/// side comes from a `;;; Dimension: <k>` header, which is then required.
pub fn read_instance(path: &Path) -> Result<Instance, InstanceError> {
    let file = File::open(path)?;
    let mut rows: Vec<Vec<u8>> = Vec::new();
    let mut is_sudoku = false;
    let mut dim = None;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.starts_with(";;;") {
            if line.contains("Sudoku") {
                is_sudoku = true;
            }
            if let Some((_, value)) = line.split_once("Dimension:") {
                let parsed = value.trim().parse().map_err(|_| {
                    InstanceError::BadHeader(format!("line {}: bad dimension header", line_no + 1))
                })?;
                dim = Some(parsed);
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.last() != Some(&"-") {
            continue;
        }

        let row = fields[..fields.len() - 1]
            .iter()
            .map(|tok| {
                tok.parse::<u8>().map_err(|_| InstanceError::BadCell {
                    line: line_no + 1,
                    token: (*tok).to_owned(),
                })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        rows.push(row);
    }

    let matrix = InputMatrix::from_rows(&rows)?;
    let kind = match (is_sudoku, dim) {
        (true, Some(dim)) => InstanceKind::Sudoku { dim },
        (true, None) => {
            return Err(InstanceError::BadHeader(
                "sudoku instance without a Dimension header".to_owned(),
            ))
        }
        (false, _) => InstanceKind::Plain,
    };

    Ok(Instance { matrix, kind })
}

/// Renders a matrix row as an instance-file line, sentinel included.
pub(crate) fn row_line(cells: &[u8]) -> String {
    let mut line = String::with_capacity(cells.len() * 2 + 1);
    for cell in cells {
        line.push(if *cell == 0 { '0' } else { '1' });
        line.push(' ');
    }
    line.push('-');
    line
}
