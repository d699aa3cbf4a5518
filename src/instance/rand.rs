//! Random instance generation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use indexmap::IndexSet;
use rand::Rng;

use crate::instance::{row_line, InstanceError};
use crate::matrix::InputMatrix;

/// A randomly generated instance, plus the parameters that produced it.
pub struct RandomInstance {
    pub matrix: InputMatrix,
    pub prob: f64,
    pub guarantee: bool,
    /// At least one all-zero column was repaired after generation.
    pub fixed_zero_col: bool,
    pub generated_at: DateTime<Local>,
}

/// Generates an n×m instance of Bernoulli(`prob`) rows.
///
/// Rows are kept unique and non-empty; generation retries until both hold,
/// which is why `n` must stay below 2^m. With `guarantee` set (and m ≤ n)
/// the first m rows are the identity matrix, so at least one cover exists.
/// Columns that end up all zero are repaired by setting the bit in one
/// random row, since such an instance could never have a cover.
pub fn generate(
    m: usize,
    n: usize,
    prob: f64,
    guarantee: bool,
    rng: &mut impl Rng,
) -> Result<RandomInstance, InstanceError> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(InstanceError::BadProbability(prob));
    }
    if (m as u32) < usize::BITS && n >= 1 << m {
        return Err(InstanceError::TooManyRows { n, m });
    }

    let mut rows: IndexSet<Vec<u8>> = IndexSet::with_capacity(n);

    if guarantee && m <= n {
        for i in 0..m {
            let mut row = vec![0u8; m];
            row[i] = 1;
            rows.insert(row);
        }
    }

    while rows.len() < n {
        let row: Vec<u8> = (0..m).map(|_| rng.gen_bool(prob) as u8).collect();
        if row.iter().any(|&cell| cell == 1) {
            rows.insert(row); // a duplicate leaves the set unchanged
        }
    }

    let mut rows: Vec<Vec<u8>> = rows.into_iter().collect();

    let mut fixed_zero_col = false;
    if n > 0 {
        for c in 0..m {
            if rows.iter().all(|row| row[c] == 0) {
                rows[rng.gen_range(0..n)][c] = 1;
                fixed_zero_col = true;
            }
        }
    }

    Ok(RandomInstance {
        matrix: InputMatrix::from_rows(&rows)?,
        prob,
        guarantee,
        fixed_zero_col,
        generated_at: Local::now(),
    })
}

/// Writes the instance to a file in the `;;;`-header + sentinel-row format.
pub fn write_instance(path: &Path, inst: &RandomInstance) -> Result<(), InstanceError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, ";;; Exact-Cover (Random)")?;
    writeln!(
        out,
        ";;; Generated at: {}",
        inst.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, ";;; Cardinality of M: {}", inst.matrix.m())?;
    writeln!(out, ";;; Cardinality of N: {}", inst.matrix.n())?;
    writeln!(out, ";;; Probability: {}", inst.prob)?;
    writeln!(out, ";;; Guarantee solution: {}", inst.guarantee)?;
    writeln!(out, ";;; Fixed zero col: {}", inst.fixed_zero_col)?;

    for i in 0..inst.matrix.n() {
        writeln!(out, "{}", row_line(&inst.matrix.row_cells(i)))?;
    }

    out.flush()?;
    Ok(())
}
