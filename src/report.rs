//! The outcome of a search, and the result files it is exchanged through.
//!
//! A result file is a header block of `;;; key: value` lines, the echoed
//! input sets, and one line per cover. Files written here are read back by
//! [`read_result`], so the `compare` subcommand can check that independent
//! runs (or independent implementations emitting the same format) agree.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use chrono::Local;

use crate::instance::{InstanceError, InstanceKind};
use crate::instance::sudoku::Board;
use crate::matrix::InputMatrix;

/// Everything a finished search reports.
///
/// Equality deliberately covers `(covers, visited_nodes, total_nodes)` only:
/// execution time varies run to run and the Base/Plus variants must compare
/// equal on the same instance.
#[derive(Debug, Clone)]
pub struct Report {
    /// Each cover as the index sequence produced at discovery time.
    pub covers: Vec<Vec<usize>>,
    /// Nodes visited by the search.
    pub visited_nodes: u64,
    /// The reference bound 2^n - 1 (saturating), not a measurement.
    pub total_nodes: u128,
    /// CPU time spent searching.
    pub execution_time: Duration,
    /// A stop request was observed at a gate poll.
    pub stopped: bool,
    /// The CPU deadline was observed at a gate poll.
    pub time_limit_reached: bool,
    /// The EC Plus variant produced this report.
    pub plus: bool,
}

impl PartialEq for Report {
    fn eq(&self, other: &Report) -> bool {
        self.covers == other.covers
            && self.visited_nodes == other.visited_nodes
            && self.total_nodes == other.total_nodes
    }
}

impl Report {
    /// Share of visited nodes over the reference bound, rounded to four
    /// decimal places.
    pub fn visited_percentage(&self) -> f64 {
        if self.total_nodes == 0 {
            return 0.0;
        }
        let pct = self.visited_nodes as f64 / self.total_nodes as f64 * 100.0;
        (pct * 10_000.0).round() / 10_000.0
    }
}

/// Writes a result file for a finished search.
///
/// For Sudoku instances every cover is also rendered as the solved board it
/// decodes to.
pub fn write_report(
    path: &Path,
    matrix: &InputMatrix,
    kind: &InstanceKind,
    report: &Report,
) -> Result<(), InstanceError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    let variant = if report.plus {
        "Plus version"
    } else {
        "Base version"
    };
    let secs = report.execution_time.as_secs_f64();
    let minutes = (secs / 60.0 * 1000.0).round() / 1000.0;

    writeln!(out, ";;; EC Algorithm ({variant})")?;
    writeln!(out, ";;; Executed at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, ";;; Execution time: {secs}s ({minutes} minutes)")?;
    writeln!(out, ";;; Stopped: {}", report.stopped)?;
    writeln!(out, ";;; Time limit reached: {}", report.time_limit_reached)?;
    writeln!(out, ";;; Nodes visited: {}", report.visited_nodes)?;
    writeln!(out, ";;; Total nodes: {}", report.total_nodes)?;
    writeln!(
        out,
        ";;; Percentage of nodes visited: {}%",
        report.visited_percentage()
    )?;
    writeln!(out, ";;;")?;

    if let InstanceKind::Sudoku { dim } = *kind {
        writeln!(out, ";;; Sudoku solutions:")?;
        for cover in &report.covers {
            let board = Board::from_cover(cover, dim)?;
            writeln!(out, "{}", board.render(";;; "))?;
            writeln!(out, ";;;")?;
        }
    }

    for i in 0..matrix.n() {
        writeln!(out, ";;; Set {:>3}: {}", i + 1, cells_line(&matrix.row_cells(i)))?;
    }
    writeln!(out, ";;;")?;

    writeln!(out, ";;; Exact Coverages:")?;
    if report.covers.is_empty() {
        writeln!(out, ";;; No coverage found.")?;
    } else {
        for cover in &report.covers {
            // 1-based for human consumption.
            let shifted: Vec<usize> = cover.iter().map(|&i| i + 1).collect();
            writeln!(out, "{}", indices_line(&shifted))?;
        }
    }

    out.flush()?;
    Ok(())
}

fn cells_line(cells: &[u8]) -> String {
    let inner: Vec<String> = cells.iter().map(u8::to_string).collect();
    format!("[{}]", inner.join(" "))
}

fn indices_line(indices: &[usize]) -> String {
    let inner: Vec<String> = indices.iter().map(usize::to_string).collect();
    format!("[{}]", inner.join(" "))
}

/// Reads a result file back into a [`Report`].
///
/// Covers are restored to 0-based indices, so a report written by
/// [`write_report`] reads back equal to the in-memory original.
pub fn read_result(path: &Path) -> Result<Report, InstanceError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let mut report = Report {
        covers: Vec::new(),
        visited_nodes: 0,
        total_nodes: 0,
        execution_time: Duration::ZERO,
        stopped: false,
        time_limit_reached: false,
        plus: false,
    };

    while let Some(line) = lines.next() {
        let line = line?;

        if line.contains("EC Algorithm") {
            report.plus = line.contains("Plus");
        } else if line.contains("Stopped:") {
            report.stopped = field_after(&line, "Stopped:") == "true";
        } else if line.contains("Time limit reached:") {
            report.time_limit_reached = field_after(&line, "Time limit reached:") == "true";
        } else if line.contains("Nodes visited:") {
            report.visited_nodes = parse_field(path, &line, "Nodes visited:")?;
        } else if line.contains("Total nodes:") {
            report.total_nodes = parse_field(path, &line, "Total nodes:")?;
        } else if line.contains("Execution time:") {
            let secs: f64 = field_after(&line, "Execution time:")
                .trim_end_matches('s')
                .parse()
                .map_err(|_| InstanceError::BadResultField {
                    path: path.to_path_buf(),
                    line: line.clone(),
                })?;
            report.execution_time = Duration::from_secs_f64(secs);
        } else if line.contains("Exact Coverages:") {
            // Covers close out the file.
            for cover_line in lines.by_ref() {
                let cover_line = cover_line?;
                if cover_line.starts_with(";;;") || cover_line.trim().is_empty() {
                    continue;
                }
                let cover = parse_cover(path, &cover_line)?;
                report.covers.push(cover);
            }
            break;
        }
    }

    Ok(report)
}

fn field_after<'a>(line: &'a str, key: &str) -> &'a str {
    line.split_once(key)
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or("")
}

fn parse_field<T: std::str::FromStr>(
    path: &Path,
    line: &str,
    key: &str,
) -> Result<T, InstanceError> {
    field_after(line, key)
        .parse()
        .map_err(|_| InstanceError::BadResultField {
            path: path.to_path_buf(),
            line: line.to_owned(),
        })
}

fn parse_cover(path: &Path, line: &str) -> Result<Vec<usize>, InstanceError> {
    line.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split_whitespace()
        .map(|tok| {
            tok.parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .ok_or_else(|| InstanceError::BadResultField {
                    path: path.to_path_buf(),
                    line: line.to_owned(),
                })
        })
        .collect()
}

/// What [`compare_results`] found out about a set of result files.
#[derive(Debug)]
pub struct Comparison {
    /// All reports were equal under [`Report`] equality.
    pub all_equal: bool,
    /// Index of the file with the smallest execution time.
    pub fastest: usize,
    /// That file's execution time.
    pub fastest_time: Duration,
}

/// Parses every given result file and checks them for equality, also
/// picking out the fastest run. Ties keep the earliest file.
pub fn compare_results(paths: &[impl AsRef<Path>]) -> Result<Comparison, InstanceError> {
    let mut reports: Vec<Report> = Vec::with_capacity(paths.len());
    let mut all_equal = true;

    for path in paths {
        let report = read_result(path.as_ref())?;
        if !reports.is_empty() && report != reports[0] {
            all_equal = false;
        }
        reports.push(report);
    }

    let fastest = reports
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.execution_time)
        .map_or(0, |(idx, _)| idx);
    let fastest_time = reports
        .get(fastest)
        .map_or(Duration::ZERO, |r| r.execution_time);

    Ok(Comparison {
        all_equal,
        fastest,
        fastest_time,
    })
}
