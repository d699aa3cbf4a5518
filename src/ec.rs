//! The EC and EC Plus exact cover enumeration algorithms.
//!
//! The search walks the rows of the input matrix in order and grows partial
//! covers out of pairwise-compatible rows. Compatibility of a pair (j, i)
//! with j < i is computed once, stored in a strictly-upper-triangular table
//! and reused by the recursion: a row k can extend a partial cover only if
//! the table already marks it compatible with every row in it.
//!
//! The EC Plus variant runs the very same control flow but tracks the union
//! of a partial cover as an integer popcount sum instead of a bit row; see
//! [`Union`](crate::matrix::Union).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpu_time::ProcessTime;
use log::{debug, warn};

use crate::matrix::{InputMatrix, Union, UnionMode};
use crate::report::Report;

/// Options for a single [`search`] run.
#[derive(Default)]
pub struct SearchOptions {
    /// Use the EC Plus cardinality variant instead of the baseline.
    pub plus: bool,
    /// Soft CPU-time deadline. The search may overrun it by one
    /// gate-to-gate step.
    pub time_limit: Option<Duration>,
    /// Cooperative stop flag. Another thread (typically a signal handler)
    /// sets it to true; the search observes it at the next gate poll and
    /// unwinds through normal loop exits.
    pub stop: Option<Arc<AtomicBool>>,
}

/// Enumerates every exact cover of the instance.
///
/// Covers found before a stop request or the deadline are kept; the
/// returned report records how the search ended.
pub fn search(matrix: &InputMatrix, options: &SearchOptions) -> Report {
    let empty_cols = matrix.empty_columns();
    if !empty_cols.is_empty() {
        warn!(
            "columns {:?} are covered by no row; the instance has no exact cover",
            empty_cols
        );
    }

    let mode = if options.plus {
        UnionMode::Cardinality
    } else {
        UnionMode::Bits
    };

    let search = Search {
        matrix,
        mode,
        compat: CompatTable::new(matrix.n()),
        covers: Vec::new(),
        buf: Vec::new(),
        visited: 0,
        gate: Gate::new(options),
    };
    search.run(options.plus)
}

/// The cancellation/deadline predicate, polled at the top of every outer,
/// inner and recursive iteration. Both conditions latch: once observed they
/// keep firing, so every loop up the stack exits at its next poll.
struct Gate {
    stop: Option<Arc<AtomicBool>>,
    time_limit: Option<Duration>,
    clock: ProcessTime,
    stopped: bool,
    deadline_hit: bool,
}

impl Gate {
    fn new(options: &SearchOptions) -> Gate {
        Gate {
            stop: options.stop.clone(),
            time_limit: options.time_limit,
            clock: ProcessTime::now(),
            stopped: false,
            deadline_hit: false,
        }
    }

    fn poll(&mut self) -> bool {
        if !self.stopped {
            if let Some(flag) = &self.stop {
                self.stopped = flag.load(Ordering::Relaxed);
            }
        }
        if !self.deadline_hit {
            if let Some(limit) = self.time_limit {
                self.deadline_hit = self.clock.elapsed() > limit;
            }
        }
        self.stopped || self.deadline_hit
    }
}

/// The compatibility table B. B[j, i] = 1 means j < i, rows j and i are
/// disjoint and their union is a proper subset of the universe. Entries are
/// stored column-major so the recursion reads a column prefix as one slice.
struct CompatTable {
    flags: Vec<bool>,
    n: usize,
}

impl CompatTable {
    fn new(n: usize) -> CompatTable {
        CompatTable {
            flags: vec![false; n * n],
            n,
        }
    }

    fn set(&mut self, j: usize, i: usize, compatible: bool) {
        self.flags[i * self.n + j] = compatible;
    }

    /// Column i, indexed by j. Callers only read the prefix below their
    /// current row index.
    fn col(&self, i: usize) -> &[bool] {
        &self.flags[i * self.n..(i + 1) * self.n]
    }
}

struct Search<'a> {
    matrix: &'a InputMatrix,
    mode: UnionMode,
    compat: CompatTable,
    covers: Vec<Vec<usize>>,
    /// Working buffer for the cover under construction. Holds the seed pair
    /// plus one index per recursion level; cloned only when a cover is
    /// emitted.
    buf: Vec<usize>,
    visited: u64,
    gate: Gate,
}

impl Search<'_> {
    fn run(mut self, plus: bool) -> Report {
        let n = self.matrix.n();

        for i in 0..n {
            if self.gate.poll() {
                break;
            }
            self.visited += 1;

            if self.matrix.row_empty(i) {
                continue;
            }
            if self.matrix.row_full(i) {
                self.covers.push(vec![i]);
                continue;
            }

            for j in 0..i {
                if self.gate.poll() {
                    break;
                }
                self.visited += 1;

                if !self.matrix.rows_disjoint(i, j) {
                    self.compat.set(j, i, false);
                    continue;
                }

                let (union, full) = self.matrix.pair_union(i, j, self.mode);
                if full {
                    self.covers.push(vec![i, j]);
                    self.compat.set(j, i, false);
                } else {
                    self.compat.set(j, i, true);

                    // Rows compatible with both A[i] and A[j].
                    let inter: Vec<bool> = self.compat.col(i)[..j]
                        .iter()
                        .zip(&self.compat.col(j)[..j])
                        .map(|(&a, &b)| a && b)
                        .collect();

                    if inter.iter().any(|&x| x) {
                        self.buf.clear();
                        self.buf.push(i);
                        self.buf.push(j);
                        self.explore(&union, &inter);
                    }
                }
            }
        }

        debug!(
            "search finished: {} covers, {} of {} nodes visited",
            self.covers.len(),
            self.visited,
            total_nodes(n)
        );

        Report {
            covers: self.covers,
            visited_nodes: self.visited,
            total_nodes: total_nodes(n),
            execution_time: self.gate.clock.elapsed(),
            stopped: self.gate.stopped,
            time_limit_reached: self.gate.deadline_hit,
            plus,
        }
    }

    /// Extends the partial cover in `buf` with every candidate marked in
    /// `inter`, depth first.
    ///
    /// `inter` is positional: `inter[k]` speaks about row k, so zero entries
    /// are skipped rather than compacted away. A child call sees the prefix
    /// `inter[..k]` only, because rows extending the cover further must sit
    /// strictly below k.
    fn explore(&mut self, union: &Union, inter: &[bool]) {
        for k in 0..inter.len() {
            if self.gate.poll() {
                break;
            }
            if !inter[k] {
                continue;
            }
            self.visited += 1;

            let (extended, full) = self.matrix.extend_union(union, k);
            self.buf.push(k);
            if full {
                self.covers.push(self.buf.clone());
            } else {
                let narrowed: Vec<bool> = inter[..k]
                    .iter()
                    .zip(&self.compat.col(k)[..k])
                    .map(|(&a, &b)| a && b)
                    .collect();
                if narrowed.iter().any(|&x| x) {
                    self.explore(&extended, &narrowed);
                }
            }
            self.buf.pop();
        }
    }
}

/// The reference node count 2^n - 1, saturating for large n. Reported for
/// normalisation only; nothing in the search depends on it.
fn total_nodes(n: usize) -> u128 {
    match 1u128.checked_shl(n as u32) {
        Some(pow) => pow - 1,
        None => u128::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn run(rows: &[&[u8]]) -> Report {
        run_with(rows, &SearchOptions::default())
    }

    fn run_with(rows: &[&[u8]], options: &SearchOptions) -> Report {
        let matrix =
            InputMatrix::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap();
        search(&matrix, options)
    }

    fn cover_sets(report: &Report) -> BTreeSet<BTreeSet<usize>> {
        report
            .covers
            .iter()
            .map(|c| c.iter().copied().collect())
            .collect()
    }

    #[test]
    fn full_singleton_row_is_a_cover() {
        let report = run(&[&[1, 1, 1]]);
        assert_eq!(report.covers, vec![vec![0]]);
        assert_eq!(report.visited_nodes, 1);
        assert!(!report.stopped && !report.time_limit_reached);
    }

    #[test]
    fn disjoint_pair_completes_a_cover() {
        let report = run(&[&[1, 1, 0], &[0, 0, 1]]);
        assert_eq!(report.covers, vec![vec![1, 0]]);
        assert_eq!(report.visited_nodes, 3);
    }

    #[test]
    fn missing_element_means_no_cover() {
        let report = run(&[&[1, 0, 0], &[0, 1, 0]]);
        assert!(report.covers.is_empty());
        assert_eq!(report.visited_nodes, 3);
    }

    #[test]
    fn overlapping_rows_block_every_pair() {
        let report = run(&[&[1, 1, 0], &[0, 1, 1], &[1, 0, 1]]);
        assert!(report.covers.is_empty());
    }

    #[test]
    fn knuth_example_has_exactly_one_cover() {
        let report = run(&[
            &[0, 0, 1, 0, 1, 1, 0],
            &[1, 0, 0, 1, 0, 0, 1],
            &[0, 1, 1, 0, 0, 1, 0],
            &[1, 0, 0, 1, 0, 0, 0],
            &[0, 1, 0, 0, 0, 0, 1],
            &[0, 0, 0, 1, 1, 0, 1],
        ]);
        let expected: BTreeSet<BTreeSet<usize>> =
            BTreeSet::from([BTreeSet::from([0, 3, 4])]);
        assert_eq!(cover_sets(&report), expected);
    }

    #[test]
    fn empty_row_is_skipped() {
        let report = run(&[&[0, 0, 0], &[1, 1, 1]]);
        assert_eq!(report.covers, vec![vec![1]]);
        assert_eq!(report.visited_nodes, 2);
    }

    #[test]
    fn deep_cover_is_seed_pair_then_descending_tail() {
        let report = run(&[
            &[1, 0, 0, 0],
            &[0, 1, 0, 0],
            &[0, 0, 1, 0],
            &[0, 0, 0, 1],
        ]);
        assert_eq!(report.covers, vec![vec![3, 2, 1, 0]]);
    }

    #[test]
    fn plus_variant_matches_base() {
        let rows: &[&[u8]] = &[
            &[0, 0, 1, 0, 1, 1, 0],
            &[1, 0, 0, 1, 0, 0, 1],
            &[0, 1, 1, 0, 0, 1, 0],
            &[1, 0, 0, 1, 0, 0, 0],
            &[0, 1, 0, 0, 0, 0, 1],
            &[0, 0, 0, 1, 1, 0, 1],
        ];
        let base = run(rows);
        let plus = run_with(
            rows,
            &SearchOptions {
                plus: true,
                ..SearchOptions::default()
            },
        );

        assert!(!base.plus);
        assert!(plus.plus);
        assert_eq!(base.covers, plus.covers);
        assert_eq!(base.visited_nodes, plus.visited_nodes);
        assert_eq!(base, plus);
    }

    #[test]
    fn preset_stop_flag_preempts_the_search() {
        let stop = Arc::new(AtomicBool::new(true));
        let report = run_with(
            &[&[1, 1, 1]],
            &SearchOptions {
                stop: Some(stop),
                ..SearchOptions::default()
            },
        );
        assert!(report.stopped);
        assert!(!report.time_limit_reached);
        assert!(report.covers.is_empty());
        assert_eq!(report.visited_nodes, 0);
    }

    #[test]
    fn zero_time_limit_fires_at_the_first_gate() {
        let report = run_with(
            &[&[1, 1, 1]],
            &SearchOptions {
                time_limit: Some(Duration::ZERO),
                ..SearchOptions::default()
            },
        );
        assert!(report.time_limit_reached);
        assert!(!report.stopped);
        assert!(report.covers.is_empty());
    }

    #[test]
    fn total_nodes_saturates_for_wide_instances() {
        assert_eq!(total_nodes(0), 0);
        assert_eq!(total_nodes(3), 7);
        assert_eq!(total_nodes(127), (1u128 << 127) - 1);
        assert_eq!(total_nodes(200), u128::MAX);
    }
}
