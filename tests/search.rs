//! End-to-end properties of the search engine: agreement with brute force,
//! equivalence of the two variants, and cooperative termination.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ec_search::{search, InputMatrix, Report, SearchOptions};

fn random_rows(n: usize, m: usize, density: f64, rng: &mut impl Rng) -> Vec<Vec<u8>> {
    (0..n)
        .map(|_| (0..m).map(|_| rng.gen_bool(density) as u8).collect())
        .collect()
}

/// Every subset of rows that partitions the universe, the slow way.
fn brute_force_covers(rows: &[Vec<u8>]) -> BTreeSet<BTreeSet<usize>> {
    let n = rows.len();
    let m = rows.first().map_or(0, Vec::len);
    let mut covers = BTreeSet::new();

    'mask: for mask in 1u32..(1 << n) {
        let mut union = vec![0u8; m];
        for i in 0..n {
            if mask & (1 << i) == 0 {
                continue;
            }
            // Partition parts are non-empty.
            if rows[i].iter().all(|&cell| cell == 0) {
                continue 'mask;
            }
            for (acc, &cell) in union.iter_mut().zip(&rows[i]) {
                if *acc == 1 && cell == 1 {
                    continue 'mask; // overlap
                }
                *acc |= cell;
            }
        }
        if union.iter().all(|&cell| cell == 1) {
            covers.insert((0..n).filter(|i| mask & (1 << i) != 0).collect());
        }
    }
    covers
}

fn cover_sets(report: &Report) -> BTreeSet<BTreeSet<usize>> {
    report
        .covers
        .iter()
        .map(|c| c.iter().copied().collect())
        .collect()
}

/// A full first row followed by an identity matrix: one cover is found
/// immediately and the remaining search space is far too large to finish.
fn long_running_rows(m: usize) -> Vec<Vec<u8>> {
    let mut rows = vec![vec![1u8; m]];
    for i in 0..m {
        let mut row = vec![0u8; m];
        row[i] = 1;
        rows.push(row);
    }
    rows
}

#[test]
fn engine_agrees_with_brute_force() {
    for seed in 0..6 {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = random_rows(10, 7, 0.35, &mut rng);
        let matrix = InputMatrix::from_rows(&rows).unwrap();
        let report = search(&matrix, &SearchOptions::default());

        assert_eq!(
            cover_sets(&report),
            brute_force_covers(&rows),
            "seed {seed} diverged from brute force"
        );
        // No two emitted covers may denote the same set of rows.
        assert_eq!(cover_sets(&report).len(), report.covers.len());

        for cover in &report.covers {
            let mut union = vec![0u8; 7];
            for &i in cover {
                for (acc, &cell) in union.iter_mut().zip(&rows[i]) {
                    assert!(!(*acc == 1 && cell == 1), "cover {cover:?} overlaps");
                    *acc |= cell;
                }
            }
            assert!(union.iter().all(|&c| c == 1), "cover {cover:?} is not exact");
        }
    }
}

#[test]
fn plus_and_base_return_identical_reports() {
    for seed in 0..6 {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = random_rows(12, 8, 0.3, &mut rng);
        let matrix = InputMatrix::from_rows(&rows).unwrap();

        let base = search(&matrix, &SearchOptions::default());
        let plus = search(
            &matrix,
            &SearchOptions {
                plus: true,
                ..SearchOptions::default()
            },
        );

        assert_eq!(base.covers, plus.covers);
        assert_eq!(base.visited_nodes, plus.visited_nodes);
        assert_eq!(base, plus);
    }
}

#[test]
fn visited_nodes_stay_within_the_reference_bound() {
    let mut rng = StdRng::seed_from_u64(1);
    let rows = random_rows(12, 8, 0.4, &mut rng);
    let matrix = InputMatrix::from_rows(&rows).unwrap();
    let report = search(&matrix, &SearchOptions::default());

    assert_eq!(report.total_nodes, (1u128 << 12) - 1);
    assert!(u128::from(report.visited_nodes) <= report.total_nodes);
}

#[test]
fn stop_flag_interrupts_a_long_search() {
    let matrix = InputMatrix::from_rows(&long_running_rows(26)).unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let worker = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            search(
                &matrix,
                &SearchOptions {
                    stop: Some(stop),
                    ..SearchOptions::default()
                },
            )
        })
    };

    thread::sleep(Duration::from_millis(20));
    stop.store(true, Ordering::Relaxed);
    let report = worker.join().unwrap();

    assert!(report.stopped);
    assert!(!report.time_limit_reached);
    // The full first row was emitted before the interruption.
    assert_eq!(report.covers[0], vec![0]);
    assert!(u128::from(report.visited_nodes) <= report.total_nodes);
}

#[test]
fn time_limit_interrupts_a_long_search() {
    let matrix = InputMatrix::from_rows(&long_running_rows(26)).unwrap();
    let report = search(
        &matrix,
        &SearchOptions {
            time_limit: Some(Duration::from_millis(50)),
            ..SearchOptions::default()
        },
    );

    assert!(report.time_limit_reached);
    assert!(!report.stopped);
    assert_eq!(report.covers[0], vec![0]);
}
