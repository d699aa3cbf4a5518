//! [Exact cover] enumeration using the EC and EC Plus algorithms.
//!
//! [exact cover]: https://en.wikipedia.org/wiki/Exact_cover
//!
//! # Concept
//!
//! Given a universe M of m elements and a family A of n subsets encoded as
//! an n×m binary matrix, the search enumerates every subfamily whose
//! members are pairwise disjoint and whose union is all of M. Many
//! puzzle-like problems, Sudoku among them, can be modeled this way; the
//! [`instance`] module generates random instances and encodes Sudoku
//! puzzles so the same engine solves both.
//!
//! The EC algorithm prunes with a pairwise-compatibility table instead of
//! a column-selection heuristic: a pair of rows is worth extending only if
//! it is disjoint and does not already cover M, and deeper candidates must
//! be compatible with every row already chosen. The EC Plus variant keeps
//! the same control flow but replaces bitwise union tracking with integer
//! popcount sums.
//!
//! # Basic example
//!
//! ```
//! use ec_search::{search, InputMatrix, SearchOptions};
//!
//! let matrix = InputMatrix::from_rows(&[
//!     vec![1, 0, 1, 0],
//!     vec![0, 1, 0, 1],
//!     vec![1, 1, 0, 0],
//!     vec![0, 0, 1, 1],
//! ]).unwrap();
//!
//! let report = search(&matrix, &SearchOptions::default());
//!
//! assert_eq!(report.covers, vec![vec![1, 0], vec![3, 2]]);
//! ```
//!
//! # Stopping a long search
//!
//! Exhaustive enumeration is exponential in n, so a search accepts a
//! cooperative stop flag and a CPU time limit through [`SearchOptions`].
//! Both are observed at well-defined points; covers found up to that
//! moment are kept and the report records how the run ended.

pub mod ec;
pub mod instance;
pub mod matrix;
pub mod report;

pub use ec::{search, SearchOptions};
pub use matrix::InputMatrix;
pub use report::Report;
