use ec_search::{search, InputMatrix, SearchOptions};

fn main() {
    // Knuth's classic example: the only cover is rows 1, 4 and 5 (1-based).
    let matrix = InputMatrix::from_rows(&[
        vec![0, 0, 1, 0, 1, 1, 0],
        vec![1, 0, 0, 1, 0, 0, 1],
        vec![0, 1, 1, 0, 0, 1, 0],
        vec![1, 0, 0, 1, 0, 0, 0],
        vec![0, 1, 0, 0, 0, 0, 1],
        vec![0, 0, 0, 1, 1, 0, 1],
    ])
    .unwrap();

    let report = search(&matrix, &SearchOptions::default());

    println!("Covers: {:?}", report.covers);
    println!(
        "Visited {} of {} nodes ({}%)",
        report.visited_nodes,
        report.total_nodes,
        report.visited_percentage()
    );
}
