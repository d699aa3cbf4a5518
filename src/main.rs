use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use rand::thread_rng;

use ec_search::instance::{rand as rand_inst, read_instance, sudoku};
use ec_search::report::{compare_results, write_report};
use ec_search::{search, SearchOptions};

#[derive(Parser)]
#[command(name = "ec-search", version, about = "Exact cover enumeration with the EC and EC Plus algorithms")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the search on an instance file and write a result file.
    Ec {
        /// Instance file to read.
        #[arg(short, long, default_value = "test/in.txt")]
        input: PathBuf,
        /// Result file to write.
        #[arg(short, long, default_value = "test/out.txt")]
        output: PathBuf,
        /// Max CPU time in seconds.
        #[arg(short, long)]
        time: Option<u64>,
        /// Use the EC Plus variant instead of the baseline.
        #[arg(short, long)]
        plus: bool,
    },
    /// Generate an instance file.
    Gen {
        #[command(subcommand)]
        family: GenCommand,
    },
    /// Check that result files describe the same search outcome.
    Compare {
        /// Result files to compare.
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GenCommand {
    /// A random 0/1 matrix.
    Rand {
        /// Instance file to write.
        #[arg(short, long, default_value = "test/in.txt")]
        output: PathBuf,
        /// Number of elements in the universe M.
        #[arg(short, long, default_value_t = 10)]
        mdim: usize,
        /// Number of candidate subsets.
        #[arg(short, long, default_value_t = 10)]
        ndim: usize,
        /// Probability of a cell being 1.
        #[arg(short, long, default_value_t = 0.5)]
        prob: f64,
        /// Guarantee at least one cover exists.
        #[arg(short, long)]
        guarantee: bool,
    },
    /// A Sudoku puzzle encoded as constraint rows.
    Sudoku {
        /// Instance file to write.
        #[arg(short, long, default_value = "test/in.txt")]
        output: PathBuf,
        /// Puzzle side; must be a perfect square.
        #[arg(short, long, default_value_t = 9)]
        dim: usize,
        /// Share of cells left empty, from 0 to 1.
        #[arg(long, default_value_t = 0.3)]
        difficulty: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info")); // RUST_LOG

    match Cli::parse().command {
        Command::Ec {
            input,
            output,
            time,
            plus,
        } => run_search(&input, &output, time, plus),
        Command::Gen { family } => generate(family),
        Command::Compare { input } => compare(&input),
    }
}

fn run_search(
    input: &PathBuf,
    output: &PathBuf,
    time: Option<u64>,
    plus: bool,
) -> anyhow::Result<()> {
    let instance = read_instance(input)
        .with_context(|| format!("failed to read instance {}", input.display()))?;
    info!(
        "loaded a {}x{} instance from {}",
        instance.matrix.n(),
        instance.matrix.m(),
        input.display()
    );

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))
        .context("failed to install the interrupt handler")?;

    let options = SearchOptions {
        plus,
        time_limit: time.map(Duration::from_secs),
        stop: Some(stop),
    };
    let report = search(&instance.matrix, &options);

    write_report(output, &instance.matrix, &instance.kind, &report)
        .with_context(|| format!("failed to write result {}", output.display()))?;
    println!("Output file created at \"{}\".", output.display());
    Ok(())
}

fn generate(family: GenCommand) -> anyhow::Result<()> {
    let mut rng = thread_rng();

    let output = match family {
        GenCommand::Rand {
            output,
            mdim,
            ndim,
            prob,
            guarantee,
        } => {
            let inst = rand_inst::generate(mdim, ndim, prob, guarantee, &mut rng)
                .context("failed to generate a random instance")?;
            rand_inst::write_instance(&output, &inst)
                .with_context(|| format!("failed to write instance {}", output.display()))?;
            output
        }
        GenCommand::Sudoku {
            output,
            dim,
            difficulty,
        } => {
            let inst = sudoku::generate(dim, difficulty, &mut rng)
                .context("failed to generate a sudoku instance")?;
            sudoku::write_instance(&output, &inst)
                .with_context(|| format!("failed to write instance {}", output.display()))?;
            output
        }
    };

    println!("Instance created at \"{}\".", output.display());
    Ok(())
}

fn compare(paths: &[PathBuf]) -> anyhow::Result<()> {
    let comparison = compare_results(paths).context("failed to compare result files")?;

    if comparison.all_equal {
        println!("The results are equal.");
        println!(
            "Fastest was {} with execution time: {}s",
            paths[comparison.fastest].display(),
            comparison.fastest_time.as_secs_f64()
        );
    } else {
        println!("The results are NOT equal.");
    }
    Ok(())
}
