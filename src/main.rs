use std::fs;
use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod apted;
#[cfg(test)]
mod all_possible_mappings;
mod cost;
mod corpus;
mod error;
mod indexing;
mod parsing;

use apted::Apted;
use cost::UnitCostModel;
use indexing::AptedIndex;
use parsing::{parse_tree, LabelDict};

/// Tree edit distance (APTED) utility
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the unit-cost tree edit distance between two trees
    Distance {
        /// First tree in bracket notation, or @path to read it from a file
        t1: String,
        /// Second tree in bracket notation, or @path to read it from a file
        t2: String,
    },
    /// Run a JSON {testID, t1, t2, d} correctness corpus
    Corpus {
        /// Dataset file of test cases
        #[arg(short, long, value_name = "FILE")]
        dataset_path: PathBuf,
    },
    /// Run a JSON {testID, t1, t2} batch with no ground truth, timing the engine
    Throughput {
        /// Dataset file of throughput cases
        #[arg(short, long, value_name = "FILE")]
        dataset_path: PathBuf,
    },
}

/// Reads `arg` as a literal tree string, or as file contents if it starts with `@`.
fn read_tree_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading tree file {path}")),
        None => Ok(arg.to_owned()),
    }
}

fn run_distance(t1_arg: &str, t2_arg: &str) -> Result<()> {
    let t1_str = read_tree_arg(t1_arg)?;
    let t2_str = read_tree_arg(t2_arg)?;

    let mut label_dict = LabelDict::new();
    let t1 = parse_tree(&t1_str, &mut label_dict)?;
    let t2 = parse_tree(&t2_str, &mut label_dict)?;

    let cost_model = UnitCostModel;
    let idx1 = AptedIndex::build(&t1, &cost_model)?;
    let idx2 = AptedIndex::build(&t2, &cost_model)?;

    let mut apted = Apted::new(&cost_model);
    let distance = apted.compute_edit_distance(&idx1, &idx2);
    println!("{distance}");
    Ok(())
}

fn run_corpus(dataset_path: &PathBuf) -> Result<()> {
    let json = fs::read_to_string(dataset_path)
        .with_context(|| format!("reading corpus file {}", dataset_path.display()))?;
    let cases = corpus::load_test_cases(&json).context("parsing corpus JSON")?;

    let cost_model = UnitCostModel;
    let mut passed = 0usize;
    let mut failed = 0usize;

    for case in &cases {
        let mut label_dict = LabelDict::new();
        let t1 = parse_tree(&case.t1, &mut label_dict)?;
        let t2 = parse_tree(&case.t2, &mut label_dict)?;
        let idx1 = AptedIndex::build(&t1, &cost_model)?;
        let idx2 = AptedIndex::build(&t2, &cost_model)?;
        let mut apted = Apted::new(&cost_model);
        let got = apted.compute_edit_distance(&idx1, &idx2);

        if (got - case.d).abs() < f64::EPSILON {
            passed += 1;
            println!("PASS {}: {got}", case.test_id);
        } else {
            failed += 1;
            println!("FAIL {}: expected {}, got {got}", case.test_id, case.d);
        }
    }

    println!("{passed} passed, {failed} failed, {} total", cases.len());
    if failed > 0 {
        exit(1);
    }
    Ok(())
}

fn run_throughput(dataset_path: &PathBuf) -> Result<()> {
    let json = fs::read_to_string(dataset_path)
        .with_context(|| format!("reading throughput file {}", dataset_path.display()))?;
    let cases = corpus::load_throughput_cases(&json).context("parsing throughput JSON")?;

    let cost_model = UnitCostModel;
    let mut total_subproblems = 0u64;
    let start = Instant::now();

    for case in &cases {
        let mut label_dict = LabelDict::new();
        let t1 = parse_tree(&case.t1, &mut label_dict)?;
        let t2 = parse_tree(&case.t2, &mut label_dict)?;
        let idx1 = AptedIndex::build(&t1, &cost_model)?;
        let idx2 = AptedIndex::build(&t2, &cost_model)?;
        let mut apted = Apted::new(&cost_model);
        apted.compute_edit_distance(&idx1, &idx2);
        total_subproblems += apted.subproblem_count();
    }

    let elapsed = start.elapsed();
    println!(
        "{} pairs in {:.3?} ({} subproblems total)",
        cases.len(),
        elapsed,
        total_subproblems
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Distance { t1, t2 } => run_distance(t1, t2),
        Command::Corpus { dataset_path } => run_corpus(dataset_path),
        Command::Throughput { dataset_path } => run_throughput(dataset_path),
    }
}
