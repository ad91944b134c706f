//! json-flatten: flatten a directory of JSON documents into one table.
//!
//! Usage:
//!   # Preview the combined table
//!   json-flatten ./data
//!
//!   # Write CSV, descend into subdirectories, log failures to a file
//!   json-flatten ./data --recursive --output flat.csv --log-file flatten.log
//!
//!   # Print the unified schema as JSON
//!   json-flatten ./data --print-schema

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rust_json_flatten::execution::ExecutionOptions;
use rust_json_flatten::ingestion::{CompositeObserver, FileObserver, FlattenObserver, SourceOptions, StdErrObserver};
use rust_json_flatten::pipeline::{run, RunOptions};
use rust_json_flatten::sink::{render_report, write_csv_to_path};

#[derive(Parser, Debug)]
#[command(name = "json-flatten")]
#[command(about = "Flatten heterogeneous JSON documents into a single table", long_about = None)]
struct Args {
    /// Input directory (or a single file)
    #[arg(value_name = "DIR")]
    input: PathBuf,

    /// File-name pattern selecting documents
    #[arg(long, default_value = "*.json")]
    pattern: String,

    /// Descend into subdirectories
    #[arg(long)]
    recursive: bool,

    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    threads: Option<usize>,

    /// Write the combined table as CSV
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Rows shown in the preview
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Also append diagnostics to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Print the unified schema as JSON and exit
    #[arg(long)]
    print_schema: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut observers: Vec<Arc<dyn FlattenObserver>> = vec![Arc::new(StdErrObserver)];
    if let Some(path) = &args.log_file {
        observers.push(Arc::new(FileObserver::new(path)));
    }

    let mut execution = ExecutionOptions::default();
    if let Some(n) = args.threads.filter(|n| *n > 0) {
        execution.num_threads = Some(n);
        execution.max_in_flight_documents = n;
    }

    let options = RunOptions {
        sources: SourceOptions {
            pattern: args.pattern.clone(),
            recursive: args.recursive,
        },
        execution,
        observer: Some(Arc::new(CompositeObserver::new(observers))),
        ..RunOptions::new(&args.input)
    };

    let report = match run(&options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.print_schema {
        match serde_json::to_string_pretty(&report.unified.schema) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    print!("{}", render_report(&report, args.limit));

    if let (Some(path), Some(ds)) = (&args.output, &report.dataset) {
        if let Err(e) = write_csv_to_path(ds, path) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
        eprintln!("wrote {} rows to {}", ds.row_count(), path.display());
    }

    eprintln!(
        "documents: attempted={} succeeded={} failed={}",
        report.attempted,
        report.succeeded(),
        report.failures.len()
    );
    ExitCode::SUCCESS
}
