use clap::Parser;
use fslocate::cli::Cli;
use fslocate::db::DatabaseConnector;
use fslocate::error::LocateError;
use fslocate::locate;
use std::io::{self, BufWriter};
use std::process;

fn main() {
    // stdout carries only paths; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut out = BufWriter::new(io::stdout().lock());
    let result = locate::run(
        &cli,
        |name| std::env::var(name).ok(),
        &DatabaseConnector,
        &mut out,
    );
    // Flush whatever was printed before an error; process::exit skips destructors
    drop(out);

    if let Err(e) = result {
        if e.is_broken_pipe() {
            return;
        }
        match &e {
            LocateError::Usage => println!("ERROR: {e}"),
            _ => eprintln!("Error: {e}"),
        }
        process::exit(e.exit_code());
    }
}
