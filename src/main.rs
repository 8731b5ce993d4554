mod aggregate;
mod cache;
mod classifier;
mod cli;
mod error;
mod export;
mod filter;
mod fmt;
mod loader;
mod location;
mod models;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Session};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("rupscope=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Session::new(cli.db).and_then(|mut session| cli::execute(&mut session, cli.command));

    match result {
        Ok(out) => {
            if !out.is_empty() {
                println!("{out}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_blocking_source() {
                eprintln!("Pass --db <path> or run `rupscope config set-db <path>`.");
            }
            std::process::exit(1);
        }
    }
}
