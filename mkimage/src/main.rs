//! Main entry point for the mkimage CLI tool

use clap::Parser;
use colored::Colorize;
use mkimage::cli::{Args, init_logger, run_cli};

fn main() {
    let args = Args::parse();
    init_logger(args.verbose, args.quiet);

    if let Err(e) = run_cli(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
