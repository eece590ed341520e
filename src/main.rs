use clap::Parser;
use trendwatch::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
