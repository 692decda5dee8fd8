use anyhow::Result;
use clap::Parser;
use quota::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
