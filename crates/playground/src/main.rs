mod cli;
mod config;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::List) => run::list(cli.run),
        Some(Command::Preprocess { shader }) => run::preprocess(cli.run, &shader),
        None => run::run(cli.run),
    }
}
