use clap::Parser;
use rugo::cli::Cli;

fn main() -> anyhow::Result<()> {
    color_eyre::install().ok();
    env_logger::init();

    let mut cli = Cli::parse();
    cli.execute()
}
