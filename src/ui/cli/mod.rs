// Wed Jan 28 2026 - Alex

pub mod args;
pub mod handler;

pub use args::{Args, Command, InitConfigArgs, LocateArgs, RunArgs};
pub use handler::{write_summary, CommandHandler};

use clap::Parser;

pub fn parse_args() -> Args {
    Args::parse()
}

pub fn run() -> anyhow::Result<()> {
    let args = parse_args();
    let handler = CommandHandler::new().with_quiet(args.quiet);
    handler.execute(args)
}
