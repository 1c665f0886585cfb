// Wed Jan 28 2026 - Alex

use colored::Colorize;

fn main() {
    if let Err(e) = partition_orchestrator::ui::cli::run() {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}
