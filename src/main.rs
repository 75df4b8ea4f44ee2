//! # Command Line Interface
//!
//! The subcommands are in the `commands` module.

mod cli;

use env_logger;
use log::error;
use cartkit::commands;
use cartkit::commands::CommandError;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let main_cmd = cli::build_cli();
    let matches = main_cmd.clone().get_matches();

    // Run a workload

    if let Some(cmd) = matches.subcommand_matches("run") {
        return commands::run::run(cmd);
    }

    // Shell completions

    if let Some(cmd) = matches.subcommand_matches("completions") {
        return commands::completions::generate(main_cmd,cmd);
    }

    error!("No subcommand was found, try `cartkit --help`");
    return Err(Box::new(CommandError::InvalidCommand));
}
