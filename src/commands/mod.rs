//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.

pub mod run;
pub mod completions;

use std::str::FromStr;

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("Workload verb is unknown")]
    UnknownVerb,
    #[error("Workload line is missing an argument")]
    MissingArgument,
    #[error("One of the parameters was out of range")]
    OutOfRange,
    #[error("File was never opened")]
    UnknownFile
}

/// Verbs that may appear in a workload script
#[derive(PartialEq,Clone,Copy,Debug)]
pub enum Verb {
    PowerOn,
    PowerOff,
    Open,
    Close,
    Seek,
    Read,
    Write,
    WriteHex,
    Fill
}

impl FromStr for Verb {
    type Err = CommandError;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "poweron" => Ok(Self::PowerOn),
            "poweroff" => Ok(Self::PowerOff),
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            "seek" => Ok(Self::Seek),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "writex" => Ok(Self::WriteHex),
            "fill" => Ok(Self::Fill),
            _ => Err(CommandError::UnknownVerb)
        }
    }
}
