//! Interactive command parsing

use std::str::FromStr;
use thiserror::Error;

pub const USAGE: &str = "commands: toggle | status | set <angle> | help | quit";

/// One line of interactive input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Toggle,
    Status,
    Set(f64),
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'set' expects one angle in degrees, got '{0}'")]
    BadAngle(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_ascii_lowercase();
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or("");
        let rest: Vec<&str> = words.collect();

        match (head, rest.as_slice()) {
            ("toggle", []) => Ok(Command::Toggle),
            ("status", []) => Ok(Command::Status),
            ("help" | "?", []) => Ok(Command::Help),
            ("quit" | "exit", []) => Ok(Command::Quit),
            ("set", [angle]) => angle
                .parse::<f64>()
                .ok()
                .filter(|a| a.is_finite())
                .map(Command::Set)
                .ok_or_else(|| CommandError::BadAngle(angle.to_string())),
            ("set", args) => Err(CommandError::BadAngle(args.join(" "))),
            _ => Err(CommandError::Unknown(line.clone())),
        }
    }
}
