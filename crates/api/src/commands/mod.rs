//! Console menu commands
//!
//! Each menu line maps to one [`MenuCommand`]. Transfers additionally ask
//! for a blob size and a [`Scenario`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::simulation::Provider;

/// Input the console could not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown menu choice '{0}'")]
    UnknownChoice(String),

    #[error("invalid blob size '{0}'")]
    InvalidSize(String),

    #[error("unknown scenario '{0}', expected success, failed or retried")]
    UnknownScenario(String),
}

/// How a simulated transfer behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Every segment is stored on the first attempt
    #[default]
    Success,
    /// The first segment fails and the request is abandoned
    Failed,
    /// The first segment fails once and is resent
    Retried,
}

impl Scenario {
    pub const ALL: [Self; 3] = [Self::Success, Self::Failed, Self::Retried];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Retried => "retried",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the full name or its first letter; empty input means success.
impl FromStr for Scenario {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "s" | "success" => Ok(Self::Success),
            "f" | "failed" | "fail" => Ok(Self::Failed),
            "r" | "retried" | "retry" => Ok(Self::Retried),
            other => Err(CommandError::UnknownScenario(other.to_string())),
        }
    }
}

/// One entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    Put(Provider),
    Get(Provider),
    Stats(Provider),
    StatsAll,
    Burst,
    Exit,
}

impl MenuCommand {
    /// Menu order; the choice number is the index plus one.
    pub const ALL: [Self; 9] = [
        Self::Put(Provider::Aws),
        Self::Get(Provider::Aws),
        Self::Stats(Provider::Aws),
        Self::Put(Provider::Azure),
        Self::Get(Provider::Azure),
        Self::Stats(Provider::Azure),
        Self::StatsAll,
        Self::Burst,
        Self::Exit,
    ];

    /// Whether the command asks for a size and a scenario.
    pub const fn is_transfer(&self) -> bool {
        matches!(self, Self::Put(_) | Self::Get(_))
    }

    pub fn description(&self) -> String {
        match self {
            Self::Put(provider) => format!("Put Blob {provider}"),
            Self::Get(provider) => format!("Get Blob {provider}"),
            Self::Stats(provider) => format!("Print stats {provider}"),
            Self::StatsAll => "Print stats Overall".to_string(),
            Self::Burst => "Concurrent burst".to_string(),
            Self::Exit => "EXIT".to_string(),
        }
    }

    /// The numbered menu as printed by the console.
    pub fn menu() -> String {
        let mut menu = String::from("Please select the operation to perform\n");
        for (index, command) in Self::ALL.iter().enumerate() {
            menu.push_str(&format!("{}. {}\n", index + 1, command.description()));
        }
        menu
    }
}

impl FromStr for MenuCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<usize>()
            .ok()
            .and_then(|choice| choice.checked_sub(1))
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| CommandError::UnknownChoice(trimmed.to_string()))
    }
}

/// Parse a blob size in bytes.
pub fn parse_size(input: &str) -> Result<u64, CommandError> {
    let trimmed = input.trim();
    trimmed.parse::<u64>().map_err(|_| CommandError::InvalidSize(trimmed.to_string()))
}
