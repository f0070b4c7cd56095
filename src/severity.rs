use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::error::Error;

/// The five severity families, ordered from weakest to strongest.
///
/// `-l W` reports warnings and everything stronger, so the `Ord` impl is
/// load-bearing: a check is registered iff its severity is >= the requested
/// level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Severity {
    Convention,
    Style,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn letter(self) -> char {
        match self {
            Severity::Convention => 'C',
            Severity::Style => 'S',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "C" => Ok(Severity::Convention),
            "S" => Ok(Severity::Style),
            "W" => Ok(Severity::Warning),
            "E" => Ok(Severity::Error),
            "F" => Ok(Severity::Fatal),
            _ => Err(Error::bad_arg(format!(
                "unknown severity level '{value}', expected one of C, S, W, E, F"
            ))),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}
