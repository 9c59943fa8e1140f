//! Direction value object - which way files travel

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of a transfer relative to the local machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Local files are sent to the server
    Up,
    /// Server files are pulled to the local path
    Down,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Up, Direction::Down];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Direction::Up)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Direction::Down)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("'{}' is not one of: up, down", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_directions() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("down".parse::<Direction>(), Ok(Direction::Down));
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert_eq!(err, "'sideways' is not one of: up, down");
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Up".parse::<Direction>().is_err());
    }
}
