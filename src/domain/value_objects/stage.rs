//! Phase, location and lifecycle stage value objects
//!
//! A configured command belongs to exactly one phase×location bucket. The
//! buckets plus the transfer itself form the fixed lifecycle order:
//! pre-local → pre-remote → transfer → post-local → post-remote.

use serde::{Deserialize, Serialize};

/// When a command runs relative to the transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pre,
    Post,
}

/// Where a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Local,
    Remote,
}

/// A step of the deploy lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PreLocal,
    PreRemote,
    Transfer,
    PostLocal,
    PostRemote,
}

impl Stage {
    /// Lifecycle order
    pub const ORDER: [Stage; 5] = [
        Stage::PreLocal,
        Stage::PreRemote,
        Stage::Transfer,
        Stage::PostLocal,
        Stage::PostRemote,
    ];

    /// The command bucket for a phase and location
    pub fn bucket(phase: Phase, location: Location) -> Stage {
        match (phase, location) {
            (Phase::Pre, Location::Local) => Stage::PreLocal,
            (Phase::Pre, Location::Remote) => Stage::PreRemote,
            (Phase::Post, Location::Local) => Stage::PostLocal,
            (Phase::Post, Location::Remote) => Stage::PostRemote,
        }
    }

    /// Phase and location of a command stage (`None` for the transfer)
    pub fn phase_location(&self) -> Option<(Phase, Location)> {
        match self {
            Stage::PreLocal => Some((Phase::Pre, Location::Local)),
            Stage::PreRemote => Some((Phase::Pre, Location::Remote)),
            Stage::PostLocal => Some((Phase::Post, Location::Local)),
            Stage::PostRemote => Some((Phase::Post, Location::Remote)),
            Stage::Transfer => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreLocal => "pre-local",
            Stage::PreRemote => "pre-remote",
            Stage::Transfer => "transfer",
            Stage::PostLocal => "post-local",
            Stage::PostRemote => "post-remote",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
