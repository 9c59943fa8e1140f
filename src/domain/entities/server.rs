//! Server and command definitions from the beam config

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::branch::is_remote_branch;
use crate::domain::value_objects::{Location, Phase, Stage};

/// A deploy target, keyed by name in the config's `servers` mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDefinition {
    pub host: String,
    pub user: String,
    pub webroot: String,
    /// Branch every deploy to this server must use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl ServerDefinition {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        webroot: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            webroot: webroot.into(),
            branch: None,
        }
    }

    pub fn with_locked_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// The locked branch, ignoring blank values
    pub fn locked_branch(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    pub fn is_locked(&self) -> bool {
        self.locked_branch().is_some()
    }

    /// Locked to a remote-tracking branch (`remotes/...`)
    pub fn is_locked_remote(&self) -> bool {
        self.locked_branch().is_some_and(is_remote_branch)
    }

    /// `user@host`, as understood by ssh and rsync
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// A configured command, run in its phase×location bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub phase: Phase,
    pub location: Location,
    pub command: String,
}

impl CommandDefinition {
    pub fn new(phase: Phase, location: Location, command: impl Into<String>) -> Self {
        Self {
            phase,
            location,
            command: command.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        Stage::bucket(self.phase, self.location)
    }
}
