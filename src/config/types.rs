//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CommandDefinition, ServerDefinition};
use crate::domain::value_objects::Stage;
use crate::error::{BeamError, BeamResult};

use super::loader::{self, ConfigWarning};

/// Servers and commands, as read from `beam.json` / `beam.toml` / `beam.yaml`
///
/// Immutable once loaded; `validate` is applied by every loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerDefinition>,

    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
}

impl BeamConfig {
    pub fn new(servers: BTreeMap<String, ServerDefinition>, commands: Vec<CommandDefinition>) -> Self {
        Self { servers, commands }
    }

    /// Load and validate, discarding warnings
    pub fn load(path: &Path) -> BeamResult<Self> {
        Ok(Self::load_with_warnings(path)?.0)
    }

    /// Load and validate, collecting unknown-key warnings
    pub fn load_with_warnings(path: &Path) -> BeamResult<(Self, Vec<ConfigWarning>)> {
        let (config, warnings) = loader::load_with_warnings(path)?;
        config.validate()?;
        Ok((config, warnings))
    }

    /// First config file found in `dir`
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        loader::discover(dir)
    }

    pub fn server(&self, name: &str) -> Option<&ServerDefinition> {
        self.servers.get(name)
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    /// Commands of one phase×location bucket, in configuration order
    pub fn commands_for(&self, stage: Stage) -> impl Iterator<Item = &CommandDefinition> {
        self.commands
            .iter()
            .filter(move |command| command.stage() == stage)
    }

    /// Semantic checks the deserializer can't express
    pub fn validate(&self) -> BeamResult<()> {
        if self.servers.is_empty() {
            return Err(BeamError::invalid("servers", "at least one server is required"));
        }

        for (name, server) in &self.servers {
            if name.trim().is_empty() {
                return Err(BeamError::invalid("servers", "server names can't be empty"));
            }
            for (key, value) in [
                ("host", &server.host),
                ("user", &server.user),
                ("webroot", &server.webroot),
            ] {
                if value.trim().is_empty() {
                    return Err(BeamError::invalid(
                        format!("servers.{}.{}", name, key),
                        "must not be empty",
                    ));
                }
            }
        }

        for (index, command) in self.commands.iter().enumerate() {
            if command.command.trim().is_empty() {
                return Err(BeamError::invalid(
                    format!("commands[{}].command", index),
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }
}
