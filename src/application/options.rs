//! Run Options
//!
//! `RawOptions` is what a caller supplies: every field optional, direction
//! still a string. `resolve_options` validates it against the config and
//! produces the immutable `RunOptions` a run works from. Resolution is pure.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::config::BeamConfig;
use crate::domain::entities::ServerDefinition;
use crate::domain::ports::TransferFlags;
use crate::domain::value_objects::Direction;
use crate::error::{BeamError, BeamResult};

pub const DEFAULT_EXPORT_DIR: &str = "_temp";
pub const DEFAULT_EXCLUDES_FILE: &str = ".beam-excludes";

/// `path` accepts a string, or `false` for "no extra path"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOption {
    Flag(bool),
    Path(String),
}

impl From<bool> for PathOption {
    fn from(value: bool) -> Self {
        PathOption::Flag(value)
    }
}

impl From<&str> for PathOption {
    fn from(value: &str) -> Self {
        PathOption::Path(value.to_string())
    }
}

impl From<String> for PathOption {
    fn from(value: String) -> Self {
        PathOption::Path(value)
    }
}

/// Unvalidated options for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    pub direction: Option<String>,
    pub remote: Option<String>,
    pub srcdir: Option<PathBuf>,
    pub branch: Option<String>,
    pub export_dir: Option<String>,
    pub path: Option<PathOption>,
    pub working_copy: Option<bool>,
    pub dry_run: Option<bool>,
    pub checksum: Option<bool>,
    pub delete: Option<bool>,
    pub archive: Option<bool>,
    pub compress: Option<bool>,
    pub delay_updates: Option<bool>,
    pub excludes_file: Option<String>,
}

impl RawOptions {
    /// The three mandatory options
    pub fn new(
        direction: impl Into<String>,
        remote: impl Into<String>,
        srcdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            direction: Some(direction.into()),
            remote: Some(remote.into()),
            srcdir: Some(srcdir.into()),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_export_dir(mut self, export_dir: impl Into<String>) -> Self {
        self.export_dir = Some(export_dir.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathOption>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_working_copy(mut self, working_copy: bool) -> Self {
        self.working_copy = Some(working_copy);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = Some(delete);
        self
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }

    pub fn with_delay_updates(mut self, delay_updates: bool) -> Self {
        self.delay_updates = Some(delay_updates);
        self
    }

    pub fn with_excludes_file(mut self, excludes_file: impl Into<String>) -> Self {
        self.excludes_file = Some(excludes_file.into());
        self
    }

    /// Build from a loosely typed option bag
    ///
    /// Keys use the command-line spelling (`dry-run`, `workingcopy`, ...).
    /// Every value is type-checked; unknown keys are rejected.
    pub fn from_json(value: &Value) -> BeamResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| BeamError::invalid("options", "expected an object"))?;

        let mut raw = RawOptions::default();
        for (key, value) in map {
            match key.as_str() {
                "direction" => raw.direction = Some(expect_string(key, value)?),
                "remote" => raw.remote = Some(expect_string(key, value)?),
                "srcdir" => raw.srcdir = Some(PathBuf::from(expect_string(key, value)?)),
                "branch" => raw.branch = Some(expect_string(key, value)?),
                "exportdir" => raw.export_dir = Some(expect_string(key, value)?),
                "excludesfile" => raw.excludes_file = Some(expect_string(key, value)?),
                "path" => {
                    raw.path = Some(match value {
                        Value::String(s) => PathOption::Path(s.clone()),
                        Value::Bool(b) => PathOption::Flag(*b),
                        other => return Err(type_mismatch(key, "string or bool", other)),
                    })
                }
                "workingcopy" => raw.working_copy = Some(expect_bool(key, value)?),
                "dry-run" => raw.dry_run = Some(expect_bool(key, value)?),
                "checksum" => raw.checksum = Some(expect_bool(key, value)?),
                "delete" => raw.delete = Some(expect_bool(key, value)?),
                "archive" => raw.archive = Some(expect_bool(key, value)?),
                "compress" => raw.compress = Some(expect_bool(key, value)?),
                "delay-updates" => raw.delay_updates = Some(expect_bool(key, value)?),
                _ => return Err(BeamError::invalid(key.as_str(), "unknown option")),
            }
        }
        Ok(raw)
    }
}

fn expect_string(key: &str, value: &Value) -> BeamResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch(key, "string", value))
}

fn expect_bool(key: &str, value: &Value) -> BeamResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| type_mismatch(key, "bool", value))
}

fn type_mismatch(key: &str, expected: &str, value: &Value) -> BeamError {
    let actual = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    BeamError::invalid(key, format!("expected {}, got {}", expected, actual))
}

/// Validated options, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub direction: Direction,
    pub remote: String,
    pub srcdir: PathBuf,
    /// Trimmed; `None` until resolved from the server lock or the VCS
    pub branch: Option<String>,
    pub export_dir: String,
    pub path: Option<String>,
    pub excludes_file: String,
    pub working_copy: bool,
    pub dry_run: bool,
    pub checksum: bool,
    pub delete: bool,
    pub archive: bool,
    pub compress: bool,
    pub delay_updates: bool,
}

impl RunOptions {
    /// The target server; resolution guarantees it exists
    pub fn server<'a>(&self, config: &'a BeamConfig) -> BeamResult<&'a ServerDefinition> {
        config
            .server(&self.remote)
            .ok_or_else(|| unknown_remote(&self.remote, config))
    }

    pub fn transfer_flags(&self) -> TransferFlags {
        TransferFlags {
            dry_run: self.dry_run,
            checksum: self.checksum,
            delete: self.delete,
            archive: self.archive,
            compress: self.compress,
            delay_updates: self.delay_updates,
        }
    }
}

/// Validate and normalize caller options against the config
pub fn resolve_options(raw: RawOptions, config: &BeamConfig) -> BeamResult<RunOptions> {
    let direction = raw
        .direction
        .ok_or_else(|| BeamError::invalid("direction", "is required"))?;
    let direction: Direction = direction
        .parse()
        .map_err(|reason: String| BeamError::invalid("direction", reason))?;

    let remote = raw
        .remote
        .ok_or_else(|| BeamError::invalid("remote", "is required"))?;
    if config.server(&remote).is_none() {
        return Err(unknown_remote(&remote, config));
    }

    let srcdir = raw
        .srcdir
        .ok_or_else(|| BeamError::invalid("srcdir", "is required"))?;
    if srcdir.as_os_str().is_empty() {
        return Err(BeamError::invalid("srcdir", "must not be empty"));
    }

    let branch = raw
        .branch
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    let export_dir = trim_slashes(raw.export_dir.as_deref().unwrap_or(DEFAULT_EXPORT_DIR));
    if export_dir.is_empty() {
        return Err(BeamError::invalid("exportdir", "must not be empty"));
    }
    if Path::new(&export_dir)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(BeamError::invalid(
            "exportdir",
            "must not contain '..' components",
        ));
    }

    let excludes_file = trim_slashes(
        raw.excludes_file
            .as_deref()
            .unwrap_or(DEFAULT_EXCLUDES_FILE),
    );
    if excludes_file.is_empty() {
        return Err(BeamError::invalid("excludesfile", "must not be empty"));
    }

    let path = match raw.path {
        None | Some(PathOption::Flag(false)) => None,
        Some(PathOption::Flag(true)) => {
            return Err(BeamError::invalid("path", "expected a path or false, got true"))
        }
        Some(PathOption::Path(p)) => Some(trim_slashes(&p)).filter(|p| !p.is_empty()),
    };

    Ok(RunOptions {
        direction,
        remote,
        srcdir,
        branch,
        export_dir,
        path,
        excludes_file,
        working_copy: raw.working_copy.unwrap_or(false),
        dry_run: raw.dry_run.unwrap_or(false),
        checksum: raw.checksum.unwrap_or(true),
        delete: raw.delete.unwrap_or(false),
        archive: raw.archive.unwrap_or(true),
        compress: raw.compress.unwrap_or(true),
        delay_updates: raw.delay_updates.unwrap_or(true),
    })
}

fn trim_slashes(value: &str) -> String {
    value.trim_matches('/').to_string()
}

fn unknown_remote(remote: &str, config: &BeamConfig) -> BeamError {
    BeamError::invalid(
        "remote",
        format!(
            "'{}' is not one of: {}",
            remote,
            config.server_names().join(", ")
        ),
    )
}
