//! Deployment result entity
//!
//! The outcome of one transfer: an ordered list of per-file entries. The list
//! is fixed at construction; per-kind counts are computed on first request and
//! cached for the lifetime of the result.

use std::cell::OnceCell;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeamError;

const KIND_COUNT: usize = 6;

/// What happened to an entry during the transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Item created or changed locally (directories, symlinks)
    Created,
    /// Item removed from the destination
    Deleted,
    /// File sent to the server
    Sent,
    /// File received from the server
    Received,
    /// Hard link
    Link,
    /// Only attributes changed
    Attributes,
}

impl UpdateKind {
    pub const ALL: [UpdateKind; KIND_COUNT] = [
        UpdateKind::Created,
        UpdateKind::Deleted,
        UpdateKind::Sent,
        UpdateKind::Received,
        UpdateKind::Link,
        UpdateKind::Attributes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Created => "created",
            UpdateKind::Deleted => "deleted",
            UpdateKind::Sent => "sent",
            UpdateKind::Received => "received",
            UpdateKind::Link => "link",
            UpdateKind::Attributes => "attributes",
        }
    }

    fn index(&self) -> usize {
        match self {
            UpdateKind::Created => 0,
            UpdateKind::Deleted => 1,
            UpdateKind::Sent => 2,
            UpdateKind::Received => 3,
            UpdateKind::Link => 4,
            UpdateKind::Attributes => 5,
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateKind {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BeamError::InvalidArgument(format!("update type '{}' doesn't exist", s)))
    }
}

/// Type of the transferred item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
    Symlink,
    Device,
    Special,
}

/// Why an item was considered changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeReason {
    Checksum,
    Size,
    Time,
    Permissions,
    Owner,
    Group,
    Acl,
    Xattr,
}

/// One transferred (or previewed) item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub update: UpdateKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<ChangeReason>,
}

impl ResultEntry {
    pub fn new(update: UpdateKind, path: impl Into<String>) -> Self {
        Self {
            update,
            path: path.into(),
            file_type: None,
            reasons: Vec::new(),
        }
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn with_reasons(mut self, reasons: Vec<ChangeReason>) -> Self {
        self.reasons = reasons;
        self
    }

    /// Entirely new on the receiving side (no attributes compared)
    pub fn is_new(&self) -> bool {
        self.reasons.is_empty() && self.update != UpdateKind::Deleted
    }
}

/// Outcome of a transfer
#[derive(Debug, Clone, Default)]
pub struct DeploymentResult {
    entries: Vec<ResultEntry>,
    counts: OnceCell<[usize; KIND_COUNT]>,
}

impl DeploymentResult {
    pub fn new(entries: Vec<ResultEntry>) -> Self {
        Self {
            entries,
            counts: OnceCell::new(),
        }
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the named update kind
    ///
    /// Fails with `InvalidArgument` when `kind` is not a known update kind.
    pub fn count(&self, kind: &str) -> Result<usize, BeamError> {
        let kind: UpdateKind = kind.parse()?;
        Ok(self.count_of(kind))
    }

    /// Number of entries with the given update kind
    pub fn count_of(&self, kind: UpdateKind) -> usize {
        self.counts()[kind.index()]
    }

    /// Non-zero counts in `UpdateKind::ALL` order
    pub fn summary(&self) -> Vec<(UpdateKind, usize)> {
        UpdateKind::ALL
            .into_iter()
            .map(|kind| (kind, self.count_of(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    fn counts(&self) -> &[usize; KIND_COUNT] {
        self.counts.get_or_init(|| {
            let mut counts = [0; KIND_COUNT];
            for entry in &self.entries {
                counts[entry.update.index()] += 1;
            }
            counts
        })
    }
}

impl PartialEq for DeploymentResult {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'a> IntoIterator for &'a DeploymentResult {
    type Item = &'a ResultEntry;
    type IntoIter = std::slice::Iter<'a, ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<ResultEntry> for DeploymentResult {
    fn from_iter<I: IntoIterator<Item = ResultEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
