//! Configuration loading
//!
//! The format follows the file extension. Unknown keys don't fail the load;
//! they are collected through `serde_ignored` and surfaced as warnings.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BeamError, BeamResult};

use super::types::BeamConfig;

/// File names tried, in order, when no config path is given
pub const CONFIG_FILE_NAMES: &[&str] = &["beam.json", "beam.toml", "beam.yaml", "beam.yml"];

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> BeamResult<(BeamConfig, Vec<ConfigWarning>)> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| BeamError::ConfigParse {
        path: path.to_path_buf(),
        message: "unsupported extension; expected .json, .toml, .yaml or .yml".to_string(),
    })?;

    let content = fs::read_to_string(path).map_err(|source| BeamError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let (config, unknown_paths) = parse(&content, format).map_err(|message| {
        BeamError::ConfigParse {
            path: path.to_path_buf(),
            message,
        }
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
                file: path.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((config, warnings))
}

fn parse(content: &str, format: ConfigFormat) -> Result<(BeamConfig, Vec<String>), String> {
    let mut unknown_paths: Vec<String> = Vec::new();

    let config: BeamConfig = match format {
        ConfigFormat::Json => {
            let mut deserializer = serde_json::Deserializer::from_str(content);
            let config = serde_ignored::deserialize(&mut deserializer, |p| {
                unknown_paths.push(p.to_string())
            })
            .map_err(|e| e.to_string())?;
            deserializer.end().map_err(|e| e.to_string())?;
            config
        }
        ConfigFormat::Toml => {
            let deserializer = toml::de::Deserializer::new(content);
            serde_ignored::deserialize(deserializer, |p| unknown_paths.push(p.to_string()))
                .map_err(|e| e.to_string())?
        }
        ConfigFormat::Yaml => {
            let deserializer = serde_yaml_ng::Deserializer::from_str(content);
            serde_ignored::deserialize(deserializer, |p| unknown_paths.push(p.to_string()))
                .map_err(|e| e.to_string())?
        }
    };

    Ok((config, unknown_paths))
}

/// First of `CONFIG_FILE_NAMES` present in `dir`
pub fn discover(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "servers", "commands", "host", "user", "webroot", "branch", "phase", "location",
        "command",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

/// Simple Levenshtein distance for typo detection
fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_bytes.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_typos() {
        assert_eq!(levenshtein("webroot", "webroot"), 0);
        assert_eq!(levenshtein("webrot", "webroot"), 1);
        assert_eq!(levenshtein("hots", "host"), 2);
        assert_eq!(levenshtein("", "user"), 4);
    }

    #[test]
    fn test_suggest_key_only_for_close_matches() {
        assert_eq!(suggest_key("comands"), Some("commands".to_string()));
        assert_eq!(suggest_key("password"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("beam.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("beam.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("beam.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("beam")), None);
    }

    #[test]
    fn test_warning_display() {
        let warning = ConfigWarning {
            key: "hots".to_string(),
            file: PathBuf::from("beam.toml"),
            line: Some(3),
            suggestion: Some("host".to_string()),
        };
        assert_eq!(
            warning.to_string(),
            "unknown key 'hots' in beam.toml:3 (did you mean 'host'?)"
        );
    }
}
