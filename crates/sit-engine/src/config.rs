//! Repository configuration (`.sit/config`).
//!
//! The file is a TOML document addressed by dotted keys: `user.name` is the
//! `name` entry of the `[user]` table. Values are set as strings; hand-edited
//! integers and booleans are read back in their TOML spelling.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sit_index::MatchMode;
use toml::{Table, Value};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

pub const DEFAULT_LARGE_FILE_WARN: u64 = 100 << 20;
pub const DEFAULT_LARGE_FILE_LIMIT: u64 = 200 << 20;

/// Key/value configuration backed by a TOML table.
#[derive(Clone, Debug, Default)]
pub struct Config {
    path: Option<PathBuf>,
    table: Table,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`. A missing file is an empty configuration.
    pub fn load(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        let table = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<Table>(&text)
                .map_err(|e| EngineError::InvalidConfig(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Table::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            table,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write back to the file this configuration was loaded from.
    pub fn save(&self) -> EngineResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = toml::to_string(&self.table)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        fs::write(path, text)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Look up a dotted key. `None` means not found.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut segments = key.split('.');
        let mut value = self.table.get(segments.next()?)?;
        for segment in segments {
            value = value.as_table()?.get(segment)?;
        }
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Table(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Like [`get`](Self::get), but a missing key is an error naming it.
    pub fn require(&self, key: &str) -> EngineResult<String> {
        self.get(key).ok_or_else(|| EngineError::MissingConfig {
            key: key.to_string(),
        })
    }

    /// Set a dotted key to a string, creating intermediate tables.
    pub fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let segments: Vec<&str> = key.split('.').collect();
        if segments.len() < 2 || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(EngineError::InvalidConfig(format!(
                "key {key:?} must look like section.name"
            )));
        }
        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| EngineError::InvalidConfig(format!("empty key {key:?}")))?;

        let mut table = &mut self.table;
        for segment in parents {
            let entry = table
                .entry(segment.to_string())
                .or_insert(Value::Table(Table::new()));
            table = match entry {
                Value::Table(t) => t,
                _ => {
                    return Err(EngineError::InvalidConfig(format!(
                        "{segment} in {key} is a value, not a section"
                    )))
                }
            };
        }
        table.insert(leaf.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    /// Every leaf as `(dotted key, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, table: &Table, out: &mut Vec<(String, String)>) {
            for (name, value) in table {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                match value {
                    Value::Table(t) => walk(&key, t, out),
                    Value::String(s) => out.push((key, s.clone())),
                    other => out.push((key, other.to_string())),
                }
            }
        }
        let mut out = Vec::new();
        walk("", &self.table, &mut out);
        out.sort();
        out
    }
}

/// Typed settings derived from a [`Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// `core.path_match`: how directory-scoped operations select paths.
    pub path_match: MatchMode,
    /// `core.large_file_warn`: sizes above this are added with a warning.
    pub large_file_warn: u64,
    /// `core.large_file_limit`: sizes above this are refused.
    pub large_file_limit: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path_match: MatchMode::default(),
            large_file_warn: DEFAULT_LARGE_FILE_WARN,
            large_file_limit: DEFAULT_LARGE_FILE_LIMIT,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> EngineResult<Self> {
        let defaults = Self::default();
        let path_match = match config.get("core.path_match") {
            Some(raw) => raw.parse().map_err(EngineError::InvalidConfig)?,
            None => defaults.path_match,
        };
        Ok(Self {
            path_match,
            large_file_warn: size_setting(config, "core.large_file_warn", defaults.large_file_warn)?,
            large_file_limit: size_setting(config, "core.large_file_limit", defaults.large_file_limit)?,
        })
    }
}

fn size_setting(config: &Config, key: &str, default: u64) -> EngineResult<u64> {
    match config.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| EngineError::InvalidConfig(format!("{key} = {raw:?}: {e}"))),
        None => Ok(default),
    }
}
