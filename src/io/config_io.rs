use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::io::board_io::{BoardError, config_path};
use crate::model::config::BoardConfig;
use crate::model::idea::{Category, Effort, ParseEnumError, Potential, Status, TimeHorizon};

/// A setting that `idea config` can read or change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BoardName,
    DraftCategory,
    DraftTimeHorizon,
    DraftEffort,
    DraftPotential,
    DraftStatus,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::BoardName,
        ConfigKey::DraftCategory,
        ConfigKey::DraftTimeHorizon,
        ConfigKey::DraftEffort,
        ConfigKey::DraftPotential,
        ConfigKey::DraftStatus,
    ];

    /// Dotted name as written on the command line
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::BoardName => "board.name",
            ConfigKey::DraftCategory => "draft.category",
            ConfigKey::DraftTimeHorizon => "draft.time_horizon",
            ConfigKey::DraftEffort => "draft.effort",
            ConfigKey::DraftPotential => "draft.potential",
            ConfigKey::DraftStatus => "draft.status",
        }
    }

    fn table_and_field(self) -> (&'static str, &'static str) {
        self.name().split_once('.').unwrap_or(("", ""))
    }

    /// Validate a raw value and return the form to store.
    pub fn canonical_value(self, raw: &str) -> Result<String, ConfigError> {
        let label = match self {
            ConfigKey::BoardName => {
                let name = raw.trim();
                if name.is_empty() {
                    return Err(ConfigError::EmptyName);
                }
                return Ok(name.to_string());
            }
            ConfigKey::DraftCategory => Category::from_str(raw)?.label(),
            ConfigKey::DraftTimeHorizon => TimeHorizon::from_str(raw)?.label(),
            ConfigKey::DraftEffort => Effort::from_str(raw)?.label(),
            ConfigKey::DraftPotential => Potential::from_str(raw)?.label(),
            ConfigKey::DraftStatus => Status::from_str(raw)?.label(),
        };
        Ok(label.to_string())
    }

    /// Current effective value (defaults included).
    pub fn get(self, config: &BoardConfig) -> String {
        match self {
            ConfigKey::BoardName => config.board.name.clone(),
            ConfigKey::DraftCategory => config.draft.category.to_string(),
            ConfigKey::DraftTimeHorizon => config.draft.time_horizon.to_string(),
            ConfigKey::DraftEffort => config.draft.effort.to_string(),
            ConfigKey::DraftPotential => config.draft.potential.to_string(),
            ConfigKey::DraftStatus => config.draft.status.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Error type for config edits
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown config key \"{0}\"")]
    UnknownKey(String),
    #[error("board name cannot be empty")]
    EmptyName,
    #[error(transparent)]
    InvalidValue(#[from] ParseEnumError),
}

/// Read the board config, returning both the parsed config and the raw
/// toml_edit document for formatting-preserving edits. A missing file reads
/// as an empty document.
pub fn read_config(board_dir: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), BoardError> {
    let path = config_path(board_dir);
    let text = if path.exists() {
        fs::read_to_string(&path).map_err(|e| BoardError::ReadError {
            path: path.clone(),
            source: e,
        })?
    } else {
        String::new()
    };
    let config: BoardConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(board_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), BoardError> {
    let path = config_path(board_dir);
    fs::write(&path, doc.to_string()).map_err(|e| BoardError::WriteError { path, source: e })?;
    Ok(())
}

/// Set an already-validated value in the document, creating the table if needed.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: ConfigKey, value: &str) {
    let (table, field) = key.table_and_field();
    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[table][field] = toml_edit::value(value);
}
