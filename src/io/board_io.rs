use std::fs;
use std::path::{Path, PathBuf};

use crate::model::board::Board;
use crate::model::config::BoardConfig;

/// Environment variable that points at the board directory.
pub const BOARD_DIR_ENV: &str = "IDEA_FACTORY_DIR";

/// Error type for board I/O operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("no idea board at {0} (run `idea init` first)")]
    NotABoard(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Pick the board directory: explicit override, then `$IDEA_FACTORY_DIR`,
/// then `$XDG_DATA_HOME/idea-factory`, then `~/.local/share/idea-factory`.
pub fn resolve_board_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var(BOARD_DIR_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    let data_dir = std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".local").join("share"));
    data_dir.join("idea-factory")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

pub fn config_path(board_dir: &Path) -> PathBuf {
    board_dir.join("config.toml")
}

/// Load the board at `dir`. The directory must exist; config.toml is optional.
pub fn load_board(dir: &Path) -> Result<Board, BoardError> {
    if !dir.is_dir() {
        return Err(BoardError::NotABoard(dir.to_path_buf()));
    }

    let path = config_path(dir);
    let config = if path.exists() {
        let text = fs::read_to_string(&path).map_err(|e| BoardError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str::<BoardConfig>(&text)?
    } else {
        BoardConfig::default()
    };

    Ok(Board {
        dir: dir.to_path_buf(),
        config,
    })
}
