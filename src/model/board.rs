use std::path::PathBuf;

use super::config::BoardConfig;

/// A board directory with its parsed configuration
#[derive(Debug, Clone)]
pub struct Board {
    /// Directory holding config.toml, the idea slot and the recovery log
    pub dir: PathBuf,
    /// Parsed config.toml (defaults when the file is absent)
    pub config: BoardConfig,
}
