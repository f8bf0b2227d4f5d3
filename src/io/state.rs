use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::idea::Category;
use crate::ops::view::{SortKey, StatusFilter};

/// Session state carried between CLI invocations (written to .state.json)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    /// Last status filter used by `idea list`
    #[serde(default)]
    pub filter: StatusFilter,
    /// Last sort key used by `idea list`
    #[serde(default)]
    pub sort: SortKey,
    /// Category of the last idea added; the next draft starts from it
    #[serde(default)]
    pub last_category: Option<Category>,
}

/// Read .state.json from the board directory
pub fn read_view_state(board_dir: &Path) -> Option<ViewState> {
    let content = fs::read_to_string(board_dir.join(".state.json")).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the board directory
pub fn write_view_state(board_dir: &Path, state: &ViewState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(board_dir.join(".state.json"), content)
}
