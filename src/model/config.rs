use serde::{Deserialize, Serialize};

use super::idea::{Category, Effort, Potential, Status, TimeHorizon};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub board: BoardInfo,
    #[serde(default)]
    pub draft: DraftDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    #[serde(default = "default_board_name")]
    pub name: String,
}

impl Default for BoardInfo {
    fn default() -> Self {
        BoardInfo {
            name: default_board_name(),
        }
    }
}

fn default_board_name() -> String {
    "Idea Factory".to_string()
}

/// Values a fresh draft starts from, and resets to after each commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftDefaults {
    pub category: Category,
    pub time_horizon: TimeHorizon,
    pub effort: Effort,
    pub potential: Potential,
    pub status: Status,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        DraftDefaults {
            category: Category::EnergyHardware,
            time_horizon: TimeHorizon::ThisMonth,
            effort: Effort::Low,
            potential: Potential::Medium,
            status: Status::ParkingLot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: BoardConfig = toml::from_str("").unwrap();
        assert_eq!(config.board.name, "Idea Factory");
        assert_eq!(config.draft, DraftDefaults::default());
    }

    #[test]
    fn test_partial_draft_section() {
        let config: BoardConfig = toml::from_str(
            r#"
[board]
name = "Side projects"

[draft]
category = "Software / SaaS"
effort = "High"
"#,
        )
        .unwrap();
        assert_eq!(config.board.name, "Side projects");
        assert_eq!(config.draft.category, Category::SoftwareSaas);
        assert_eq!(config.draft.effort, Effort::High);
        assert_eq!(config.draft.potential, Potential::Medium);
        assert_eq!(config.draft.status, Status::ParkingLot);
    }
}
