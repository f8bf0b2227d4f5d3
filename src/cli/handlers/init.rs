use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::board_io;
use crate::io::config_io::{self, ConfigKey};

const CONFIG_TEMPLATE: &str = r##"[board]
name = "Idea Factory"

# --- New ideas ---
# Values a fresh idea starts with; `idea add` flags override them per idea.
# The category of the last idea added carries over to the next one.
# Change with: idea config set draft.<field> <value>

[draft]
category = "Energy / Hardware"       # Energy / Hardware, Software / SaaS, Manufacturing / Ops,
                                     # Content / Education, Personal / Life systems, Other
time_horizon = "This month"          # This week, This month, This quarter, Someday / Maybe
effort = "Low"                       # Low, Medium, High
potential = "Medium"                 # High, Medium, Low
status = "Parking lot"               # Parking lot, Next up, In motion, On ice, Done
"##;

/// Render config.toml for a new board.
fn render_config(name: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let mut doc: toml_edit::DocumentMut = CONFIG_TEMPLATE.parse()?;
    if let Some(name) = name {
        let name = ConfigKey::BoardName.canonical_value(name)?;
        config_io::set_value(&mut doc, ConfigKey::BoardName, &name);
    }
    Ok(doc.to_string())
}

pub fn cmd_init(board_dir: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = board_io::config_path(board_dir);
    if config_path.exists() && !args.force {
        return Err(format!(
            "board already exists at {} (use --force to rewrite config.toml)",
            board_dir.display()
        )
        .into());
    }

    let content = render_config(args.name.as_deref())?;
    fs::create_dir_all(board_dir)?;
    fs::write(&config_path, content)?;
    tracing::info!(dir = %board_dir.display(), "initialized board");

    println!("created board at {}", board_dir.display());
    Ok(())
}
