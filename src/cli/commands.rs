use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "idea", about = concat!("idea factory v", env!("CARGO_PKG_VERSION"), " - one tap to dump ideas"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a board in the board directory
    Init(InitArgs),
    /// Capture a new idea
    Add(AddArgs),
    /// Show the board, filtered and sorted
    List(ListArgs),
    /// Show one idea in full
    Show(IdArg),
    /// Change an idea's status
    Status(StatusArgs),
    /// Move an idea to "Next up"
    Next(IdArg),
    /// Move an idea to "In motion"
    Start(IdArg),
    /// Delete an idea
    Rm(RmArgs),
    /// Count ideas per status
    Stats,
    /// Import ideas saved by the single-textarea board
    ImportLegacy(ImportLegacyArgs),
    /// Read or change board settings
    Config(ConfigCmd),
    /// View the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Board setup
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name shown in list headers
    #[arg(long)]
    pub name: Option<String>,
    /// Rewrite config.toml even if the board already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Capture and triage
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Idea title
    pub title: String,
    /// One line description
    #[arg(long, short = 'd')]
    pub one_liner: Option<String>,
    /// Category (default: the category of the last idea added)
    #[arg(long, short)]
    pub category: Option<String>,
    /// Time horizon (this week, this month, this quarter, someday / maybe)
    #[arg(long)]
    pub horizon: Option<String>,
    /// Effort (low, medium, high)
    #[arg(long, short)]
    pub effort: Option<String>,
    /// Potential (high, medium, low)
    #[arg(long, short)]
    pub potential: Option<String>,
    /// Status (parking lot, next up, in motion, on ice, done)
    #[arg(long, short)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Status to show, or "all" (default: last used)
    #[arg(long)]
    pub status: Option<String>,
    /// Sort key: recent, potential, effort (default: last used)
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Idea ID
    pub id: u64,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Idea ID
    pub id: u64,
    /// New status
    pub status: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Idea ID
    pub id: u64,
    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ImportLegacyArgs {
    /// Show what would be imported without saving
    #[arg(long)]
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Settings and maintenance
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting
    Get(ConfigGetArgs),
    /// Change a setting in config.toml
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    /// Setting name, e.g. draft.category
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Setting name, e.g. draft.category
    pub key: String,
    /// New value
    pub value: String,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this date or timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long, conflicts_with = "before")]
    pub all: bool,
}
