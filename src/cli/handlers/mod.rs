mod init;
pub use init::cmd_init;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io;
use crate::io::config_io::{self, ConfigKey};
use crate::io::recovery;
use crate::io::state::{self, ViewState};
use crate::io::storage::FileStorage;
use crate::model::board::Board;
use crate::model::draft::Draft;
use crate::model::idea::{Idea, Status, iso_millis};
use crate::ops::import;
use crate::ops::store::IdeaStore;
use crate::ops::view::{self, SortKey, StatusFilter};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let board_dir = board_io::resolve_board_dir(cli.board_dir.as_deref().map(Path::new));

    match cli.command {
        Commands::Init(args) => cmd_init(&board_dir, args),

        // Capture and triage
        Commands::Add(args) => cmd_add(&board_dir, args, json),
        Commands::Status(args) => cmd_status(&board_dir, args.id, &args.status, json),
        Commands::Next(args) => set_status(&board_dir, args.id, Status::NextUp, json),
        Commands::Start(args) => set_status(&board_dir, args.id, Status::InMotion, json),
        Commands::Rm(args) => cmd_rm(&board_dir, args),

        // Read commands
        Commands::List(args) => cmd_list(&board_dir, args, json),
        Commands::Show(args) => cmd_show(&board_dir, args.id, json),
        Commands::Stats => cmd_stats(&board_dir, json),

        // Maintenance
        Commands::ImportLegacy(args) => cmd_import_legacy(&board_dir, args, json),
        Commands::Config(args) => cmd_config(&board_dir, args),
        Commands::Recovery(args) => cmd_recovery(&board_dir, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store(board: &Board) -> IdeaStore<FileStorage> {
    IdeaStore::load(FileStorage::new(&board.dir))
}

/// Turn a failed save into a command error so the exit status reflects it.
fn finish(store: &IdeaStore<FileStorage>) -> CmdResult {
    if store.save_failed() {
        return Err("changes could not be saved; they are kept in the recovery log (see `idea recovery`)".into());
    }
    Ok(())
}

fn find_idea(store: &IdeaStore<FileStorage>, id: u64) -> Result<&Idea, String> {
    store.get(id).ok_or_else(|| format!("idea not found: {}", id))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// View state is a convenience; failing to store it never fails a command.
fn remember_view_state(dir: &Path, view_state: &ViewState) {
    if let Err(e) = state::write_view_state(dir, view_state) {
        tracing::warn!(error = %e, "could not write .state.json");
    }
}

fn confirm_delete(idea: &Idea) -> std::io::Result<bool> {
    eprint!("Delete this idea? \"{}\" [y/n] ", idea.title);
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

// ---------------------------------------------------------------------------
// Capture and triage handlers
// ---------------------------------------------------------------------------

fn cmd_add(dir: &Path, args: AddArgs, json: bool) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let mut view_state = state::read_view_state(&board.dir).unwrap_or_default();

    let mut draft = Draft::new(board.config.draft);
    if let Some(category) = view_state.last_category {
        draft.set_category(category);
    }
    draft.set_title(args.title);
    if let Some(one_liner) = args.one_liner {
        draft.set_one_liner(one_liner);
    }
    if let Some(category) = args.category.as_deref() {
        draft.set_category(category.parse()?);
    }
    if let Some(horizon) = args.horizon.as_deref() {
        draft.set_time_horizon(horizon.parse()?);
    }
    if let Some(effort) = args.effort.as_deref() {
        draft.set_effort(effort.parse()?);
    }
    if let Some(potential) = args.potential.as_deref() {
        draft.set_potential(potential.parse()?);
    }
    if let Some(status) = args.status.as_deref() {
        draft.set_status(status.parse()?);
    }

    let mut store = open_store(&board);
    // A blank title is dropped without a message, like an empty form submit.
    let Some(id) = draft.submit(&mut store) else {
        return Ok(());
    };

    view_state.last_category = Some(draft.category());
    remember_view_state(&board.dir, &view_state);
    finish(&store)?;

    if json {
        print_json(find_idea(&store, id)?)
    } else {
        println!("{}", id);
        Ok(())
    }
}

fn cmd_status(dir: &Path, id: u64, status: &str, json: bool) -> CmdResult {
    let status: Status = status.parse()?;
    set_status(dir, id, status, json)
}

fn set_status(dir: &Path, id: u64, status: Status, json: bool) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let mut store = open_store(&board);

    if !store.set_status(id, status) {
        return Err(format!("idea not found: {}", id).into());
    }
    finish(&store)?;

    let idea = find_idea(&store, id)?;
    if json {
        print_json(idea)
    } else {
        println!("{}", format_idea_line(idea));
        Ok(())
    }
}

fn cmd_rm(dir: &Path, args: RmArgs) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let mut store = open_store(&board);
    find_idea(&store, args.id)?;

    let mut prompt_error = None;
    let removed = store.remove(args.id, |idea| {
        if args.yes {
            return true;
        }
        confirm_delete(idea).unwrap_or_else(|e| {
            prompt_error = Some(e);
            false
        })
    });
    if let Some(e) = prompt_error {
        return Err(e.into());
    }
    if !removed {
        println!("cancelled");
        return Ok(());
    }

    finish(&store)?;
    println!("deleted {}", args.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(dir: &Path, args: ListArgs, json: bool) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let mut view_state = state::read_view_state(&board.dir).unwrap_or_default();

    let filter = match args.status.as_deref() {
        Some(s) => s.parse::<StatusFilter>()?,
        None => view_state.filter,
    };
    let sort = match args.sort.as_deref() {
        Some(s) => SortKey::from_key(s),
        None => view_state.sort,
    };
    if args.status.is_some() || args.sort.is_some() {
        view_state.filter = filter;
        view_state.sort = sort;
        remember_view_state(&board.dir, &view_state);
    }

    let store = open_store(&board);
    let ideas = view::project(store.ideas(), filter, sort);

    if json {
        print_json(&IdeaListJson {
            board: &board.config.board.name,
            filter,
            sort,
            ideas,
        })
    } else {
        for line in format_board(&board.config.board.name, filter, sort, &ideas) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_show(dir: &Path, id: u64, json: bool) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let store = open_store(&board);
    let idea = find_idea(&store, id)?;

    if json {
        print_json(idea)
    } else {
        for line in format_idea_detail(idea) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_stats(dir: &Path, json: bool) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let store = open_store(&board);
    let counts = view::status_counts(store.ideas());

    if json {
        print_json(&stats_to_json(&counts))
    } else {
        for line in format_stats(&counts) {
            println!("{}", line);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Maintenance handlers
// ---------------------------------------------------------------------------

fn cmd_import_legacy(dir: &Path, args: ImportLegacyArgs, json: bool) -> CmdResult {
    let board = board_io::load_board(dir)?;
    let mut store = open_store(&board);

    let report = import::import_legacy(&mut store, &board.config.draft, args.dry_run)?;
    finish(&store)?;

    if json {
        print_json(&import_to_json(&report, args.dry_run))
    } else {
        for line in format_import(&report, args.dry_run) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_config(dir: &Path, args: ConfigCmd) -> CmdResult {
    match args.action {
        ConfigAction::Get(get) => {
            let key: ConfigKey = get.key.parse()?;
            let board = board_io::load_board(dir)?;
            println!("{}", key.get(&board.config));
        }
        ConfigAction::Set(set) => {
            let key: ConfigKey = set.key.parse()?;
            let value = key.canonical_value(&set.value)?;
            // Fail early on a missing board rather than creating a stray directory.
            board_io::load_board(dir)?;
            let (_config, mut doc) = config_io::read_config(dir)?;
            config_io::set_value(&mut doc, key, &value);
            config_io::write_config(dir, &doc)?;
            println!("{} = {}", key.name(), value);
        }
    }
    Ok(())
}

fn cmd_recovery(dir: &Path, args: RecoveryCmd, json: bool) -> CmdResult {
    match args.action {
        Some(RecoveryAction::Path) => {
            let log_path: PathBuf = recovery::recovery_log_path(dir);
            let abs = std::path::absolute(&log_path).unwrap_or(log_path);
            println!("{}", abs.display());
            return Ok(());
        }
        Some(RecoveryAction::Prune(prune)) => return cmd_recovery_prune(dir, prune, json),
        None => {}
    }

    let entries = recovery::read_recovery_entries(dir, Some(args.limit.unwrap_or(10)));
    if json {
        let out: Vec<_> = entries.iter().map(recovery_to_json).collect();
        return print_json(&out);
    }

    if entries.is_empty() {
        println!("recovery log is empty");
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_recovery_entry(entry) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_recovery_prune(dir: &Path, args: RecoveryPruneArgs, json: bool) -> CmdResult {
    let before = match args.before.as_deref() {
        Some(raw) => Some(
            iso_millis::parse(raw)
                .ok_or_else(|| format!("invalid --before \"{}\" (expected YYYY-MM-DD or RFC 3339)", raw))?,
        ),
        None => None,
    };
    let removed = recovery::prune_recovery(dir, before, args.all)?;

    if json {
        print_json(&serde_json::json!({ "removed": removed }))
    } else {
        println!("removed {} recovery entr{}", removed, if removed == 1 { "y" } else { "ies" });
        Ok(())
    }
}
