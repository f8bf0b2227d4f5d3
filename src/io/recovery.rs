use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;

/// Size past which the oldest entries are trimmed before the next append.
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- idea-factory recovery log: append-only
     Ideas that could not be saved, unreadable board data that was
     replaced, and deleted ideas end up here.
     View with: idea recovery
     Prune old entries: idea recovery prune
     Safe to delete once you have what you need. -->

---
";

/// Separator between the timestamp and the category in an entry header.
const HEADER_SEP: &str = " | ";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Stored data could not be parsed and will be replaced
    Load,
    /// A save failed; the body holds what should have been written
    Write,
    /// An idea was deleted on request
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Load => write!(f, "load"),
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Delete => write!(f, "delete"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "load" => Some(RecoveryCategory::Load),
            "write" => Some(RecoveryCategory::Write),
            "delete" => Some(RecoveryCategory::Delete),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// True for unreadable data identical to the newest `load` entry in
    /// `earlier` (oldest first), so a corrupt slot is kept only once.
    pub fn repeats(&self, earlier: &[RecoveryEntry]) -> bool {
        self.category == RecoveryCategory::Load
            && earlier
                .iter()
                .rev()
                .find(|e| e.category == RecoveryCategory::Load)
                .is_some_and(|last| {
                    last.body.trim_end_matches('\n') == self.body.trim_end_matches('\n')
                })
    }

    /// Format this entry as a markdown block for the recovery log.
    fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "## {}{}{}: {}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            HEADER_SEP,
            self.category,
            self.description,
        ));
        out.push('\n');

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            let fence = body_fence(&self.body);
            out.push('\n');
            out.push_str(&fence);
            out.push_str("text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }

        out.push('\n');
        out.push_str("---\n");
        out
    }
}

/// A backtick fence longer than any backtick run opening a body line.
fn body_fence(body: &str) -> String {
    let longest = body
        .lines()
        .map(|l| l.len() - l.trim_start_matches('`').len())
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

// ---------------------------------------------------------------------------
// Paths and writes
// ---------------------------------------------------------------------------

/// Return the path to the recovery log file.
pub fn recovery_log_path(board_dir: &Path) -> PathBuf {
    board_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append a recovery entry to the log. Errors are swallowed and reported as warnings.
pub fn log_recovery(board_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(board_dir, &entry) {
        tracing::debug!(
            category = %entry.category,
            error = %e,
            "could not write to recovery log"
        );
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn log_recovery_inner(board_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(board_dir);
    let existing = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    if entry.category == RecoveryCategory::Load && entry.repeats(&parse_entries(&existing)) {
        tracing::debug!(description = %entry.description, "already in recovery log");
        return Ok(());
    }
    if existing.len() as u64 > MAX_LOG_SIZE
        && let Err(e) = trim_log(&path, &existing)
    {
        tracing::debug!(error = %e, "could not trim recovery log");
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Drop entries older than [`PRUNE_AGE_DAYS`], then the oldest remaining
/// ones, until the log fits in [`MAX_LOG_SIZE`].
fn trim_log(path: &Path, content: &str) -> io::Result<()> {
    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let mut entries: Vec<RecoveryEntry> = parse_entries(content)
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect();

    let mut size: u64 = entries.iter().map(|e| e.to_markdown().len() as u64).sum();
    let mut oldest_kept = 0;
    while size > MAX_LOG_SIZE && oldest_kept < entries.len() {
        size -= entries[oldest_kept].to_markdown().len() as u64;
        oldest_kept += 1;
    }
    entries.drain(..oldest_kept);

    atomic_write(path, render_log(&entries).as_bytes())
}

fn render_log(entries: &[RecoveryEntry]) -> String {
    let mut out = String::from(FILE_HEADER);
    for entry in entries {
        out.push_str(&entry.to_markdown());
    }
    out
}

/// Remove entries older than `before` (default: [`PRUNE_AGE_DAYS`] ago), or
/// every entry with `all`. Returns how many were removed.
pub fn prune_recovery(
    board_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(board_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let entries = parse_entries(&content);
    let total = entries.len();
    let kept: Vec<RecoveryEntry> = if all {
        Vec::new()
    } else {
        let cutoff =
            before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
        entries.into_iter().filter(|e| e.timestamp >= cutoff).collect()
    };

    atomic_write(&path, render_log(&kept).as_bytes())?;
    Ok(total - kept.len())
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read recovery entries, most recent first.
pub fn read_recovery_entries(board_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let content = match std::fs::read_to_string(recovery_log_path(board_dir)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

/// Parse all entries from the log content, oldest first.
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some(header) = line.strip_prefix("## ") else {
            continue;
        };
        let Some((timestamp, category, description)) = parse_entry_header(header) else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        let mut fence: Option<&str> = None;

        for line in lines.by_ref() {
            if let Some(open) = fence {
                if line == open {
                    fence = None;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                let ticks = line.len() - line.trim_start_matches('`').len();
                fence = Some(&line[..ticks]);
                continue;
            }
            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            fields,
            body,
        });
    }

    entries
}

/// Parse an entry header: `<timestamp> | <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp_str, rest) = header.split_once(HEADER_SEP)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);
    let (category_str, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::parse_category(category_str)?;
    Some((timestamp, category, description.to_string()))
}
