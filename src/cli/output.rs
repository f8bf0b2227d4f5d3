use chrono::{Local, SecondsFormat};
use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::idea::{Idea, Status};
use crate::ops::import::ImportReport;
use crate::ops::view::{SortKey, StatusFilter};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct IdeaListJson<'a> {
    pub board: &'a str,
    pub filter: StatusFilter,
    pub sort: SortKey,
    pub ideas: Vec<&'a Idea>,
}

#[derive(Serialize)]
pub struct StatusCountJson {
    pub status: Status,
    pub count: usize,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub statuses: Vec<StatusCountJson>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ImportJson<'a> {
    pub dry_run: bool,
    pub imported: &'a [Idea],
    pub already_present: usize,
    pub blank: usize,
}

#[derive(Serialize)]
pub struct RecoveryEntryJson<'a> {
    pub timestamp: String,
    pub category: String,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<(&'a str, &'a str)>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub body: &'a str,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn stats_to_json(counts: &[(Status, usize)]) -> StatsJson {
    StatsJson {
        statuses: counts
            .iter()
            .map(|&(status, count)| StatusCountJson { status, count })
            .collect(),
        total: counts.iter().map(|(_, n)| n).sum(),
    }
}

pub fn import_to_json(report: &ImportReport, dry_run: bool) -> ImportJson<'_> {
    ImportJson {
        dry_run,
        imported: &report.imported,
        already_present: report.already_present,
        blank: report.blank,
    }
}

pub fn recovery_to_json(entry: &RecoveryEntry) -> RecoveryEntryJson<'_> {
    RecoveryEntryJson {
        timestamp: entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        category: entry.category.to_string(),
        description: &entry.description,
        fields: entry
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect(),
        body: &entry.body,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One-line summary: status, id, title, then the classification.
pub fn format_idea_line(idea: &Idea) -> String {
    format!(
        "[{}] {} {}  ({}, {}, effort {}, potential {})",
        idea.status,
        idea.id,
        idea.title,
        idea.category,
        idea.time_horizon,
        idea.effort,
        idea.potential
    )
}

/// Detailed view of a single idea
pub fn format_idea_detail(idea: &Idea) -> Vec<String> {
    let mut lines = vec![
        idea.title.clone(),
        format!("id: {}", idea.id),
        format!("status: {}", idea.status),
        format!("category: {}", idea.category),
        format!("horizon: {}", idea.time_horizon),
        format!("effort: {}", idea.effort),
        format!("potential: {}", idea.potential),
        format!(
            "created: {}",
            idea.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
    ];
    if !idea.one_liner.is_empty() {
        lines.push(String::new());
        lines.push(idea.one_liner.clone());
    }
    lines
}

/// Board header plus one line per idea in the projection
pub fn format_board(
    name: &str,
    filter: StatusFilter,
    sort: SortKey,
    ideas: &[&Idea],
) -> Vec<String> {
    let mut lines = vec![format!("== {} ({}, sort: {}) ==", name, filter, sort)];
    lines.push(String::new());
    if ideas.is_empty() {
        match filter {
            StatusFilter::All => lines.push("No ideas yet. Capture one with `idea add`.".to_string()),
            StatusFilter::Only(status) => lines.push(format!("No ideas in {}.", status)),
        }
        return lines;
    }
    lines.extend(ideas.iter().map(|idea| format_idea_line(idea)));
    lines
}

/// Per-status counts with a total
pub fn format_stats(counts: &[(Status, usize)]) -> Vec<String> {
    let width = Status::ALL.iter().map(|s| s.label().len()).max().unwrap_or(0);
    let mut lines: Vec<String> = counts
        .iter()
        .map(|(status, n)| format!("  {:<width$}  {}", status.label(), n, width = width))
        .collect();
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    lines.push(format!("  {:<width$}  {}", "Total", total, width = width));
    lines
}

/// Summary of a legacy import
pub fn format_import(report: &ImportReport, dry_run: bool) -> Vec<String> {
    let verb = if dry_run { "would import" } else { "imported" };
    let mut lines = vec![format!("{} {} idea(s)", verb, report.imported.len())];
    lines.extend(report.imported.iter().map(|idea| format!("  {}", format_idea_line(idea))));
    if report.already_present > 0 {
        lines.push(format!("skipped {} already on the board", report.already_present));
    }
    if report.blank > 0 {
        lines.push(format!("skipped {} with no text", report.blank));
    }
    lines
}

/// One recovery entry, header then fields then body
pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {}: {}",
        entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for body_line in entry.body.lines() {
        lines.push(format!("    {}", body_line));
    }
    lines
}
