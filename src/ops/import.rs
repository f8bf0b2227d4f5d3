use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::io::storage::{LEGACY_KEY, Storage, StorageError};
use crate::model::config::DraftDefaults;
use crate::model::idea::{Idea, NewIdea};
use crate::ops::store::{IdeaStore, next_free_id};

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read legacy ideas: {0}")]
    Storage(#[from] StorageError),
    #[error("legacy ideas are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A record from the single-textarea board
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyIdea {
    /// `Date.now()` at creation
    pub id: u64,
    pub text: String,
    /// Locale-formatted creation time; informational only
    #[serde(default)]
    pub created: String,
}

/// Outcome of a legacy import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ideas added (or that would be added, for a dry run)
    pub imported: Vec<Idea>,
    /// Records already on the board
    pub already_present: usize,
    /// Records with no text
    pub blank: usize,
}

/// Convert legacy records into board ideas without touching the store.
///
/// The first non-blank line becomes the title and the rest the one-liner.
/// The legacy id doubles as the creation time. It is kept as the new id
/// unless taken, in which case the next free id is used. A record counts as
/// already present when an idea with its title has its id or was created at
/// its timestamp, so records imported under a fresh id are still recognized.
pub fn plan_legacy_import(
    existing: &[Idea],
    legacy: &[LegacyIdea],
    defaults: &DraftDefaults,
) -> ImportReport {
    let present: HashSet<(u64, &str)> = existing
        .iter()
        .flat_map(|i| {
            let created = u64::try_from(i.created_at.timestamp_millis()).unwrap_or(i.id);
            [(i.id, i.title.as_str()), (created, i.title.as_str())]
        })
        .collect();
    let mut report = ImportReport::default();
    let mut ids: Vec<Idea> = existing.to_vec();

    for record in legacy {
        let Some((title, one_liner)) = split_text(&record.text) else {
            report.blank += 1;
            continue;
        };
        if present.contains(&(record.id, title.as_str())) {
            report.already_present += 1;
            continue;
        }

        let id = if ids.iter().any(|i| i.id == record.id) {
            next_free_id(&ids, record.id)
        } else {
            record.id
        };
        let created_at = i64::try_from(record.id)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default();

        let idea = NewIdea {
            title,
            one_liner,
            category: defaults.category,
            time_horizon: defaults.time_horizon,
            effort: defaults.effort,
            potential: defaults.potential,
            status: defaults.status,
        }
        .into_idea(id, created_at);

        ids.push(idea.clone());
        report.imported.push(idea);
    }

    report
}

/// Import the legacy slot into `store`. An absent slot imports nothing.
/// With `dry_run` the report is computed but the store is left alone.
pub fn import_legacy<S: Storage>(
    store: &mut IdeaStore<S>,
    defaults: &DraftDefaults,
    dry_run: bool,
) -> Result<ImportReport, ImportError> {
    let Some(raw) = store.storage().get_item(LEGACY_KEY)? else {
        return Ok(ImportReport::default());
    };
    let legacy: Vec<LegacyIdea> = serde_json::from_str(&raw)?;
    let report = plan_legacy_import(store.ideas(), &legacy, defaults);

    if !dry_run && !report.imported.is_empty() {
        let added = store.append(report.imported.clone());
        tracing::info!(added, "imported legacy ideas");
    }
    Ok(report)
}

/// Split textarea content into (title, rest). `None` when there is no text.
fn split_text(text: &str) -> Option<(String, String)> {
    let mut lines = text.lines().skip_while(|l| l.trim().is_empty());
    let title = lines.next()?.trim().to_string();
    let rest = lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some((title, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{IDEAS_KEY, MemoryStorage};
    use crate::model::idea::{Category, Status};
    use pretty_assertions::assert_eq;

    const LEGACY: &str = r#"[
        {"id": 1700000300000, "text": "Tool library for the street", "created": "11/14/2023, 10:18:20 PM"},
        {"id": 1700000200000, "text": "\n  Battery swap kiosk\nfor e-bikes\n\nnear stations  ", "created": "11/14/2023, 10:16:40 PM"},
        {"id": 1700000100000, "text": "   ", "created": "11/14/2023, 10:15:00 PM"}
    ]"#;

    fn legacy_store() -> IdeaStore<MemoryStorage> {
        IdeaStore::load(MemoryStorage::new().with_item(LEGACY_KEY, LEGACY))
    }

    #[test]
    fn test_split_text() {
        assert_eq!(
            split_text("\n  Title line \n more\n\n detail "),
            Some(("Title line".to_string(), "more detail".to_string()))
        );
        assert_eq!(split_text("only"), Some(("only".to_string(), String::new())));
        assert_eq!(split_text(" \n\t\n"), None);
    }

    #[test]
    fn test_import_converts_records() {
        let mut store = legacy_store();
        let report = import_legacy(&mut store, &DraftDefaults::default(), false).unwrap();

        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.blank, 1);
        assert_eq!(report.already_present, 0);
        assert_eq!(store.len(), 2);

        let kiosk = store.get(1700000200000).unwrap();
        assert_eq!(kiosk.title, "Battery swap kiosk");
        assert_eq!(kiosk.one_liner, "for e-bikes near stations");
        assert_eq!(kiosk.category, Category::EnergyHardware);
        assert_eq!(kiosk.status, Status::ParkingLot);
        assert_eq!(kiosk.created_at.timestamp_millis(), 1700000200000);

        assert!(store.storage().raw(IDEAS_KEY).is_some());
    }

    #[test]
    fn test_import_is_idempotent() {
        let mut store = legacy_store();
        import_legacy(&mut store, &DraftDefaults::default(), false).unwrap();
        let again = import_legacy(&mut store, &DraftDefaults::default(), false).unwrap();
        assert!(again.imported.is_empty());
        assert_eq!(again.already_present, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_dry_run_leaves_store_alone() {
        let mut store = legacy_store();
        let report = import_legacy(&mut store, &DraftDefaults::default(), true).unwrap();
        assert_eq!(report.imported.len(), 2);
        assert!(store.is_empty());
        assert!(store.storage().raw(IDEAS_KEY).is_none());
    }

    #[test]
    fn test_taken_id_gets_fresh_one() {
        let mut store = legacy_store();
        let clash = NewIdea {
            title: "Something else".into(),
            one_liner: String::new(),
            category: Category::Other,
            time_horizon: DraftDefaults::default().time_horizon,
            effort: DraftDefaults::default().effort,
            potential: DraftDefaults::default().potential,
            status: Status::Done,
        };
        let taken = store
            .add_at(
                clash,
                DateTime::<Utc>::from_timestamp_millis(1700000300000).unwrap(),
            )
            .unwrap();
        assert_eq!(taken, 1700000300000);

        let report = import_legacy(&mut store, &DraftDefaults::default(), false).unwrap();
        let ids: Vec<u64> = report.imported.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1700000300001, 1700000200000]);
        assert_eq!(store.len(), 3);

        // The record stored under a fresh id is still recognized next time.
        for _ in 0..2 {
            let again = import_legacy(&mut store, &DraftDefaults::default(), false).unwrap();
            assert!(again.imported.is_empty());
            assert_eq!(again.already_present, 2);
        }
        let titles: Vec<&str> = store.ideas().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Something else", "Tool library for the street", "Battery swap kiosk"]
        );
    }

    #[test]
    fn test_missing_legacy_slot() {
        let mut store = IdeaStore::load(MemoryStorage::new());
        let report = import_legacy(&mut store, &DraftDefaults::default(), false).unwrap();
        assert_eq!(report, ImportReport::default());
    }

    #[test]
    fn test_corrupt_legacy_slot() {
        let mut store = IdeaStore::load(MemoryStorage::new().with_item(LEGACY_KEY, "oops"));
        let err = import_legacy(&mut store, &DraftDefaults::default(), false).unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }
}
