use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry};
use crate::io::storage::{IDEAS_KEY, Storage};
use crate::model::idea::{Idea, NewIdea, Status};

/// The canonical list of ideas, mirrored to a storage slot.
///
/// The list is read once by [`IdeaStore::load`] and written back in full after
/// every mutation. Writes never fail a mutation: if the slot rejects a write
/// the in-memory list stays authoritative and [`IdeaStore::save_failed`]
/// reports it.
#[derive(Debug)]
pub struct IdeaStore<S: Storage> {
    storage: S,
    ideas: Vec<Idea>,
    save_failed: bool,
}

impl<S: Storage> IdeaStore<S> {
    /// Read the idea list from `storage`. Missing or unreadable data gives an
    /// empty board; unreadable data is handed to the storage's recovery hook
    /// first, since the next save replaces it.
    pub fn load(storage: S) -> Self {
        let mut ideas = read_ideas(&storage);
        reassign_duplicate_ids(&mut ideas);
        IdeaStore {
            storage,
            ideas,
            save_failed: false,
        }
    }

    /// Ideas, most recent first.
    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    pub fn get(&self, id: u64) -> Option<&Idea> {
        self.ideas.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    /// True when the most recent save did not reach the storage slot.
    pub fn save_failed(&self) -> bool {
        self.save_failed
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Add an idea stamped with the current time.
    pub fn add(&mut self, new: NewIdea) -> Option<u64> {
        self.add_at(new, Utc::now())
    }

    /// Prepend a new idea created at `now` and save. A blank title is
    /// rejected: nothing changes and `None` is returned.
    pub fn add_at(&mut self, new: NewIdea, now: DateTime<Utc>) -> Option<u64> {
        if new.title.trim().is_empty() {
            tracing::debug!("ignoring idea with blank title");
            return None;
        }
        let id = self.next_id(now);
        self.ideas.insert(0, new.into_idea(id, now));
        self.save();
        Some(id)
    }

    /// Replace the status of the idea with `id`. Returns false (and writes
    /// nothing) when no such idea exists.
    pub fn set_status(&mut self, id: u64, status: Status) -> bool {
        let Some(idea) = self.ideas.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        idea.status = status;
        self.save();
        true
    }

    /// Remove the idea with `id` once `confirm` agrees. `confirm` is only
    /// asked about ideas that exist. The removed record goes to the
    /// storage's recovery hook.
    pub fn remove(&mut self, id: u64, confirm: impl FnOnce(&Idea) -> bool) -> bool {
        let Some(pos) = self.ideas.iter().position(|i| i.id == id) else {
            return false;
        };
        if !confirm(&self.ideas[pos]) {
            return false;
        }
        let removed = self.ideas.remove(pos);
        self.storage.record_recovery(
            RecoveryEntry::new(RecoveryCategory::Delete, format!("idea {} deleted", id))
                .field("Title", removed.title.clone())
                .body(serde_json::to_string_pretty(&removed).unwrap_or_default()),
        );
        self.save();
        true
    }

    /// Append ideas at the end of the list (oldest position) and save once.
    /// Ideas whose id is already taken are skipped. Returns how many were added.
    pub fn append(&mut self, ideas: Vec<Idea>) -> usize {
        let mut taken: HashSet<u64> = self.ideas.iter().map(|i| i.id).collect();
        let before = self.ideas.len();
        for idea in ideas {
            if taken.insert(idea.id) {
                self.ideas.push(idea);
            }
        }
        let added = self.ideas.len() - before;
        if added > 0 {
            self.save();
        }
        added
    }

    /// Serialize the whole list and overwrite the slot.
    pub fn save(&mut self) {
        let payload = match serde_json::to_string_pretty(&self.ideas) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "could not serialize ideas");
                self.save_failed = true;
                return;
            }
        };

        match self.storage.set_item(IDEAS_KEY, &payload) {
            Ok(()) => {
                tracing::debug!(count = self.ideas.len(), "saved ideas");
                self.save_failed = false;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    count = self.ideas.len(),
                    "could not save ideas, keeping them in memory only"
                );
                self.storage.record_recovery(
                    RecoveryEntry::new(RecoveryCategory::Write, "save failed")
                        .field("Key", IDEAS_KEY)
                        .field("Error", e.to_string())
                        .body(payload),
                );
                self.save_failed = true;
            }
        }
    }

    /// Creation milliseconds, bumped past the largest existing id so two
    /// ideas created within the same millisecond never share an id.
    fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        next_free_id(&self.ideas, millis)
    }
}

/// `candidate` if no idea has an id at or above it, otherwise one past the
/// largest id. When the largest id is `u64::MAX` the lowest unused id is
/// returned instead.
pub fn next_free_id(ideas: &[Idea], candidate: u64) -> u64 {
    match ideas.iter().map(|i| i.id).max() {
        Some(max) if candidate <= max => max.checked_add(1).unwrap_or_else(|| {
            let id = lowest_unused_id(ideas);
            tracing::warn!(id, "largest idea id is at its limit, reusing a low id");
            id
        }),
        _ => candidate,
    }
}

fn lowest_unused_id(ideas: &[Idea]) -> u64 {
    let mut ids: Vec<u64> = ideas.iter().map(|i| i.id).collect();
    ids.sort_unstable();
    ids.dedup();
    // Fewer ids than u64 values exist, so a gap is always found before overflow.
    let mut next = 0;
    for id in ids {
        if id != next {
            break;
        }
        next += 1;
    }
    next
}

fn read_ideas<S: Storage>(storage: &S) -> Vec<Idea> {
    let raw = match storage.get_item(IDEAS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read ideas, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Idea>>(&raw) {
        Ok(ideas) => ideas,
        Err(e) => {
            tracing::warn!(error = %e, "stored ideas are unreadable, starting empty");
            storage.record_recovery(
                RecoveryEntry::new(RecoveryCategory::Load, "unreadable board data")
                    .field("Key", IDEAS_KEY)
                    .field("Error", e.to_string())
                    .body(raw),
            );
            Vec::new()
        }
    }
}

/// Give later duplicates of an id a fresh one so ids stay unique.
fn reassign_duplicate_ids(ideas: &mut [Idea]) {
    let mut seen = HashSet::new();
    for i in 0..ideas.len() {
        let old = ideas[i].id;
        if seen.insert(old) {
            continue;
        }
        let fresh = next_free_id(ideas, old);
        tracing::info!(old, new = fresh, "reassigned duplicate idea id");
        ideas[i].id = fresh;
        seen.insert(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::idea::{Category, Effort, Potential, TimeHorizon};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at_millis(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn new_idea(title: &str) -> NewIdea {
        NewIdea {
            title: title.to_string(),
            one_liner: String::new(),
            category: Category::SoftwareSaas,
            time_horizon: TimeHorizon::ThisMonth,
            effort: Effort::Low,
            potential: Potential::Medium,
            status: Status::ParkingLot,
        }
    }

    fn store_with(titles: &[&str]) -> IdeaStore<MemoryStorage> {
        let mut store = IdeaStore::load(MemoryStorage::new());
        for (i, title) in titles.iter().enumerate() {
            store
                .add_at(new_idea(title), at_millis(1_700_000_000_000 + i as i64 * 1000))
                .unwrap();
        }
        store
    }

    fn persisted(store: &IdeaStore<MemoryStorage>) -> Vec<Idea> {
        serde_json::from_str(store.storage().raw(IDEAS_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_load_empty_slot() {
        let store = IdeaStore::load(MemoryStorage::new());
        assert!(store.is_empty());
        assert!(!store.save_failed());
    }

    #[test]
    fn test_load_corrupt_slot_falls_back_and_preserves_raw() {
        let storage = MemoryStorage::new().with_item(IDEAS_KEY, "{\"not\": \"a list\"");
        let store = IdeaStore::load(storage);
        assert!(store.is_empty());
        let recovered = store.storage().recovered();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].category, RecoveryCategory::Load);
        assert_eq!(recovered[0].body, "{\"not\": \"a list\"");
    }

    #[test]
    fn test_load_wrong_shape_falls_back() {
        let storage = MemoryStorage::new().with_item(IDEAS_KEY, r#"[{"id":1,"text":"old"}]"#);
        assert!(IdeaStore::load(storage).is_empty());
    }

    #[test]
    fn test_add_prepends_and_saves() {
        let mut store = store_with(&["first"]);
        let id = store
            .add_at(new_idea("second"), at_millis(1_700_000_500_000))
            .unwrap();
        assert_eq!(id, 1_700_000_500_000);
        assert_eq!(store.len(), 2);
        assert_eq!(store.ideas()[0].title, "second");
        assert_eq!(persisted(&store), store.ideas().to_vec());
    }

    #[test]
    fn test_add_blank_title_is_noop() {
        let mut store = IdeaStore::load(MemoryStorage::new());
        assert_eq!(store.add_at(new_idea("  "), at_millis(1)), None);
        assert_eq!(store.add_at(new_idea(""), at_millis(2)), None);
        assert!(store.is_empty());
        assert!(store.storage().raw(IDEAS_KEY).is_none());
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut store = IdeaStore::load(MemoryStorage::new());
        let now = at_millis(1_700_000_000_000);
        let a = store.add_at(new_idea("a"), now).unwrap();
        let b = store.add_at(new_idea("b"), now).unwrap();
        let c = store.add_at(new_idea("c"), at_millis(1_600_000_000_000)).unwrap();
        assert_eq!(a, 1_700_000_000_000);
        assert_eq!(b, a + 1);
        assert_eq!(c, b + 1);
    }

    #[test]
    fn test_set_status_only_touches_target() {
        let mut store = store_with(&["a", "b", "c"]);
        let before = store.ideas().to_vec();
        let target = before[1].id;

        assert!(store.set_status(target, Status::InMotion));

        let after = store.ideas();
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after) {
            if old.id == target {
                let expected = Idea {
                    status: Status::InMotion,
                    ..old.clone()
                };
                assert_eq!(new, &expected);
            } else {
                assert_eq!(new, old);
            }
        }
        assert_eq!(persisted(&store), after.to_vec());
    }

    #[test]
    fn test_set_status_unknown_id() {
        let mut store = store_with(&["a"]);
        let before = store.ideas().to_vec();
        assert!(!store.set_status(42, Status::Done));
        assert_eq!(store.ideas(), before.as_slice());
    }

    #[test]
    fn test_remove_confirmed() {
        let mut store = store_with(&["a", "b"]);
        let id = store.ideas()[1].id;
        assert!(store.remove(id, |idea| idea.title == "a"));
        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_none());
        assert_eq!(persisted(&store).len(), 1);

        let recovered = store.storage().recovered();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].category, RecoveryCategory::Delete);
    }

    #[test]
    fn test_remove_declined() {
        let mut store = store_with(&["a", "b"]);
        let id = store.ideas()[0].id;
        assert!(!store.remove(id, |_| false));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_unknown_id_skips_confirm() {
        let mut store = store_with(&["a"]);
        let mut asked = false;
        assert!(!store.remove(7, |_| {
            asked = true;
            true
        }));
        assert!(!asked);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let mut store = store_with(&["a"]);
        store.storage_mut().fail_writes(true);

        let id = store
            .add_at(new_idea("b"), at_millis(1_800_000_000_000))
            .unwrap();
        assert!(store.save_failed());
        assert_eq!(store.len(), 2);
        assert_eq!(store.ideas()[0].id, id);
        // slot still holds the last good write
        assert_eq!(persisted(&store).len(), 1);

        let recovered = store.storage().recovered();
        assert_eq!(recovered.last().unwrap().category, RecoveryCategory::Write);

        store.storage_mut().fail_writes(false);
        assert!(store.set_status(id, Status::NextUp));
        assert!(!store.save_failed());
        assert_eq!(persisted(&store).len(), 2);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = store_with(&["a", "b", "c"]);
        let ideas = store.ideas().to_vec();
        let reloaded = IdeaStore::load(MemoryStorage::new().with_item(
            IDEAS_KEY,
            store.storage().raw(IDEAS_KEY).unwrap(),
        ));
        assert_eq!(reloaded.ideas(), ideas.as_slice());
    }

    #[test]
    fn test_duplicate_ids_reassigned_on_load() {
        let mut store = store_with(&["a", "b"]);
        let dup_id = store.ideas()[1].id;
        let mut ideas = store.ideas().to_vec();
        ideas[0].id = dup_id;
        store
            .storage_mut()
            .set_item(IDEAS_KEY, &serde_json::to_string(&ideas).unwrap())
            .unwrap();

        let reloaded = IdeaStore::load(MemoryStorage::new().with_item(
            IDEAS_KEY,
            store.storage().raw(IDEAS_KEY).unwrap(),
        ));
        let ids: Vec<u64> = reloaded.ideas().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![dup_id, dup_id + 1]);
    }

    #[test]
    fn test_add_after_largest_possible_id() {
        let mut seeded = store_with(&["edge"]).ideas().to_vec();
        seeded[0].id = u64::MAX;
        let storage =
            MemoryStorage::new().with_item(IDEAS_KEY, &serde_json::to_string(&seeded).unwrap());
        let mut store = IdeaStore::load(storage);

        let a = store.add_at(new_idea("a"), at_millis(1_800_000_000_000)).unwrap();
        let b = store.add_at(new_idea("b"), at_millis(1_800_000_000_000)).unwrap();
        assert_eq!((a, b), (0, 1));
        let ids: Vec<u64> = store.ideas().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 0, u64::MAX]);
        assert_eq!(persisted(&store).len(), 3);
    }

    #[test]
    fn test_duplicate_largest_possible_id_reassigned() {
        let mut seeded = store_with(&["a", "b", "c"]).ideas().to_vec();
        for idea in &mut seeded {
            idea.id = u64::MAX;
        }
        seeded[2].id = 0;
        let storage =
            MemoryStorage::new().with_item(IDEAS_KEY, &serde_json::to_string(&seeded).unwrap());

        let store = IdeaStore::load(storage);
        let ids: Vec<u64> = store.ideas().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![u64::MAX, 1, 0]);
    }

    #[test]
    fn test_corrupt_slot_recorded_once_across_loads() {
        let mut storage = MemoryStorage::new().with_item(IDEAS_KEY, "{broken");
        for _ in 0..3 {
            storage = IdeaStore::load(storage).into_storage();
        }
        assert_eq!(storage.recovered().len(), 1);
    }

    #[test]
    fn test_append_skips_taken_ids() {
        let mut store = store_with(&["a"]);
        let taken = store.ideas()[0].clone();
        let fresh = Idea {
            id: 5,
            title: "imported".into(),
            ..taken.clone()
        };
        assert_eq!(store.append(vec![taken, fresh]), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.ideas()[1].id, 5);
    }

    #[test]
    fn test_next_free_id() {
        assert_eq!(next_free_id(&[], 10), 10);
        let store = store_with(&["a"]);
        let max = store.ideas()[0].id;
        assert_eq!(next_free_id(store.ideas(), max), max + 1);
        assert_eq!(next_free_id(store.ideas(), max + 10), max + 10);
    }
}
