use chrono::{DateTime, Utc};

use super::config::DraftDefaults;
use super::idea::{Category, Effort, NewIdea, Potential, Status, TimeHorizon};
use crate::io::storage::Storage;
use crate::ops::store::IdeaStore;

/// Pending field values for the next idea.
///
/// After a successful submit every field goes back to its default except
/// `category`, which sticks so a run of similar ideas can be entered quickly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    defaults: DraftDefaults,
    title: String,
    one_liner: String,
    category: Category,
    time_horizon: TimeHorizon,
    effort: Effort,
    potential: Potential,
    status: Status,
}

impl Draft {
    pub fn new(defaults: DraftDefaults) -> Self {
        Draft {
            defaults,
            title: String::new(),
            one_liner: String::new(),
            category: defaults.category,
            time_horizon: defaults.time_horizon,
            effort: defaults.effort,
            potential: defaults.potential,
            status: defaults.status,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_one_liner(&mut self, one_liner: impl Into<String>) {
        self.one_liner = one_liner.into();
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn set_time_horizon(&mut self, time_horizon: TimeHorizon) {
        self.time_horizon = time_horizon;
    }

    pub fn set_effort(&mut self, effort: Effort) {
        self.effort = effort;
    }

    pub fn set_potential(&mut self, potential: Potential) {
        self.potential = potential;
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn one_liner(&self) -> &str {
        &self.one_liner
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn time_horizon(&self) -> TimeHorizon {
        self.time_horizon
    }

    pub fn effort(&self) -> Effort {
        self.effort
    }

    pub fn potential(&self) -> Potential {
        self.potential
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// True when the title is empty after trimming; such a draft cannot be committed.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Snapshot the current field values.
    pub fn to_new_idea(&self) -> NewIdea {
        NewIdea {
            title: self.title.clone(),
            one_liner: self.one_liner.clone(),
            category: self.category,
            time_horizon: self.time_horizon,
            effort: self.effort,
            potential: self.potential,
            status: self.status,
        }
    }

    /// Commit the draft into the store, stamped with the current time.
    pub fn submit<S: Storage>(&mut self, store: &mut IdeaStore<S>) -> Option<u64> {
        self.submit_at(store, Utc::now())
    }

    /// Commit the draft with an explicit creation instant. Returns the new id,
    /// or `None` (leaving the draft untouched) when the title is blank.
    pub fn submit_at<S: Storage>(
        &mut self,
        store: &mut IdeaStore<S>,
        now: DateTime<Utc>,
    ) -> Option<u64> {
        let id = store.add_at(self.to_new_idea(), now)?;
        self.reset();
        Some(id)
    }

    fn reset(&mut self) {
        self.title.clear();
        self.one_liner.clear();
        self.time_horizon = self.defaults.time_horizon;
        self.effort = self.defaults.effort;
        self.potential = self.defaults.potential;
        self.status = self.defaults.status;
    }
}

impl Default for Draft {
    fn default() -> Self {
        Draft::new(DraftDefaults::default())
    }
}
