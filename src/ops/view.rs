use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::idea::{Idea, ParseEnumError, Status};

/// Which statuses the board shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(self, idea: &Idea) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => idea.status == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = ParseEnumError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => f.write_str(status.label()),
        }
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    /// Newest first
    #[default]
    Recent,
    /// Highest potential first
    Potential,
    /// Lowest effort first
    Effort,
    /// Keep store order
    Insertion,
}

impl SortKey {
    /// Map a key string to an ordering. Unrecognized keys leave the order alone.
    pub fn from_key(key: &str) -> SortKey {
        match key.trim().to_ascii_lowercase().as_str() {
            "recent" => SortKey::Recent,
            "potential" => SortKey::Potential,
            "effort" => SortKey::Effort,
            _ => SortKey::Insertion,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SortKey::Recent => "recent",
            SortKey::Potential => "potential",
            SortKey::Effort => "effort",
            SortKey::Insertion => "none",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        SortKey::from_key(&s)
    }
}

impl From<SortKey> for String {
    fn from(sort: SortKey) -> Self {
        sort.key().to_string()
    }
}

/// Derive the read-only view of the board: filter by status, then stable-sort.
///
/// Never touches `records`; calling it twice with the same inputs gives the
/// same sequence.
pub fn project(records: &[Idea], filter: StatusFilter, sort: SortKey) -> Vec<&Idea> {
    let mut view: Vec<&Idea> = records.iter().filter(|i| filter.matches(i)).collect();
    match sort {
        SortKey::Recent => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Potential => view.sort_by(|a, b| b.potential.rank().cmp(&a.potential.rank())),
        SortKey::Effort => view.sort_by_key(|i| i.effort.rank()),
        SortKey::Insertion => {}
    }
    view
}

/// Number of ideas per status, in board order, zeros included.
pub fn status_counts(records: &[Idea]) -> Vec<(Status, usize)> {
    Status::ALL
        .iter()
        .map(|&status| (status, records.iter().filter(|i| i.status == status).count()))
        .collect()
}
