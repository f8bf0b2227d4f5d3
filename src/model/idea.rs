use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a member of one of the
/// closed idea enumerations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} \"{value}\" (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Lowercase and drop separators so `next-up`, `Next up` and `NEXT_UP` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '/' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_choice<T: Copy>(
    kind: &'static str,
    input: &str,
    all: &[T],
    label: fn(T) -> &'static str,
) -> Result<T, ParseEnumError> {
    let wanted = normalize(input);
    all.iter()
        .copied()
        .find(|v| normalize(label(*v)) == wanted)
        .ok_or_else(|| ParseEnumError {
            kind,
            value: input.to_string(),
            expected: all
                .iter()
                .map(|v| label(*v))
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// What area an idea belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Energy / Hardware", alias = "Energy/Hardware")]
    EnergyHardware,
    #[serde(rename = "Software / SaaS", alias = "Software/SaaS")]
    SoftwareSaas,
    #[serde(rename = "Manufacturing / Ops", alias = "Manufacturing/Ops")]
    ManufacturingOps,
    #[serde(rename = "Content / Education", alias = "Content/Education")]
    ContentEducation,
    #[serde(rename = "Personal / Life systems", alias = "Personal/Life systems")]
    PersonalLifeSystems,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::EnergyHardware,
        Category::SoftwareSaas,
        Category::ManufacturingOps,
        Category::ContentEducation,
        Category::PersonalLifeSystems,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::EnergyHardware => "Energy / Hardware",
            Category::SoftwareSaas => "Software / SaaS",
            Category::ManufacturingOps => "Manufacturing / Ops",
            Category::ContentEducation => "Content / Education",
            Category::PersonalLifeSystems => "Personal / Life systems",
            Category::Other => "Other",
        }
    }
}

/// When the idea should be looked at again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeHorizon {
    #[serde(rename = "This week")]
    ThisWeek,
    #[serde(rename = "This month")]
    ThisMonth,
    #[serde(rename = "This quarter")]
    ThisQuarter,
    #[serde(rename = "Someday / Maybe", alias = "Someday/Maybe")]
    Someday,
}

impl TimeHorizon {
    pub const ALL: [TimeHorizon; 4] = [
        TimeHorizon::ThisWeek,
        TimeHorizon::ThisMonth,
        TimeHorizon::ThisQuarter,
        TimeHorizon::Someday,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeHorizon::ThisWeek => "This week",
            TimeHorizon::ThisMonth => "This month",
            TimeHorizon::ThisQuarter => "This quarter",
            TimeHorizon::Someday => "Someday / Maybe",
        }
    }
}

/// How much work the idea would take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub const ALL: [Effort; 3] = [Effort::Low, Effort::Medium, Effort::High];

    pub fn label(self) -> &'static str {
        match self {
            Effort::Low => "Low",
            Effort::Medium => "Medium",
            Effort::High => "High",
        }
    }

    /// Sort rank; lower effort ranks first.
    pub fn rank(self) -> u8 {
        match self {
            Effort::Low => 1,
            Effort::Medium => 2,
            Effort::High => 3,
        }
    }
}

/// How much the idea could pay off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Potential {
    High,
    Medium,
    Low,
}

impl Potential {
    pub const ALL: [Potential; 3] = [Potential::High, Potential::Medium, Potential::Low];

    pub fn label(self) -> &'static str {
        match self {
            Potential::High => "High",
            Potential::Medium => "Medium",
            Potential::Low => "Low",
        }
    }

    /// Sort rank; higher potential ranks higher.
    pub fn rank(self) -> u8 {
        match self {
            Potential::High => 3,
            Potential::Medium => 2,
            Potential::Low => 1,
        }
    }
}

/// Where an idea sits on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Parking lot")]
    ParkingLot,
    #[serde(rename = "Next up")]
    NextUp,
    #[serde(rename = "In motion")]
    InMotion,
    #[serde(rename = "On ice")]
    OnIce,
    Done,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::ParkingLot,
        Status::NextUp,
        Status::InMotion,
        Status::OnIce,
        Status::Done,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::ParkingLot => "Parking lot",
            Status::NextUp => "Next up",
            Status::InMotion => "In motion",
            Status::OnIce => "On ice",
            Status::Done => "Done",
        }
    }
}

macro_rules! label_impls {
    ($($ty:ident => $kind:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }

            impl FromStr for $ty {
                type Err = ParseEnumError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    parse_choice($kind, s, &$ty::ALL, $ty::label)
                }
            }
        )*
    };
}

label_impls! {
    Category => "category",
    TimeHorizon => "time horizon",
    Effort => "effort",
    Potential => "potential",
    Status => "status",
}

/// A captured idea as stored on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    /// Unique id; creation time in milliseconds, bumped on collision
    pub id: u64,
    /// Display title, never empty
    pub title: String,
    /// Optional one-line description (empty when absent)
    #[serde(default)]
    pub one_liner: String,
    pub category: Category,
    pub time_horizon: TimeHorizon,
    pub effort: Effort,
    pub potential: Potential,
    pub status: Status,
    /// Creation instant, millisecond precision
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// The field values of an idea that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdea {
    pub title: String,
    pub one_liner: String,
    pub category: Category,
    pub time_horizon: TimeHorizon,
    pub effort: Effort,
    pub potential: Potential,
    pub status: Status,
}

impl NewIdea {
    /// Build the stored record. The title is trimmed; the caller has
    /// already checked that it is not blank.
    pub fn into_idea(self, id: u64, created_at: DateTime<Utc>) -> Idea {
        Idea {
            id,
            title: self.title.trim().to_string(),
            one_liner: self.one_liner,
            category: self.category,
            time_horizon: self.time_horizon,
            effort: self.effort,
            potential: self.potential,
            status: self.status,
            created_at: truncate_to_millis(created_at),
        }
    }
}

/// Drop sub-millisecond precision so a stored timestamp survives a save/load cycle.
pub fn truncate_to_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(t.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(t)
}

/// `createdAt` wire format: ISO-8601 with milliseconds on output; any RFC 3339
/// timestamp or a bare `YYYY-MM-DD` date on input.
pub mod iso_millis {
    use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return Some(t.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_status_loose() {
        assert_eq!("Next up".parse::<Status>().unwrap(), Status::NextUp);
        assert_eq!("next-up".parse::<Status>().unwrap(), Status::NextUp);
        assert_eq!("IN_MOTION".parse::<Status>().unwrap(), Status::InMotion);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Done);
    }

    #[test]
    fn test_parse_unknown_lists_choices() {
        let err = "later".parse::<Effort>().unwrap_err();
        assert_eq!(err.kind, "effort");
        assert_eq!(err.to_string(), "unknown effort \"later\" (expected one of: Low, Medium, High)");
    }

    #[test]
    fn test_parse_category_with_slash() {
        assert_eq!(
            "software/saas".parse::<Category>().unwrap(),
            Category::SoftwareSaas
        );
        assert_eq!(
            "Personal / Life systems".parse::<Category>().unwrap(),
            Category::PersonalLifeSystems
        );
    }

    #[test]
    fn test_ranks() {
        assert!(Potential::High.rank() > Potential::Medium.rank());
        assert!(Potential::Medium.rank() > Potential::Low.rank());
        assert!(Effort::Low.rank() < Effort::Medium.rank());
        assert!(Effort::Medium.rank() < Effort::High.rank());
    }

    #[test]
    fn test_idea_json_shape() {
        let idea = Idea {
            id: 1704067200000,
            title: "NRG Pod micro farm".into(),
            one_liner: "Solar pods for events.".into(),
            category: Category::EnergyHardware,
            time_horizon: TimeHorizon::Someday,
            effort: Effort::High,
            potential: Potential::Medium,
            status: Status::OnIce,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&idea).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1704067200000u64,
                "title": "NRG Pod micro farm",
                "oneLiner": "Solar pods for events.",
                "category": "Energy / Hardware",
                "timeHorizon": "Someday / Maybe",
                "effort": "High",
                "potential": "Medium",
                "status": "On ice",
                "createdAt": "2024-01-01T00:00:00.000Z",
            })
        );
    }

    #[test]
    fn test_deserialize_browser_record() {
        let json = r#"{
            "id": 1718000000000,
            "title": "Course on battery second life",
            "category": "Content/Education",
            "timeHorizon": "This quarter",
            "effort": "Medium",
            "potential": "High",
            "status": "Next up",
            "createdAt": "2024-06-10T06:13:20.123Z"
        }"#;
        let idea: Idea = serde_json::from_str(json).unwrap();
        assert_eq!(idea.one_liner, "");
        assert_eq!(idea.category, Category::ContentEducation);
        assert_eq!(idea.created_at.timestamp_millis(), 1718000000123);
    }

    #[test]
    fn test_created_at_accepts_bare_date() {
        let t = iso_millis::parse("2024-02-01").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert!(iso_millis::parse("yesterday").is_none());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let json = r#"{"id":1,"title":"x","category":"Other","timeHorizon":"This week",
            "effort":"Low","potential":"Low","status":"Maybe","createdAt":"2024-01-01"}"#;
        assert!(serde_json::from_str::<Idea>(json).is_err());
    }

    #[test]
    fn test_into_idea_trims_and_truncates() {
        let new = NewIdea {
            title: "  Spaced  ".into(),
            one_liner: String::new(),
            category: Category::Other,
            time_horizon: TimeHorizon::ThisWeek,
            effort: Effort::Low,
            potential: Potential::Low,
            status: Status::ParkingLot,
        };
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let idea = new.into_idea(7, at);
        assert_eq!(idea.title, "Spaced");
        assert_eq!(idea.created_at.timestamp_subsec_nanos(), 123_000_000);
    }
}
