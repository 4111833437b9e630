//! Record types for the check-in board
//!
//! Four collections are persisted: check-ins, kudos, ideas and problem status
//! events. Records are immutable once written; the only "mutation" the board
//! knows is appending another status event.
//!
//! Every closed vocabulary (mood, workload, urgency, categories, statuses) is
//! an enum with a stable wire key (what lands in the JSON files and on the
//! command line) and a display label (what the dashboards show).

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Error returned when a string does not name any variant of a vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a closed vocabulary: wire key, display label, `ALL`, `FromStr`.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $key:literal, $label:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $key)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable key used in JSON files, query strings and CLI arguments
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                }
            }

            /// Human label shown by the dashboards
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownVariant {
                        kind: stringify!($name),
                        value: wanted.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

vocabulary! {
    /// How someone feels today, ordered from worst to best
    Mood {
        Awful => "awful", "😫";
        Low => "low", "😟";
        Neutral => "neutral", "😐";
        Good => "good", "🙂";
        Great => "great", "😄";
    }
}

impl Mood {
    /// Ordinal level, 1 (awful) to 5 (great)
    pub fn level(&self) -> u8 {
        match self {
            Mood::Awful => 1,
            Mood::Low => 2,
            Mood::Neutral => 3,
            Mood::Good => 4,
            Mood::Great => 5,
        }
    }

    pub fn from_level(level: u8) -> Option<Mood> {
        Mood::ALL.iter().copied().find(|m| m.level() == level)
    }
}

vocabulary! {
    /// Perceived workload
    Workload {
        Calm => "calm", "😌 Calm";
        Normal => "normal", "🙂 Normal";
        Busy => "busy", "😓 Busy";
        Overloaded => "overloaded", "🔥 Overloaded";
    }
}

vocabulary! {
    Urgency {
        Low => "low", "🟢 Low";
        Medium => "medium", "🟠 Medium";
        Urgent => "urgent", "🔴 Urgent";
    }
}

vocabulary! {
    /// Kind of problem reported in a check-in
    ProblemKind {
        Equipment => "equipment", "🔧 Equipment";
        Supplies => "supplies", "📦 Supplies / reagents";
        It => "it", "💻 IT";
        Organisation => "organisation", "📋 Organisation";
        Customer => "customer", "😤 Unhappy customer";
        Staffing => "staffing", "👥 Staffing / team";
        Other => "other", "❓ Other";
    }
}

vocabulary! {
    KudosCategory {
        Teamwork => "teamwork", "🤝 Teamwork";
        GoodMood => "good-mood", "😊 Good mood";
        OutstandingWork => "outstanding-work", "⭐ Outstanding work";
        Perseverance => "perseverance", "💪 Perseverance";
        Efficiency => "efficiency", "🎯 Efficiency";
        GoodIdea => "good-idea", "💡 Good idea";
    }
}

vocabulary! {
    IdeaCategory {
        Organisation => "organisation", "🔧 Organisation";
        Tools => "tools", "💻 Tools";
        Process => "process", "📋 Process";
        TeamLife => "team-life", "👥 Team life";
        Environment => "environment", "🌱 Environment";
    }
}

vocabulary! {
    /// Status an idea is filed with
    IdeaStatus {
        New => "new", "🆕 New";
    }
}

vocabulary! {
    /// Tracked state of a reported problem
    ProblemStatus {
        Pending => "pending", "🟡 Pending";
        InProgress => "in-progress", "🔵 In progress";
        Resolved => "resolved", "✅ Resolved";
    }
}

impl ProblemStatus {
    /// Statuses shown by default in problem lists (everything still open)
    pub const OPEN: &'static [ProblemStatus] = &[ProblemStatus::Pending, ProblemStatus::InProgress];

    /// Next status in the lifecycle, wrapping back to pending
    pub fn next(&self) -> ProblemStatus {
        match self {
            ProblemStatus::Pending => ProblemStatus::InProgress,
            ProblemStatus::InProgress => ProblemStatus::Resolved,
            ProblemStatus::Resolved => ProblemStatus::Pending,
        }
    }
}

/// A daily self-report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// `<author>_<YYYYmmddHHMMSS>`
    pub id: String,
    pub author: String,
    pub site: String,
    pub role: String,
    /// Day the check-in is about (may differ from `created_at`)
    pub date: NaiveDate,
    pub mood: Mood,
    /// 1 to 5
    pub energy: u8,
    pub workload: Workload,
    pub has_problem: bool,
    #[serde(default)]
    pub problem_type: Option<ProblemKind>,
    #[serde(default)]
    pub problem_description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub patient_impact: bool,
    #[serde(default)]
    pub win: Option<String>,
    #[serde(default)]
    pub help_needed: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Local>,
}

/// Peer recognition note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kudos {
    pub id: String,
    pub from: String,
    pub to: String,
    pub category: KudosCategory,
    pub message: String,
    pub created_at: DateTime<Local>,
}

/// Improvement idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub author: String,
    pub category: IdeaCategory,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Local>,
    pub status: IdeaStatus,
}

/// One entry of the append-only problem status log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemStatusEvent {
    /// Id of the check-in that reported the problem
    pub problem_id: String,
    pub status: ProblemStatus,
    #[serde(default)]
    pub resolution_note: String,
    pub updated_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_levels_are_ordinal() {
        let levels: Vec<u8> = Mood::ALL.iter().map(|m| m.level()).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5]);
        assert!(Mood::Great > Mood::Awful);
        assert_eq!(Mood::from_level(4), Some(Mood::Good));
        assert_eq!(Mood::from_level(0), None);
    }

    #[test]
    fn test_vocabulary_parse_is_case_insensitive() {
        assert_eq!("In-Progress".parse::<ProblemStatus>(), Ok(ProblemStatus::InProgress));
        assert_eq!(" overloaded ".parse::<Workload>(), Ok(Workload::Overloaded));
    }

    #[test]
    fn test_vocabulary_parse_error_lists_choices() {
        let err = "sunny".parse::<Mood>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Mood"));
        assert!(msg.contains("sunny"));
        assert!(msg.contains("awful, low, neutral, good, great"));
    }

    #[test]
    fn test_status_wire_keys() {
        assert_eq!(
            serde_json::to_string(&ProblemStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(ProblemStatus::Resolved.next(), ProblemStatus::Pending);
    }

    #[test]
    fn test_checkin_tolerates_missing_optionals() {
        let json = r#"{
            "id": "Marie_20250110093000",
            "author": "Marie",
            "site": "Site A",
            "role": "Technician",
            "date": "2025-01-10",
            "mood": "good",
            "energy": 4,
            "workload": "normal",
            "has_problem": false,
            "created_at": "2025-01-10T09:30:00+01:00"
        }"#;
        let checkin: CheckIn = serde_json::from_str(json).unwrap();
        assert_eq!(checkin.mood, Mood::Good);
        assert!(checkin.problem_type.is_none());
        assert!(!checkin.patient_impact);
        assert!(checkin.comment.is_none());
    }
}
