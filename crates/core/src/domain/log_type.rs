use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What kind of progress a log entry records.
///
/// Wire values follow the declaration order the command choices were first
/// published with, where `Improvement` trails `Other`; keeping them stable
/// keeps old database rows decodable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    Milestone,
    Blocker,
    Release,
    Feature,
    BugFix,
    Other,
    Improvement,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown log type value `{0}`")]
pub struct UnknownLogType(pub i64);

impl LogType {
    pub const ALL: [Self; 7] = [
        Self::Milestone,
        Self::Blocker,
        Self::Release,
        Self::Feature,
        Self::Improvement,
        Self::BugFix,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Milestone => "Milestone",
            Self::Blocker => "Blocker",
            Self::Release => "Release",
            Self::Feature => "Feature",
            Self::Improvement => "Improvement",
            Self::BugFix => "Bug Fix",
            Self::Other => "Other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Milestone => ":bookmark:",
            Self::Blocker => ":octagonal_sign:",
            Self::Release => ":rocket:",
            Self::Feature => ":sparkles:",
            Self::Improvement => ":hammer:",
            Self::BugFix => ":bug:",
            Self::Other => ":notepad_spiral:",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|log_type| log_type.label() == label)
    }

    pub fn wire(self) -> i64 {
        match self {
            Self::Milestone => 0,
            Self::Blocker => 1,
            Self::Release => 2,
            Self::Feature => 3,
            Self::BugFix => 4,
            Self::Other => 5,
            Self::Improvement => 6,
        }
    }

    pub fn from_wire(value: i64) -> Result<Self, UnknownLogType> {
        Self::ALL
            .into_iter()
            .find(|log_type| log_type.wire() == value)
            .ok_or(UnknownLogType(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{LogType, UnknownLogType};

    #[test]
    fn labels_round_trip_for_every_variant() {
        for log_type in LogType::ALL {
            assert_eq!(LogType::from_label(log_type.label()), Some(log_type));
        }
    }

    #[test]
    fn wire_values_round_trip_for_every_variant() {
        for log_type in LogType::ALL {
            assert_eq!(LogType::from_wire(log_type.wire()), Ok(log_type));
        }
    }

    #[test]
    fn out_of_range_wire_value_is_rejected() {
        assert_eq!(LogType::from_wire(7), Err(UnknownLogType(7)));
    }

    #[test]
    fn every_variant_carries_an_emoji() {
        assert_eq!(LogType::BugFix.emoji(), ":bug:");
        assert_eq!(LogType::Release.emoji(), ":rocket:");
        for log_type in LogType::ALL {
            assert!(log_type.emoji().starts_with(':'));
        }
    }
}
