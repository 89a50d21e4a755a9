use crate::types::entity::Identified;
use serde::{Deserialize, Serialize};

/// Fixed identifier of the singleton schedule.
pub const REFRESH_SCHEDULE_ID: &str = "refresh_schedule";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefreshFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    #[serde(skip)]
    Unrecognized(String),
}

impl RefreshFrequency {
    pub const KNOWN_VALUES: [&'static str; 4] = ["HOURLY", "DAILY", "WEEKLY", "MONTHLY"];

    /// Case-insensitive; anything unknown is kept for validation to report.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            _ => Self::Unrecognized(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Unrecognized(value) => value,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

/// Dataset refresh cadence. One per dashboard, owned by the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSchedule {
    pub frequency: RefreshFrequency,
    /// IANA zone, e.g. `Asia/Shanghai`.
    pub timezone: String,
}

impl Identified for RefreshSchedule {
    fn identifier(&self) -> &str {
        REFRESH_SCHEDULE_ID
    }
}
