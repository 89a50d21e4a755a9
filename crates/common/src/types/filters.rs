use crate::types::entity::Identified;
use serde::{Deserialize, Serialize};

/// Filter kind with its kind-specific options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterControl {
    DateRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_range: Option<String>,
    },
    Dropdown {
        #[serde(default)]
        multi_select: bool,
    },
    #[serde(skip)]
    Unrecognized { type_name: String },
}

impl FilterControl {
    pub const KNOWN_TYPES: [&'static str; 2] = ["DateRange", "Dropdown"];

    /// Same case rules as [`Chart::canonical_type`](crate::types::Chart::canonical_type).
    pub fn canonical_type(name: &str) -> Option<&'static str> {
        let name = name.trim();
        Self::KNOWN_TYPES
            .into_iter()
            .find(|known| known.eq_ignore_ascii_case(name))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::DateRange { .. } => "DateRange",
            Self::Dropdown { .. } => "Dropdown",
            Self::Unrecognized { type_name } => type_name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }
}

/// Dashboard-wide filter bound to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub field: String,
    pub control: FilterControl,
    /// Visual ids the filter is restricted to; empty means every visual.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,
}

impl Identified for Filter {
    fn identifier(&self) -> &str {
        &self.name
    }
}
