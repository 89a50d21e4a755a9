use crate::types::entity::Identified;
use serde::{Deserialize, Serialize};

/// Category axis plus one or more measures, shared by the bar and line charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBindings {
    pub x_axis: String,
    pub y_axis: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceBindings {
    pub category: String,
    pub value: String,
}

/// Visual kind together with the field bindings that kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Chart {
    #[serde(rename = "KPI")]
    Kpi { field: String },
    BarChart(AxisBindings),
    StackedBarChart(AxisBindings),
    LineChart(AxisBindings),
    PieChart(SliceBindings),
    DonutChart(SliceBindings),
    Table { columns: Vec<String> },
    /// Kept so validation can report it; never sent to the remote.
    #[serde(skip)]
    Unrecognized { type_name: String },
}

impl Chart {
    pub const KNOWN_TYPES: [&'static str; 7] = [
        "KPI",
        "BarChart",
        "StackedBarChart",
        "LineChart",
        "PieChart",
        "DonutChart",
        "Table",
    ];

    /// Canonical spelling of a known chart type, ignoring ASCII case and
    /// surrounding whitespace.
    pub fn canonical_type(name: &str) -> Option<&'static str> {
        let name = name.trim();
        Self::KNOWN_TYPES
            .into_iter()
            .find(|known| known.eq_ignore_ascii_case(name))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Kpi { .. } => "KPI",
            Self::BarChart(_) => "BarChart",
            Self::StackedBarChart(_) => "StackedBarChart",
            Self::LineChart(_) => "LineChart",
            Self::PieChart(_) => "PieChart",
            Self::DonutChart(_) => "DonutChart",
            Self::Table { .. } => "Table",
            Self::Unrecognized { type_name } => type_name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }

    /// Every field name the chart reads from its dataset.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Kpi { field } => vec![field.as_str()],
            Self::BarChart(axes) | Self::StackedBarChart(axes) | Self::LineChart(axes) => {
                let mut fields = vec![axes.x_axis.as_str()];
                fields.extend(axes.y_axis.iter().map(String::as_str));
                fields.extend(axes.group_by.as_deref());
                fields
            }
            Self::PieChart(slices) | Self::DonutChart(slices) => {
                vec![slices.category.as_str(), slices.value.as_str()]
            }
            Self::Table { columns } => columns.iter().map(String::as_str).collect(),
            Self::Unrecognized { .. } => Vec::new(),
        }
    }
}

/// Grid placement. Signed so that negative coordinates reach validation
/// instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Position {
    pub fn has_valid_geometry(&self) -> bool {
        self.x >= 0 && self.y >= 0 && self.width > 0 && self.height > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visual {
    pub id: String,
    pub title: String,
    pub dataset: String,
    pub chart: Chart,
    pub position: Position,
}

impl Identified for Visual {
    fn identifier(&self) -> &str {
        &self.id
    }
}

/// Derive a visual id from its title: lower-case, runs of anything that is not
/// alphanumeric collapse to a single `_`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Daily Distance (km)"), "daily_distance_km");
        assert_eq!(slugify("  Fuel -- Usage "), "fuel_usage");
        assert_eq!(slugify("KPI"), "kpi");
    }

    #[test]
    fn chart_serializes_with_type_tag() {
        let chart = Chart::BarChart(AxisBindings {
            x_axis: "day".into(),
            y_axis: vec!["km".into()],
            group_by: None,
        });
        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["type"], "BarChart");
        assert_eq!(value["x_axis"], "day");
        assert!(value.get("group_by").is_none());

        let kpi = serde_json::to_value(Chart::Kpi { field: "total".into() }).unwrap();
        assert_eq!(kpi["type"], "KPI");
    }

    #[test]
    fn unrecognized_chart_is_not_serializable() {
        let chart = Chart::Unrecognized {
            type_name: "Heatmap".into(),
        };
        assert_eq!(chart.type_name(), "Heatmap");
        assert!(!chart.is_recognized());
        assert!(serde_json::to_value(&chart).is_err());
    }

    #[test]
    fn geometry_requires_positive_size() {
        let mut pos = Position {
            x: 0,
            y: 0,
            width: 4,
            height: 3,
        };
        assert!(pos.has_valid_geometry());
        pos.width = 0;
        assert!(!pos.has_valid_geometry());
        pos.width = 4;
        pos.y = -1;
        assert!(!pos.has_valid_geometry());
    }
}
