use crate::config::error::DefinitionError;
use crate::types::visuals::slugify;
use crate::types::{
    AxisBindings, Chart, DashboardDefinition, DataSource, Dataset, Filter, FilterControl,
    Position, RefreshFrequency, RefreshSchedule, SliceBindings, Visual,
};
use serde::Deserialize;

// ---------------- File layout ----------------
// Unknown keys are ignored everywhere so newer definitions still load.

#[derive(Debug, Deserialize)]
pub struct DefinitionFile {
    pub dashboard_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
    #[serde(default)]
    pub visuals: Vec<VisualEntry>,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    pub refresh_schedule: ScheduleEntry,
}

#[derive(Debug, Deserialize)]
pub struct DatasetEntry {
    pub id: String,
    pub name: String,
    pub sql: String,
    #[serde(default)]
    pub data_source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
pub struct VisualEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub dataset: String,
    pub position: Position,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<OneOrMany>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct FilterEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub field: String,
    #[serde(default)]
    pub default_range: Option<String>,
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default)]
    pub applies_to: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleEntry {
    pub frequency: String,
    pub timezone: String,
}

// ---------------- Conversion ----------------

impl TryFrom<DefinitionFile> for DashboardDefinition {
    type Error = DefinitionError;

    fn try_from(file: DefinitionFile) -> Result<Self, Self::Error> {
        let datasets = file
            .datasets
            .into_iter()
            .map(Dataset::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let visuals = file
            .visuals
            .into_iter()
            .map(Visual::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let filters = file
            .filters
            .into_iter()
            .map(Filter::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DashboardDefinition {
            name: file.dashboard_name,
            description: file.description,
            data_sources: file.data_sources,
            datasets,
            visuals,
            filters,
            refresh_schedule: RefreshSchedule::try_from(file.refresh_schedule)?,
        })
    }
}

impl TryFrom<DatasetEntry> for Dataset {
    type Error = DefinitionError;

    fn try_from(entry: DatasetEntry) -> Result<Self, Self::Error> {
        // The query only names its source implicitly; an explicit link is required.
        let data_source = entry
            .data_source
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                DefinitionError::missing_field(&format!("dataset '{}'", entry.id), "data_source")
            })?;

        Ok(Dataset {
            id: entry.id,
            name: entry.name,
            sql: entry.sql,
            data_source,
        })
    }
}

impl VisualEntry {
    fn require(&self, value: &Option<String>, field: &str) -> Result<String, DefinitionError> {
        value.clone().ok_or_else(|| {
            DefinitionError::missing_field(
                &format!("{} visual '{}'", self.kind, self.title),
                field,
            )
        })
    }

    fn axes(&self) -> Result<AxisBindings, DefinitionError> {
        let y_axis: Vec<String> = match &self.y_axis {
            Some(OneOrMany::One(v)) => vec![v.clone()],
            Some(OneOrMany::Many(v)) if !v.is_empty() => v.clone(),
            _ => {
                return Err(DefinitionError::missing_field(
                    &format!("{} visual '{}'", self.kind, self.title),
                    "y_axis",
                ))
            }
        };
        Ok(AxisBindings {
            x_axis: self.require(&self.x_axis, "x_axis")?,
            y_axis,
            group_by: self.group_by.clone(),
        })
    }

    fn slices(&self) -> Result<SliceBindings, DefinitionError> {
        Ok(SliceBindings {
            category: self.require(&self.category, "category")?,
            value: self.require(&self.value, "value")?,
        })
    }

    fn chart(&self) -> Result<Chart, DefinitionError> {
        let chart = match Chart::canonical_type(&self.kind).unwrap_or_default() {
            "KPI" => Chart::Kpi {
                field: self.require(&self.field, "field")?,
            },
            "BarChart" => Chart::BarChart(self.axes()?),
            "StackedBarChart" => Chart::StackedBarChart(self.axes()?),
            "LineChart" => Chart::LineChart(self.axes()?),
            "PieChart" => Chart::PieChart(self.slices()?),
            "DonutChart" => Chart::DonutChart(self.slices()?),
            "Table" => match &self.columns {
                Some(columns) if !columns.is_empty() => Chart::Table {
                    columns: columns.clone(),
                },
                _ => {
                    return Err(DefinitionError::missing_field(
                        &format!("Table visual '{}'", self.title),
                        "columns",
                    ))
                }
            },
            _ => Chart::Unrecognized {
                type_name: self.kind.clone(),
            },
        };
        Ok(chart)
    }
}

impl TryFrom<VisualEntry> for Visual {
    type Error = DefinitionError;

    fn try_from(entry: VisualEntry) -> Result<Self, Self::Error> {
        let chart = entry.chart()?;
        let id = match &entry.id {
            Some(id) => id.clone(),
            None => slugify(&entry.title),
        };
        if id.is_empty() {
            return Err(DefinitionError::malformed(format!(
                "visual '{}' has neither an id nor a title to derive one from",
                entry.title
            )));
        }

        Ok(Visual {
            id,
            title: entry.title,
            dataset: entry.dataset,
            chart,
            position: entry.position,
        })
    }
}

impl TryFrom<FilterEntry> for Filter {
    type Error = DefinitionError;

    fn try_from(entry: FilterEntry) -> Result<Self, Self::Error> {
        if entry.field.trim().is_empty() {
            return Err(DefinitionError::malformed(format!(
                "filter '{}' must be bound to a non-empty field",
                entry.name
            )));
        }
        let control = match FilterControl::canonical_type(&entry.kind).unwrap_or_default() {
            "DateRange" => FilterControl::DateRange {
                default_range: entry.default_range,
            },
            "Dropdown" => FilterControl::Dropdown {
                multi_select: entry.multi_select,
            },
            _ => FilterControl::Unrecognized {
                type_name: entry.kind.clone(),
            },
        };

        Ok(Filter {
            name: entry.name,
            field: entry.field,
            control,
            applies_to: entry.applies_to,
        })
    }
}

impl TryFrom<ScheduleEntry> for RefreshSchedule {
    type Error = DefinitionError;

    fn try_from(entry: ScheduleEntry) -> Result<Self, Self::Error> {
        if entry.timezone.trim().is_empty() {
            return Err(DefinitionError::malformed(
                "refresh_schedule timezone must be a non-empty IANA zone name",
            ));
        }
        Ok(RefreshSchedule {
            frequency: RefreshFrequency::parse(&entry.frequency),
            timezone: entry.timezone,
        })
    }
}
