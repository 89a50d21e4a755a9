use common::config::loader::parse_definition;
use common::types::{
    AxisBindings, Chart, DashboardDefinition, DataSource, Dataset, Filter, FilterControl,
    Position, RefreshFrequency, RefreshSchedule, Visual,
};
use std::collections::BTreeMap;

/// Fleet telematics dashboard over an Athena catalog.
pub const TELEMATICS_DASHBOARD: &str = r#"
dashboard_name: Telematics Overview
description: Fleet metrics sourced from S3 tables
data_sources:
  - name: telematics_athena
    connection:
      catalog: s3tablescatalog/telematics
      database: telematics
      table: vehicle_data
      workgroup: primary
datasets:
  - id: daily_distance
    name: Daily distance
    data_source: telematics_athena
    sql: SELECT day, sum(km) AS km FROM vehicle_data GROUP BY day
  - id: fuel_by_model
    name: Fuel by model
    data_source: telematics_athena
    sql: SELECT model, avg(fuel) AS fuel FROM vehicle_data GROUP BY model
visuals:
  - type: KPI
    title: Total Distance
    dataset: daily_distance
    field: km
    position: { x: 0, y: 0, width: 4, height: 2 }
  - type: LineChart
    title: Distance per day
    dataset: daily_distance
    x_axis: day
    y_axis: km
    position: { x: 4, y: 0, width: 8, height: 4 }
  - id: fuel_share
    type: DonutChart
    title: Fuel share
    dataset: fuel_by_model
    category: model
    value: fuel
    position: { x: 0, y: 4, width: 6, height: 4 }
filters:
  - name: period
    type: DateRange
    field: day
    default_range: LAST_7_DAYS
  - name: model
    type: Dropdown
    field: model
    multi_select: true
refresh_schedule:
  frequency: HOURLY
  timezone: Asia/Shanghai
"#;

pub fn telematics_definition() -> DashboardDefinition {
    parse_definition(TELEMATICS_DASHBOARD).expect("telematics fixture parses")
}

pub fn data_source(name: &str) -> DataSource {
    DataSource {
        name: name.to_string(),
        connection: BTreeMap::from([("workgroup".to_string(), "primary".to_string())]),
    }
}

pub fn dataset(id: &str, data_source: &str) -> Dataset {
    Dataset {
        id: id.to_string(),
        name: id.replace('_', " "),
        sql: format!("SELECT * FROM {id}"),
        data_source: data_source.to_string(),
    }
}

fn position() -> Position {
    Position {
        x: 0,
        y: 0,
        width: 4,
        height: 2,
    }
}

pub fn kpi(id: &str, dataset: &str) -> Visual {
    Visual {
        id: id.to_string(),
        title: id.to_string(),
        dataset: dataset.to_string(),
        chart: Chart::Kpi {
            field: "total".to_string(),
        },
        position: position(),
    }
}

pub fn bar_chart(id: &str, dataset: &str) -> Visual {
    Visual {
        id: id.to_string(),
        title: id.to_string(),
        dataset: dataset.to_string(),
        chart: Chart::BarChart(AxisBindings {
            x_axis: "day".to_string(),
            y_axis: vec!["total".to_string()],
            group_by: None,
        }),
        position: position(),
    }
}

pub fn date_filter(name: &str, field: &str) -> Filter {
    Filter {
        name: name.to_string(),
        field: field.to_string(),
        control: FilterControl::DateRange {
            default_range: None,
        },
        applies_to: Vec::new(),
    }
}

/// Assemble a definition with a daily UTC refresh schedule.
pub fn definition(
    data_sources: Vec<DataSource>,
    datasets: Vec<Dataset>,
    visuals: Vec<Visual>,
    filters: Vec<Filter>,
) -> DashboardDefinition {
    DashboardDefinition {
        name: "Test dashboard".to_string(),
        description: String::new(),
        data_sources,
        datasets,
        visuals,
        filters,
        refresh_schedule: RefreshSchedule {
            frequency: RefreshFrequency::Daily,
            timezone: "UTC".to_string(),
        },
    }
}

/// Two independent source → dataset → visual chains plus one filter.
pub fn two_chain_definition() -> DashboardDefinition {
    definition(
        vec![data_source("source_a"), data_source("source_b")],
        vec![dataset("dataset_a", "source_a"), dataset("dataset_b", "source_b")],
        vec![kpi("visual_a", "dataset_a"), bar_chart("visual_b", "dataset_b")],
        vec![date_filter("period", "day")],
    )
}
