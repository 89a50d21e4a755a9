mod error;

pub use crate::error::{ValidationError, ValidationErrorKind, ValidationErrors};

use common::types::{
    Chart, DashboardDefinition, EntityKind, EntityRef, FilterControl, Identified,
};
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Check a definition before anything is planned or sent to the remote.
///
/// Checks run in a fixed order so the error list is deterministic:
///
/// 1. identifier uniqueness (data sources, datasets, visuals, filters)
/// 2. references (dataset → data source, visual → dataset, filter → visual)
/// 3. enum values (visual type, filter type, refresh frequency)
/// 4. visual geometry
/// 5. non-empty dataset queries
///
/// Nothing short-circuits; one pass reports every defect.
pub fn validate(definition: &DashboardDefinition) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    check_unique_identifiers(definition, &mut errors);
    check_references(definition, &mut errors);
    check_enum_values(definition, &mut errors);
    check_geometry(definition, &mut errors);
    check_queries(definition, &mut errors);

    if errors.is_empty() {
        info!("definition '{}' passed validation", definition.name);
        Ok(())
    } else {
        debug!(
            "definition '{}' failed validation with {} error(s)",
            definition.name,
            errors.len()
        );
        Err(ValidationErrors(errors))
    }
}

fn duplicates<'a, T: Identified + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<&'a str> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut dups = Vec::new();
    for item in items {
        let count = seen.entry(item.identifier()).or_default();
        *count += 1;
        if *count == 2 {
            dups.push(item.identifier());
        }
    }
    dups
}

fn check_unique_identifiers(def: &DashboardDefinition, errors: &mut Vec<ValidationError>) {
    let collections: [(EntityKind, Vec<&str>); 4] = [
        (EntityKind::DataSource, duplicates(&def.data_sources)),
        (EntityKind::Dataset, duplicates(&def.datasets)),
        (EntityKind::Visual, duplicates(&def.visuals)),
        (EntityKind::Filter, duplicates(&def.filters)),
    ];
    for (kind, dups) in collections {
        for id in dups {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateIdentifier,
                EntityRef::new(kind, id),
                format!("{kind} '{id}' is declared more than once"),
            ));
        }
    }
}

fn check_references(def: &DashboardDefinition, errors: &mut Vec<ValidationError>) {
    let sources: HashSet<&str> = def.data_sources.iter().map(|s| s.identifier()).collect();
    let datasets: HashSet<&str> = def.datasets.iter().map(|d| d.identifier()).collect();
    let visuals: HashSet<&str> = def.visual_ids().collect();

    for dataset in &def.datasets {
        if !sources.contains(dataset.data_source.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                EntityRef::new(EntityKind::Dataset, &dataset.id),
                format!(
                    "dataset '{}' references unknown data source '{}'",
                    dataset.id, dataset.data_source
                ),
            ));
        }
    }

    for visual in &def.visuals {
        if !datasets.contains(visual.dataset.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                EntityRef::new(EntityKind::Visual, &visual.id),
                format!(
                    "visual '{}' references unknown dataset '{}'",
                    visual.id, visual.dataset
                ),
            ));
        }
    }

    for filter in &def.filters {
        for target in filter.applies_to.iter().filter(|t| !visuals.contains(t.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                EntityRef::new(EntityKind::Filter, &filter.name),
                format!("filter '{}' applies to unknown visual '{}'", filter.name, target),
            ));
        }
    }
}

fn check_enum_values(def: &DashboardDefinition, errors: &mut Vec<ValidationError>) {
    for visual in def.visuals.iter().filter(|v| !v.chart.is_recognized()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidEnumValue,
            EntityRef::new(EntityKind::Visual, &visual.id),
            format!(
                "visual type '{}' is not one of {}",
                visual.chart.type_name(),
                Chart::KNOWN_TYPES.join(", ")
            ),
        ));
    }

    for filter in def.filters.iter().filter(|f| !f.control.is_recognized()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidEnumValue,
            EntityRef::new(EntityKind::Filter, &filter.name),
            format!(
                "filter type '{}' is not one of {}",
                filter.control.type_name(),
                FilterControl::KNOWN_TYPES.join(", ")
            ),
        ));
    }

    let schedule = &def.refresh_schedule;
    if !schedule.frequency.is_recognized() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidEnumValue,
            EntityRef::new(EntityKind::RefreshSchedule, schedule.identifier()),
            format!(
                "refresh frequency '{}' is not one of {}",
                schedule.frequency.as_str(),
                common::types::RefreshFrequency::KNOWN_VALUES.join(", ")
            ),
        ));
    }
}

fn check_geometry(def: &DashboardDefinition, errors: &mut Vec<ValidationError>) {
    for visual in def.visuals.iter().filter(|v| !v.position.has_valid_geometry()) {
        let p = visual.position;
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidGeometry,
            EntityRef::new(EntityKind::Visual, &visual.id),
            format!(
                "visual '{}' has position x={} y={} width={} height={}; width and height must be positive and x, y non-negative",
                visual.id, p.x, p.y, p.width, p.height
            ),
        ));
    }
}

fn check_queries(def: &DashboardDefinition, errors: &mut Vec<ValidationError>) {
    for dataset in def.datasets.iter().filter(|d| !d.has_query()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyQuery,
            EntityRef::new(EntityKind::Dataset, &dataset.id),
            format!("dataset '{}' has an empty query", dataset.id),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{Chart, RefreshFrequency};
    use test_utils::fixtures::{
        bar_chart, data_source, dataset, date_filter, definition, kpi, telematics_definition,
    };

    #[test]
    fn telematics_fixture_is_valid() {
        assert!(validate(&telematics_definition()).is_ok());
    }

    #[test]
    fn duplicate_dataset_and_dangling_visual_yield_exactly_two_errors() {
        let def = definition(
            vec![data_source("athena")],
            vec![dataset("x", "athena"), dataset("x", "athena")],
            vec![kpi("orphan_kpi", "y")],
            vec![],
        );

        let errs = validate(&def).unwrap_err();
        assert_eq!(
            errs.kinds(),
            vec![
                ValidationErrorKind::DuplicateIdentifier,
                ValidationErrorKind::DanglingReference
            ]
        );
        assert_eq!(errs.errors()[0].entity, EntityRef::new(EntityKind::Dataset, "x"));
        assert_eq!(
            errs.errors()[1].entity,
            EntityRef::new(EntityKind::Visual, "orphan_kpi")
        );
    }

    #[test]
    fn zero_width_is_invalid_geometry() {
        let mut visual = bar_chart("distance", "daily");
        visual.position.width = 0;
        let def = definition(
            vec![data_source("athena")],
            vec![dataset("daily", "athena")],
            vec![visual],
            vec![],
        );

        let errs = validate(&def).unwrap_err();
        assert_eq!(errs.kinds(), vec![ValidationErrorKind::InvalidGeometry]);
        assert!(errs.errors()[0].message().contains("width=0"));
    }

    #[test]
    fn negative_offset_is_invalid_geometry() {
        let mut visual = kpi("total", "daily");
        visual.position.x = -2;
        let def = definition(
            vec![data_source("athena")],
            vec![dataset("daily", "athena")],
            vec![visual],
            vec![],
        );
        assert_eq!(
            validate(&def).unwrap_err().kinds(),
            vec![ValidationErrorKind::InvalidGeometry]
        );
    }

    #[test]
    fn errors_are_reported_in_check_order() {
        let mut blank = dataset("blank", "athena");
        blank.sql = "   \n".into();
        let mut gauge = kpi("gauge", "blank");
        gauge.chart = Chart::Unrecognized {
            type_name: "Gauge".into(),
        };
        gauge.position.height = 0;
        let mut def = definition(
            vec![data_source("athena")],
            vec![blank, dataset("sales", "nowhere")],
            vec![gauge],
            vec![date_filter("period", "day"), date_filter("period", "day")],
        );
        def.refresh_schedule.frequency = RefreshFrequency::Unrecognized("YEARLY".into());

        let errs = validate(&def).unwrap_err();
        assert_eq!(
            errs.kinds(),
            vec![
                ValidationErrorKind::DuplicateIdentifier,
                ValidationErrorKind::DanglingReference,
                ValidationErrorKind::InvalidEnumValue,
                ValidationErrorKind::InvalidEnumValue,
                ValidationErrorKind::InvalidGeometry,
                ValidationErrorKind::EmptyQuery,
            ]
        );
        assert_eq!(
            errs.errors()[3].entity,
            EntityRef::new(EntityKind::RefreshSchedule, "refresh_schedule")
        );
    }

    #[test]
    fn dataset_with_unknown_source_is_dangling() {
        let def = definition(
            vec![data_source("athena")],
            vec![dataset("daily", "redshift")],
            vec![],
            vec![],
        );
        let errs = validate(&def).unwrap_err();
        assert_eq!(errs.kinds(), vec![ValidationErrorKind::DanglingReference]);
        assert!(errs.errors()[0].message().contains("redshift"));
    }

    #[test]
    fn filter_scoped_to_unknown_visual_is_dangling() {
        let mut filter = date_filter("period", "day");
        filter.applies_to = vec!["total".into(), "missing".into()];
        let def = definition(
            vec![data_source("athena")],
            vec![dataset("daily", "athena")],
            vec![kpi("total", "daily")],
            vec![filter],
        );
        let errs = validate(&def).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.errors()[0].entity, EntityRef::new(EntityKind::Filter, "period"));
    }

    #[test]
    fn triple_declaration_reports_one_duplicate() {
        let def = definition(
            vec![data_source("a"), data_source("a"), data_source("a")],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(validate(&def).unwrap_err().len(), 1);
    }
}
