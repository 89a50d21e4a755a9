use crate::types::{
    DataSource, Dataset, EntityRef, EntitySpec, Filter, Identified, RefreshSchedule, Visual,
};
use std::collections::HashSet;

/// Root of a parsed dashboard definition.
///
/// Built once by the loader and only ever read afterwards; planning and
/// reconciliation derive new values from it instead of editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardDefinition {
    pub name: String,
    pub description: String,
    pub data_sources: Vec<DataSource>,
    pub datasets: Vec<Dataset>,
    pub visuals: Vec<Visual>,
    pub filters: Vec<Filter>,
    pub refresh_schedule: RefreshSchedule,
}

impl DashboardDefinition {
    pub fn data_source(&self, name: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|s| s.name == name)
    }

    pub fn dataset(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn visual(&self, id: &str) -> Option<&Visual> {
        self.visuals.iter().find(|v| v.id == id)
    }

    /// All entities in declaration order, kinds grouped source-first.
    pub fn entities(&self) -> Vec<EntitySpec> {
        let mut entities = Vec::with_capacity(
            self.data_sources.len() + self.datasets.len() + self.visuals.len() + self.filters.len() + 1,
        );
        entities.extend(self.data_sources.iter().cloned().map(EntitySpec::from));
        entities.extend(self.datasets.iter().cloned().map(EntitySpec::from));
        entities.extend(self.visuals.iter().cloned().map(EntitySpec::from));
        entities.extend(self.filters.iter().cloned().map(EntitySpec::from));
        entities.push(EntitySpec::from(self.refresh_schedule.clone()));
        entities
    }

    pub fn declared_refs(&self) -> HashSet<EntityRef> {
        self.entities().iter().map(EntitySpec::entity_ref).collect()
    }

    pub fn visual_ids(&self) -> impl Iterator<Item = &str> {
        self.visuals.iter().map(|v| v.identifier())
    }
}
