use crate::functions::validate::validate;
use crate::ProvisionError;
use common::types::DashboardDefinition;
use dag::types::ProvisionPlan;
use dag::ProvisionDag;
use log::info;
use std::path::Path;

/// Both plans for a definition, plus the graph they were derived from.
#[derive(Debug)]
pub struct ProvisionPlans {
    pub dag: ProvisionDag,
    pub apply: ProvisionPlan,
    pub destroy: ProvisionPlan,
}

impl ProvisionPlans {
    pub fn export_dot_to(&self, path: &Path) -> Result<(), ProvisionError> {
        self.dag.export_dot_to(path)?;
        Ok(())
    }
}

/// Validate, then build the dependency graph and both plans.
pub fn plan(definition: &DashboardDefinition) -> Result<ProvisionPlans, ProvisionError> {
    validate(definition)?;
    let dag = ProvisionDag::build(definition)?;
    let apply = dag.apply_plan()?;
    let destroy = dag.destroy_plan()?;
    info!(
        "planned '{}': {} entities",
        definition.name,
        apply.len()
    );
    Ok(ProvisionPlans {
        dag,
        apply,
        destroy,
    })
}
