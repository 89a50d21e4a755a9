use crate::functions::plan::{plan, ProvisionPlans};
use crate::ProvisionError;
use common::config::components::provisioner::ReconcileSettings;
use common::config::loader::{load_definition, read_config};
use common::types::DashboardDefinition;
use dag::types::PlanDirection;
use executor::{CancellationToken, OutcomeReport, Reconciler};
use log::info;
use shared_clients::{create_remote_client, SharedRemote};
use std::path::PathBuf;

/// Bring the remote in line with `definition`.
///
/// Validation and planning both finish before the first remote call, so a
/// broken definition never leaves the remote half-updated.
pub async fn apply(
    definition: &DashboardDefinition,
    remote: SharedRemote,
    settings: ReconcileSettings,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    run(definition, PlanDirection::Apply, remote, settings, cancel).await
}

/// Remove every declared entity from the remote, dependents first.
pub async fn destroy(
    definition: &DashboardDefinition,
    remote: SharedRemote,
    settings: ReconcileSettings,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    run(definition, PlanDirection::Destroy, remote, settings, cancel).await
}

async fn run(
    definition: &DashboardDefinition,
    direction: PlanDirection,
    remote: SharedRemote,
    settings: ReconcileSettings,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    let plans = plan(definition)?;
    reconcile(&plans, direction, remote, settings, cancel).await
}

async fn reconcile(
    plans: &ProvisionPlans,
    direction: PlanDirection,
    remote: SharedRemote,
    settings: ReconcileSettings,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    let selected = match direction {
        PlanDirection::Apply => &plans.apply,
        PlanDirection::Destroy => &plans.destroy,
    };
    let report = Reconciler::new(remote, settings)
        .reconcile(selected, cancel)
        .await?;
    Ok(report)
}

/// [`apply`] driven by `provisioner.yml` in `project_dir` (or the working
/// directory).
pub async fn apply_project(
    project_dir: Option<PathBuf>,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    run_project(project_dir, PlanDirection::Apply, cancel).await
}

pub async fn destroy_project(
    project_dir: Option<PathBuf>,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    run_project(project_dir, PlanDirection::Destroy, cancel).await
}

async fn run_project(
    project_dir: Option<PathBuf>,
    direction: PlanDirection,
    cancel: CancellationToken,
) -> Result<OutcomeReport, ProvisionError> {
    let config = read_config(project_dir)?;
    let definition = load_definition(&config.definition_path)?;
    info!(
        "loaded '{}' from {}",
        definition.name,
        config.definition_path.display()
    );
    // fail on a bad definition before touching credentials
    let plans = plan(&definition)?;
    let remote = create_remote_client(&config.remote)?;
    reconcile(&plans, direction, remote, config.reconcile, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{EntityKind, EntityRef};
    use executor::Outcome;
    use std::sync::Arc;
    use test_utils::fixtures::{
        data_source, dataset, definition, kpi, telematics_definition, TELEMATICS_DASHBOARD,
    };
    use test_utils::init_test_logger;
    use test_utils::remotes::ScriptedRemote;

    #[tokio::test]
    async fn invalid_definition_never_reaches_the_remote() {
        init_test_logger();
        let def = definition(
            vec![data_source("athena")],
            vec![dataset("x", "athena"), dataset("x", "athena")],
            vec![kpi("orphan_kpi", "y")],
            vec![],
        );
        let remote = ScriptedRemote::new();

        let err = apply(
            &def,
            Arc::new(remote.clone()),
            ReconcileSettings::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            ProvisionError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error {other}"),
        }
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn apply_then_destroy_round_trip() {
        let def = telematics_definition();
        let remote = ScriptedRemote::new();
        let shared: SharedRemote = Arc::new(remote.clone());

        let applied = apply(
            &def,
            shared.clone(),
            ReconcileSettings::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(applied.is_success());
        assert!(remote
            .store()
            .contains(&EntityRef::new(EntityKind::Visual, "total_distance")));

        let destroyed = destroy(
            &def,
            shared,
            ReconcileSettings::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(destroyed
            .entries
            .iter()
            .all(|e| e.outcome == Outcome::Deleted));
        assert!(remote.store().is_empty());
    }

    #[tokio::test]
    async fn project_config_drives_a_memory_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dashboard.yml"), TELEMATICS_DASHBOARD).unwrap();
        std::fs::write(
            dir.path().join("provisioner.yml"),
            "definition: dashboard.yml\nremote:\n  kind: memory\nreconcile:\n  dry_run: true\n",
        )
        .unwrap();

        let report = apply_project(Some(dir.path().to_path_buf()), CancellationToken::new())
            .await
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(
            report.summary().planned,
            telematics_definition().entities().len()
        );
    }

    #[tokio::test]
    async fn missing_project_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = destroy_project(Some(dir.path().to_path_buf()), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Config(_)));
    }
}
