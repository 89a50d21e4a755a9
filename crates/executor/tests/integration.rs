use common::config::components::provisioner::ReconcileSettings;
use common::types::{DashboardDefinition, EntityKind, EntityRef, EntitySpec};
use dag::types::ProvisionPlan;
use dag::ProvisionDag;
use executor::{Action, CancellationToken, ExecutorError, Outcome, Reconciler, RunMode};
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::{
    data_source, dataset, date_filter, definition, kpi, telematics_definition,
    two_chain_definition,
};
use test_utils::init_test_logger;
use test_utils::remotes::{RemoteOp, ScriptedRemote};

fn settings() -> ReconcileSettings {
    ReconcileSettings {
        concurrency: 4,
        call_timeout_ms: 2_000,
        prune: false,
        dry_run: false,
    }
}

fn apply_plan(def: &DashboardDefinition) -> ProvisionPlan {
    ProvisionDag::build(def).unwrap().apply_plan().unwrap()
}

fn destroy_plan(def: &DashboardDefinition) -> ProvisionPlan {
    ProvisionDag::build(def).unwrap().destroy_plan().unwrap()
}

fn reconciler(remote: &ScriptedRemote, settings: ReconcileSettings) -> Reconciler {
    Reconciler::new(Arc::new(remote.clone()), settings)
}

fn r(kind: EntityKind, id: &str) -> EntityRef {
    EntityRef::new(kind, id)
}

#[tokio::test]
async fn second_apply_without_drift_skips_everything() -> Result<(), ExecutorError> {
    init_test_logger();
    let def = telematics_definition();
    let plan = apply_plan(&def);
    let remote = ScriptedRemote::new();

    let first = reconciler(&remote, settings())
        .reconcile(&plan, CancellationToken::new())
        .await?;
    assert_eq!(first.mode, RunMode::Apply);
    assert_eq!(first.summary().created, plan.len());
    assert_eq!(remote.store().len(), plan.len());

    let mutations_after_first = remote.mutations().len();
    let second = reconciler(&remote, settings())
        .reconcile(&plan, CancellationToken::new())
        .await?;
    assert_eq!(second.summary().skipped, plan.len());
    assert!(second.entries.iter().all(|e| e.outcome == Outcome::Skipped));
    assert_eq!(remote.mutations().len(), mutations_after_first);
    Ok(())
}

#[tokio::test]
async fn drifted_entity_is_updated_and_missing_one_created() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let missing = r(EntityKind::Filter, "period");
    let remote = ScriptedRemote::new();
    for spec in def.entities() {
        if spec.entity_ref() != missing {
            remote.store().seed(spec);
        }
    }
    let mut stale = dataset("dataset_a", "source_a");
    stale.sql = "SELECT 1".into();
    remote.store().seed(EntitySpec::Dataset(stale));
    // was a bar chart in the definition
    remote
        .store()
        .seed(EntitySpec::Visual(kpi("visual_b", "dataset_b")));

    let report = reconciler(&remote, settings())
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert_eq!(
        report.outcome(&r(EntityKind::Dataset, "dataset_a")),
        Some(&Outcome::Updated)
    );
    assert_eq!(
        report.outcome(&r(EntityKind::Visual, "visual_b")),
        Some(&Outcome::Updated)
    );
    assert!(matches!(
        report.outcome(&missing),
        Some(Outcome::Created { .. })
    ));
    assert_eq!(
        report.outcome(&r(EntityKind::DataSource, "source_a")),
        Some(&Outcome::Skipped)
    );
    assert_eq!(
        remote.store().entity(&r(EntityKind::Dataset, "dataset_a")),
        def.dataset("dataset_a").cloned().map(EntitySpec::Dataset)
    );
    Ok(())
}

#[tokio::test]
async fn failure_only_blocks_hard_dependents() -> Result<(), ExecutorError> {
    init_test_logger();
    let def = two_chain_definition();
    let remote = ScriptedRemote::new();
    remote.fail_on(RemoteOp::Create, r(EntityKind::Dataset, "dataset_a"));

    let report = reconciler(&remote, settings())
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert!(matches!(
        report.outcome(&r(EntityKind::Dataset, "dataset_a")),
        Some(Outcome::Failed { reason }) if reason.contains("scripted create failure")
    ));
    match report.outcome(&r(EntityKind::Visual, "visual_a")) {
        Some(Outcome::Failed { reason }) => {
            assert_eq!(reason, "dependency dataset/dataset_a failed")
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    // the blocked visual never reached the remote
    assert!(remote.calls_for(&r(EntityKind::Visual, "visual_a")).is_empty());

    for entity in [
        r(EntityKind::DataSource, "source_a"),
        r(EntityKind::DataSource, "source_b"),
        r(EntityKind::Dataset, "dataset_b"),
        r(EntityKind::Visual, "visual_b"),
        // ordering-only edge: still attempted
        r(EntityKind::Filter, "period"),
    ] {
        assert!(
            matches!(report.outcome(&entity), Some(Outcome::Created { .. })),
            "{entity} should have been created"
        );
    }
    assert!(matches!(
        report.outcome(&r(EntityKind::RefreshSchedule, "refresh_schedule")),
        Some(Outcome::Failed { .. })
    ));
    assert!(!report.is_success());
    assert_eq!(report.summary().failed, 3);
    Ok(())
}

#[tokio::test]
async fn cancellation_finishes_in_flight_and_cancels_the_rest() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let plan = apply_plan(&def);
    let remote = ScriptedRemote::new();
    let gate = remote.gate_on(r(EntityKind::DataSource, "source_a"));
    let token = CancellationToken::new();

    let mut single = settings();
    single.concurrency = 1;
    let reconciler = reconciler(&remote, single);
    let run = tokio::spawn({
        let token = token.clone();
        let plan = plan.clone();
        async move { reconciler.reconcile(&plan, token).await }
    });

    gate.entered().await;
    token.cancel();
    gate.open();
    let report = run.await.expect("reconcile task")?;

    assert!(matches!(
        report.outcome(&r(EntityKind::DataSource, "source_a")),
        Some(Outcome::Created { .. })
    ));
    assert_eq!(report.entries.len(), plan.len());
    assert_eq!(report.summary().cancelled, plan.len() - 1);
    assert_eq!(remote.mutations().len(), 1);
    assert!(report.warnings.iter().any(|w| w.contains("cancelled")));
    Ok(())
}

#[tokio::test]
async fn slow_call_times_out_as_failure() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let remote = ScriptedRemote::new();
    remote.delay_on(r(EntityKind::Dataset, "dataset_b"), Duration::from_secs(30));
    let mut quick = settings();
    quick.call_timeout_ms = 50;

    let report = reconciler(&remote, quick)
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    match report.outcome(&r(EntityKind::Dataset, "dataset_b")) {
        Some(Outcome::Failed { reason }) => assert!(reason.contains("timed out")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(matches!(
        report.outcome(&r(EntityKind::Visual, "visual_b")),
        Some(Outcome::Failed { .. })
    ));
    assert!(matches!(
        report.outcome(&r(EntityKind::Visual, "visual_a")),
        Some(Outcome::Created { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn undeclared_entities_are_reported_or_pruned() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let plan = apply_plan(&def);
    let legacy = r(EntityKind::Visual, "legacy_chart");
    let remote = ScriptedRemote::new();
    remote
        .store()
        .seed(EntitySpec::Visual(kpi("legacy_chart", "dataset_a")));

    let report = reconciler(&remote, settings())
        .reconcile(&plan, CancellationToken::new())
        .await?;
    assert_eq!(report.entries.last().map(|e| &e.entity), Some(&legacy));
    assert_eq!(report.outcome(&legacy), Some(&Outcome::Orphaned));
    assert!(remote.store().contains(&legacy));

    let mut prune = settings();
    prune.prune = true;
    let report = reconciler(&remote, prune)
        .reconcile(&plan, CancellationToken::new())
        .await?;
    assert_eq!(report.outcome(&legacy), Some(&Outcome::Deleted));
    assert!(!remote.store().contains(&legacy));
    Ok(())
}

#[tokio::test]
async fn dry_run_reports_planned_actions_without_mutating() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let remote = ScriptedRemote::new();
    let legacy = r(EntityKind::Filter, "legacy");
    remote
        .store()
        .seed(EntitySpec::Filter(date_filter("legacy", "day")));

    let mut dry = settings();
    dry.dry_run = true;
    dry.prune = true;
    let report = reconciler(&remote, dry)
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert!(report.dry_run);
    assert!(remote.mutations().is_empty());
    assert_eq!(remote.store().len(), 1);
    assert_eq!(
        report.outcome(&r(EntityKind::Visual, "visual_a")),
        Some(&Outcome::Planned {
            action: Action::Create
        })
    );
    assert_eq!(
        report.outcome(&legacy),
        Some(&Outcome::Planned {
            action: Action::Delete
        })
    );
    Ok(())
}

#[tokio::test]
async fn destroy_deletes_in_reverse_order_and_is_idempotent() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let remote = ScriptedRemote::new();
    reconciler(&remote, settings())
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    let plan = destroy_plan(&def);
    let mut sequential = settings();
    sequential.concurrency = 1;
    let report = reconciler(&remote, sequential)
        .reconcile(&plan, CancellationToken::new())
        .await?;

    assert_eq!(report.mode, RunMode::Destroy);
    assert_eq!(report.summary().deleted, plan.len());
    assert!(remote.store().is_empty());
    let deleted: Vec<EntityRef> = remote
        .mutations()
        .into_iter()
        .filter(|c| c.op == RemoteOp::Delete)
        .map(|c| c.entity)
        .collect();
    assert_eq!(deleted, plan.entity_refs());

    let again = reconciler(&remote, settings())
        .reconcile(&plan, CancellationToken::new())
        .await?;
    assert_eq!(again.summary().skipped, plan.len());
    Ok(())
}

#[tokio::test]
async fn failed_delete_keeps_its_dependencies() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let remote = ScriptedRemote::new();
    for spec in def.entities() {
        remote.store().seed(spec);
    }
    remote.fail_on(RemoteOp::Delete, r(EntityKind::Visual, "visual_a"));

    let report = reconciler(&remote, settings())
        .reconcile(&destroy_plan(&def), CancellationToken::new())
        .await?;

    for entity in [
        r(EntityKind::Dataset, "dataset_a"),
        r(EntityKind::DataSource, "source_a"),
    ] {
        assert!(matches!(report.outcome(&entity), Some(Outcome::Failed { .. })));
        assert!(remote.store().contains(&entity));
    }
    assert_eq!(
        report.outcome(&r(EntityKind::Dataset, "dataset_b")),
        Some(&Outcome::Deleted)
    );
    assert!(report.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_listing_becomes_a_warning() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let remote = ScriptedRemote::new();
    remote.fail_list(EntityKind::Visual);

    let report = reconciler(&remote, settings())
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert!(report.is_success());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("visual"));
    Ok(())
}

#[tokio::test]
async fn independent_steps_overlap_up_to_the_limit() -> Result<(), ExecutorError> {
    let names: Vec<String> = (0..6).map(|i| format!("source_{i}")).collect();
    let def = definition(
        names.iter().map(|n| data_source(n)).collect(),
        vec![],
        vec![],
        vec![],
    );
    let remote = ScriptedRemote::new();
    for name in &names {
        remote.delay_on(r(EntityKind::DataSource, name), Duration::from_millis(40));
    }
    let mut limited = settings();
    limited.concurrency = 2;

    let report = reconciler(&remote, limited)
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert_eq!(report.summary().created, def.entities().len());
    let peak = remote.peak_in_flight();
    assert!(peak > 1 && peak <= 2, "peak in flight was {peak}");
    Ok(())
}

#[tokio::test]
async fn pruning_keeps_orphans_a_failed_orphan_still_needs() -> Result<(), ExecutorError> {
    init_test_logger();
    let def = two_chain_definition();
    let old_source = r(EntityKind::DataSource, "legacy_source");
    let old_dataset = r(EntityKind::Dataset, "legacy_dataset");
    let old_visual = r(EntityKind::Visual, "legacy_visual");
    let spare_source = r(EntityKind::DataSource, "spare_source");
    let remote = ScriptedRemote::new();
    remote
        .store()
        .seed(EntitySpec::DataSource(data_source("legacy_source")));
    remote
        .store()
        .seed(EntitySpec::Dataset(dataset("legacy_dataset", "legacy_source")));
    remote
        .store()
        .seed(EntitySpec::Visual(kpi("legacy_visual", "legacy_dataset")));
    remote
        .store()
        .seed(EntitySpec::DataSource(data_source("spare_source")));
    remote.fail_on(RemoteOp::Delete, old_visual.clone());

    let mut prune = settings();
    prune.prune = true;
    let report = reconciler(&remote, prune)
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert!(matches!(
        report.outcome(&old_visual),
        Some(Outcome::Failed { reason }) if reason.contains("scripted delete failure")
    ));
    assert_eq!(
        report.outcome(&old_dataset),
        Some(&Outcome::failed("dependent visual/legacy_visual failed"))
    );
    assert_eq!(
        report.outcome(&old_source),
        Some(&Outcome::failed("dependent dataset/legacy_dataset failed"))
    );
    assert_eq!(report.outcome(&spare_source), Some(&Outcome::Deleted));

    for entity in [&old_visual, &old_dataset, &old_source] {
        assert!(remote.store().contains(entity), "{entity} should remain");
    }
    assert!(!remote.store().contains(&spare_source));
    assert!(!remote.calls_for(&old_dataset).contains(&RemoteOp::Delete));
    assert!(!remote.calls_for(&old_source).contains(&RemoteOp::Delete));
    Ok(())
}

#[tokio::test]
async fn pruning_waits_for_dependents_that_could_not_be_listed() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let old_dataset = r(EntityKind::Dataset, "legacy_dataset");
    let remote = ScriptedRemote::new();
    remote
        .store()
        .seed(EntitySpec::Dataset(dataset("legacy_dataset", "source_a")));
    remote.fail_list(EntityKind::Visual);

    let mut prune = settings();
    prune.prune = true;
    let report = reconciler(&remote, prune)
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    assert_eq!(report.outcome(&old_dataset), Some(&Outcome::Orphaned));
    assert!(remote.store().contains(&old_dataset));
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[1].contains("not pruned"));
    Ok(())
}

#[tokio::test]
async fn orphan_listed_twice_is_reported_once() -> Result<(), ExecutorError> {
    let def = two_chain_definition();
    let legacy = r(EntityKind::Filter, "legacy");
    let remote = ScriptedRemote::new();
    remote
        .store()
        .seed(EntitySpec::Filter(date_filter("legacy", "day")));
    remote.double_list(EntityKind::Filter);

    let report = reconciler(&remote, settings())
        .reconcile(&apply_plan(&def), CancellationToken::new())
        .await?;

    let hits = report.entries.iter().filter(|e| e.entity == legacy).count();
    assert_eq!(hits, 1);
    assert_eq!(report.outcome(&legacy), Some(&Outcome::Orphaned));
    Ok(())
}
