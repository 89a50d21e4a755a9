use crate::ledger::OutcomeLedger;
use crate::report::{OutcomeEntry, OutcomeReport};
use crate::types::{Action, Outcome, RunMode};
use crate::ExecutorError;
use chrono::Utc;
use common::config::components::provisioner::ReconcileSettings;
use common::types::{EntityKind, EntityRef, EntitySpec};
use dag::types::{DependencyEdge, PlanDirection, PlanStep, ProvisionPlan};
use log::{debug, info, warn};
use shared_clients::{RemoteApi, RemoteClientError, SharedRemote};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

type StepResult = Result<(), ExecutorError>;

enum Readiness {
    Ready,
    Waiting,
    Blocked(EntityRef),
}

/// Drives a [`ProvisionPlan`] against the remote.
///
/// One coordinating loop dispatches every step whose requirements have
/// settled, at most `concurrency` at a time and in plan order. Step tasks
/// write their own outcome into a shared [`OutcomeLedger`].
pub struct Reconciler {
    remote: SharedRemote,
    settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(remote: SharedRemote, settings: ReconcileSettings) -> Self {
        Self { remote, settings }
    }

    pub async fn reconcile(
        &self,
        plan: &ProvisionPlan,
        cancel: CancellationToken,
    ) -> Result<OutcomeReport, ExecutorError> {
        let started_at = Utc::now();
        let ledger = Arc::new(OutcomeLedger::new());
        info!(
            "reconciling {} step(s) ({:?}, concurrency {}, dry run {})",
            plan.len(),
            plan.direction,
            self.settings.concurrency,
            self.settings.dry_run
        );

        self.run_steps(plan, &cancel, &ledger).await?;

        let mut warnings = Vec::new();
        let mut orphans = Vec::new();
        if plan.direction == PlanDirection::Apply {
            if cancel.is_cancelled() {
                warnings.push("orphan sweep skipped: run was cancelled".to_string());
            } else {
                orphans = self
                    .sweep_orphans(plan, &cancel, &ledger, &mut warnings)
                    .await?;
            }
        }

        let mut entries = Vec::with_capacity(plan.len() + orphans.len());
        for entity in plan.entity_refs().into_iter().chain(orphans) {
            let outcome = ledger
                .take(&entity)
                .ok_or_else(|| ExecutorError::missing_outcome(&entity))?;
            entries.push(OutcomeEntry { entity, outcome });
        }

        let report = OutcomeReport {
            mode: RunMode::from(plan.direction),
            dry_run: self.settings.dry_run,
            started_at,
            finished_at: Utc::now(),
            entries,
            warnings,
        };
        let s = report.summary();
        info!(
            "reconcile finished: {} created, {} updated, {} skipped, {} deleted, {} orphaned, {} failed, {} cancelled, {} planned",
            s.created, s.updated, s.skipped, s.deleted, s.orphaned, s.failed, s.cancelled, s.planned
        );
        Ok(report)
    }

    async fn run_steps(
        &self,
        plan: &ProvisionPlan,
        cancel: &CancellationToken,
        ledger: &Arc<OutcomeLedger>,
    ) -> Result<(), ExecutorError> {
        let in_plan: HashSet<EntityRef> = plan.entity_refs().into_iter().collect();
        let limit = self.settings.concurrency.max(1);
        let mut pending: Vec<&PlanStep> = plan.steps.iter().collect();
        let mut in_flight: JoinSet<StepResult> = JoinSet::new();
        let mut running: HashMap<Id, EntityRef> = HashMap::new();

        loop {
            if !cancel.is_cancelled() {
                self.dispatch_ready(
                    plan.direction,
                    &mut pending,
                    &in_plan,
                    ledger,
                    &mut in_flight,
                    &mut running,
                    limit,
                )?;
            }

            if in_flight.is_empty() {
                if !pending.is_empty() && !cancel.is_cancelled() {
                    // only reachable when the plan is not topologically ordered
                    for step in pending.drain(..) {
                        ledger.record(
                            step.entity_ref(),
                            Outcome::failed("requirements can never be satisfied"),
                        )?;
                    }
                }
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(
                        "cancellation requested; waiting for {} in-flight step(s)",
                        in_flight.len()
                    );
                    break;
                }
                Some(joined) = in_flight.join_next() => {
                    settle(joined, &running, ledger)?;
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            settle(joined, &running, ledger)?;
        }

        for step in pending {
            let entity = step.entity_ref();
            debug!("{entity} cancelled before it started");
            ledger.record(entity, Outcome::Cancelled)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_ready(
        &self,
        direction: PlanDirection,
        pending: &mut Vec<&PlanStep>,
        in_plan: &HashSet<EntityRef>,
        ledger: &Arc<OutcomeLedger>,
        in_flight: &mut JoinSet<StepResult>,
        running: &mut HashMap<Id, EntityRef>,
        limit: usize,
    ) -> Result<(), ExecutorError> {
        let mut i = 0;
        while i < pending.len() && in_flight.len() < limit {
            let step = pending[i];
            match readiness(step, in_plan, ledger) {
                Readiness::Waiting => i += 1,
                Readiness::Blocked(dep) => {
                    let entity = step.entity_ref();
                    let relation = match direction {
                        PlanDirection::Apply => "dependency",
                        PlanDirection::Destroy => "dependent",
                    };
                    warn!("not attempting {entity}: {relation} {dep} failed");
                    ledger.record(entity, Outcome::failed(format!("{relation} {dep} failed")))?;
                    pending.remove(i);
                }
                Readiness::Ready => {
                    let entity = step.entity_ref();
                    debug!("dispatching {entity}");
                    let handle = in_flight.spawn(execute_step(
                        self.remote.clone(),
                        step.spec.clone(),
                        direction,
                        self.settings,
                        Arc::clone(ledger),
                    ));
                    running.insert(handle.id(), entity);
                    pending.remove(i);
                }
            }
        }
        Ok(())
    }

    /// List every kind (dependents first) and deal with entities the plan does
    /// not declare.
    ///
    /// A pruned orphan is only deleted once nothing left on the remote holds a
    /// hard reference to it. Orphans of a kind whose dependents could not be
    /// listed are reported but never pruned.
    async fn sweep_orphans(
        &self,
        plan: &ProvisionPlan,
        cancel: &CancellationToken,
        ledger: &OutcomeLedger,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<EntityRef>, ExecutorError> {
        let declared: HashMap<EntityRef, &EntitySpec> = plan
            .steps
            .iter()
            .map(|step| (step.entity_ref(), &step.spec))
            .collect();
        let limit = self.settings.call_timeout();
        let mut orphans = Vec::new();
        let mut seen: HashSet<EntityRef> = HashSet::new();
        let mut unlisted: HashSet<EntityKind> = HashSet::new();
        // what stays on the remote once the sweep is over
        let mut retained: Vec<EntitySpec> = Vec::new();

        for kind in EntityKind::destroy_order() {
            if cancel.is_cancelled() {
                warnings.push(format!("orphan sweep stopped at {kind}: run was cancelled"));
                break;
            }
            let listed = match timed(limit, "list", self.remote.list(kind)).await {
                Ok(listed) => listed,
                Err(err) => {
                    warn!("could not list {kind} entities: {err}");
                    warnings.push(format!("could not list {kind} entities: {err}"));
                    unlisted.insert(kind);
                    continue;
                }
            };
            let unknown_dependents = kind
                .hard_dependent_kinds()
                .iter()
                .find(|k| unlisted.contains(*k))
                .copied();
            let mut held_back = 0;

            for spec in listed {
                let entity = spec.entity_ref();
                if !seen.insert(entity.clone()) {
                    debug!("{entity} listed more than once");
                    continue;
                }
                if let Some(declared_spec) = declared.get(&entity) {
                    if kind == EntityKind::RefreshSchedule {
                        // covers the declared datasets only
                        continue;
                    }
                    // a dry run has not changed the remote yet
                    let current = match ledger.get(&entity) {
                        Some(Outcome::Planned { .. }) => (*declared_spec).clone(),
                        _ => spec,
                    };
                    retained.push(current);
                    continue;
                }

                let outcome = if !self.settings.prune {
                    Outcome::Orphaned
                } else if unknown_dependents.is_some() {
                    held_back += 1;
                    Outcome::Orphaned
                } else if let Some(dependent) = retained.iter().find(|r| r.references(&entity)) {
                    let dependent = dependent.entity_ref();
                    let why = if declared.contains_key(&dependent) {
                        "still references it"
                    } else if matches!(ledger.get(&dependent), Some(Outcome::Failed { .. })) {
                        "failed"
                    } else {
                        "is kept"
                    };
                    Outcome::failed(format!("dependent {dependent} {why}"))
                } else if self.settings.dry_run {
                    Outcome::Planned {
                        action: Action::Delete,
                    }
                } else {
                    match timed(limit, "delete", self.remote.delete(kind, spec.id())).await {
                        Ok(()) => Outcome::Deleted,
                        Err(err) => Outcome::failed(err.to_string()),
                    }
                };
                info!("{entity} is not declared: {outcome}");
                if matches!(outcome, Outcome::Orphaned | Outcome::Failed { .. }) {
                    retained.push(spec);
                }
                ledger.record(entity.clone(), outcome)?;
                orphans.push(entity);
            }

            if let Some(dependents) = unknown_dependents.filter(|_| held_back > 0) {
                warnings.push(format!(
                    "{held_back} {kind} orphan(s) not pruned: {dependents} entities could not be listed"
                ));
            }
        }
        Ok(orphans)
    }
}

fn readiness(step: &PlanStep, in_plan: &HashSet<EntityRef>, ledger: &OutcomeLedger) -> Readiness {
    let mut waiting = false;
    for req in step.requires.iter().filter(|r| in_plan.contains(&r.entity)) {
        match ledger.get(&req.entity) {
            None => waiting = true,
            Some(outcome) if req.edge == DependencyEdge::Hard && outcome.blocks_dependents() => {
                return Readiness::Blocked(req.entity.clone());
            }
            Some(_) => {}
        }
    }
    if waiting {
        Readiness::Waiting
    } else {
        Readiness::Ready
    }
}

fn settle(
    joined: Result<StepResult, JoinError>,
    running: &HashMap<Id, EntityRef>,
    ledger: &OutcomeLedger,
) -> Result<(), ExecutorError> {
    match joined {
        Ok(result) => result,
        Err(err) => {
            let entity = running.get(&err.id()).cloned().ok_or_else(|| {
                ExecutorError::unexpected(format!("untracked step task failed: {err}"))
            })?;
            warn!("step task for {entity} did not complete: {err}");
            ledger.record(entity, Outcome::failed(format!("step task aborted: {err}")))
        }
    }
}

async fn timed<T>(
    limit: Duration,
    call: &str,
    fut: impl Future<Output = Result<T, RemoteClientError>>,
) -> Result<T, RemoteClientError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RemoteClientError::timeout(format!(
            "{call} did not complete within {}ms",
            limit.as_millis()
        ))),
    }
}

async fn execute_step(
    remote: SharedRemote,
    spec: EntitySpec,
    direction: PlanDirection,
    settings: ReconcileSettings,
    ledger: Arc<OutcomeLedger>,
) -> StepResult {
    let entity = spec.entity_ref();
    let outcome = match direction {
        PlanDirection::Apply => apply_entity(remote.as_ref(), &spec, &settings).await,
        PlanDirection::Destroy => destroy_entity(remote.as_ref(), &spec, &settings).await,
    };
    match &outcome {
        Outcome::Failed { reason } => warn!("{entity} failed: {reason}"),
        other => info!("{entity} {other}"),
    }
    ledger.record(entity, outcome)
}

async fn apply_entity(
    remote: &dyn RemoteApi,
    spec: &EntitySpec,
    settings: &ReconcileSettings,
) -> Outcome {
    let limit = settings.call_timeout();
    let observed = match timed(limit, "get", remote.get(spec.kind(), spec.id())).await {
        Ok(observed) => observed,
        Err(err) => return Outcome::failed(err.to_string()),
    };

    let action = match observed {
        None => Action::Create,
        Some(current) if &current == spec => Action::Skip,
        Some(_) => Action::Update,
    };
    debug!("{} -> {action}", spec.entity_ref());

    if action == Action::Skip {
        return Outcome::Skipped;
    }
    if settings.dry_run {
        return Outcome::Planned { action };
    }

    let result = match action {
        Action::Create => timed(limit, "create", remote.create(spec))
            .await
            .map(|remote_id| Outcome::Created { remote_id }),
        _ => timed(limit, "update", remote.update(spec.id(), spec))
            .await
            .map(|()| Outcome::Updated),
    };
    result.unwrap_or_else(|err| Outcome::failed(err.to_string()))
}

async fn destroy_entity(
    remote: &dyn RemoteApi,
    spec: &EntitySpec,
    settings: &ReconcileSettings,
) -> Outcome {
    let limit = settings.call_timeout();
    match timed(limit, "get", remote.get(spec.kind(), spec.id())).await {
        Ok(None) => Outcome::Skipped,
        Ok(Some(_)) if settings.dry_run => Outcome::Planned {
            action: Action::Delete,
        },
        Ok(Some(_)) => match timed(limit, "delete", remote.delete(spec.kind(), spec.id())).await {
            Ok(()) => Outcome::Deleted,
            Err(err) => Outcome::failed(err.to_string()),
        },
        Err(err) => Outcome::failed(err.to_string()),
    }
}
