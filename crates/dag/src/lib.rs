pub mod error;
pub mod types;

pub use crate::error::DagError;

use crate::types::{
    DagNode, DagResult, DependencyEdge, PlanDirection, PlanStep, ProvisionPlan, Requirement,
};
use common::types::{DashboardDefinition, EntityKind, EntityRef, EntitySpec, Identified};
use log::{debug, info};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;
use std::time::Instant;

/// Dependency graph of every entity in a dashboard definition.
///
/// Edges point from a dependency to its dependent (data source → dataset →
/// visual), so a topological walk yields a valid creation order. Edge weights
/// distinguish hard dependencies from ordering-only ones: filters are sequenced
/// after visuals but do not need them to succeed.
#[derive(Debug, Default)]
pub struct ProvisionDag {
    pub graph: DiGraph<DagNode, DependencyEdge>,
    pub ref_to_index: HashMap<EntityRef, NodeIndex>,
}

impl ProvisionDag {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            ref_to_index: HashMap::new(),
        }
    }

    pub fn build(definition: &DashboardDefinition) -> DagResult<Self> {
        let started = Instant::now();
        let mut dag = Self::new();

        // First pass - one node per entity
        for (declared_at, spec) in definition.entities().into_iter().enumerate() {
            dag.add_node(spec, declared_at)?;
        }

        // Second pass - edges
        for dataset in &definition.datasets {
            dag.add_dependency(
                &EntityRef::new(EntityKind::Dataset, &dataset.id),
                &EntityRef::new(EntityKind::DataSource, &dataset.data_source),
                DependencyEdge::Hard,
            )?;
        }
        for visual in &definition.visuals {
            dag.add_dependency(
                &EntityRef::new(EntityKind::Visual, &visual.id),
                &EntityRef::new(EntityKind::Dataset, &visual.dataset),
                DependencyEdge::Hard,
            )?;
        }
        for filter in &definition.filters {
            let filter_ref = EntityRef::new(EntityKind::Filter, &filter.name);
            let targets: Vec<&str> = if filter.applies_to.is_empty() {
                definition.visual_ids().collect()
            } else {
                filter.applies_to.iter().map(String::as_str).collect()
            };
            for visual in targets {
                dag.add_dependency(
                    &filter_ref,
                    &EntityRef::new(EntityKind::Visual, visual),
                    DependencyEdge::Ordering,
                )?;
            }
        }
        let schedule_ref = EntityRef::new(
            EntityKind::RefreshSchedule,
            definition.refresh_schedule.identifier(),
        );
        for dataset in &definition.datasets {
            dag.add_dependency(
                &schedule_ref,
                &EntityRef::new(EntityKind::Dataset, &dataset.id),
                DependencyEdge::Hard,
            )?;
        }

        dag.check_acyclic()?;

        info!(
            "ProvisionDag::build completed in {:.3}s ({} nodes, {} edges)",
            started.elapsed().as_secs_f64(),
            dag.graph.node_count(),
            dag.graph.edge_count()
        );
        Ok(dag)
    }

    pub fn add_node(&mut self, spec: EntitySpec, declared_at: usize) -> DagResult<NodeIndex> {
        let key = spec.entity_ref();
        if self.ref_to_index.contains_key(&key) {
            return Err(DagError::duplicate_node(&key));
        }
        let idx = self.graph.add_node(DagNode { spec, declared_at });
        self.ref_to_index.insert(key, idx);
        Ok(idx)
    }

    /// Record that `dependent` must not exist before `dependency`.
    pub fn add_dependency(
        &mut self,
        dependent: &EntityRef,
        dependency: &EntityRef,
        edge: DependencyEdge,
    ) -> DagResult<()> {
        let to = self
            .get_index(dependent)
            .ok_or_else(|| DagError::missing_dependency(dependency, dependent))?;
        let from = self
            .get_index(dependency)
            .ok_or_else(|| DagError::missing_dependency(dependent, dependency))?;
        self.graph.update_edge(from, to, edge);
        Ok(())
    }

    pub fn get(&self, entity: &EntityRef) -> Option<&DagNode> {
        self.get_index(entity).map(|idx| &self.graph[idx])
    }

    pub fn get_index(&self, entity: &EntityRef) -> Option<NodeIndex> {
        self.ref_to_index.get(entity).copied()
    }

    fn check_acyclic(&self) -> DagResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(DagError::cycle_detected(self.cycle_members()));
        }
        Ok(())
    }

    fn cycle_members(&self) -> Vec<EntityRef> {
        let scc = kosaraju_scc(&self.graph)
            .into_iter()
            .find(|c| c.len() > 1 || self.graph.contains_edge(c[0], c[0]))
            .unwrap_or_default();
        let mut members: Vec<&DagNode> = scc.into_iter().map(|idx| &self.graph[idx]).collect();
        members.sort_by_key(|n| n.declared_at);
        members.into_iter().map(DagNode::entity_ref).collect()
    }

    fn sort_key(&self, idx: NodeIndex) -> (u8, usize, usize) {
        let node = &self.graph[idx];
        (node.kind().rank(), node.declared_at, idx.index())
    }

    /// Kahn's algorithm, breaking ties by entity kind then declaration order
    /// so the same definition always yields the same plan.
    pub fn toposort(&self) -> DagResult<Vec<NodeIndex>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self.graph.edges_directed(idx, Direction::Incoming).count();
                (idx, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<((u8, usize, usize), NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse((self.sort_key(*idx), *idx)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, idx))) = ready.pop() {
            order.push(idx);
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target();
                if let Some(degree) = in_degree.get_mut(&target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((self.sort_key(target), target)));
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(DagError::cycle_detected(self.cycle_members()));
        }
        Ok(order)
    }

    fn requirements(&self, idx: NodeIndex, direction: Direction) -> Vec<Requirement> {
        let mut edges: Vec<(NodeIndex, DependencyEdge)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (other, *edge.weight())
            })
            .collect();
        edges.sort_by_key(|(other, _)| self.sort_key(*other));
        edges
            .into_iter()
            .map(|(other, edge)| Requirement {
                entity: self.graph[other].entity_ref(),
                edge,
            })
            .collect()
    }

    /// Creation order: every entity after the entities it depends on.
    pub fn apply_plan(&self) -> DagResult<ProvisionPlan> {
        let steps = self
            .toposort()?
            .into_iter()
            .map(|idx| PlanStep {
                spec: self.graph[idx].spec.clone(),
                requires: self.requirements(idx, Direction::Incoming),
            })
            .collect::<Vec<_>>();
        debug!("apply plan has {} step(s)", steps.len());
        Ok(ProvisionPlan {
            direction: PlanDirection::Apply,
            steps,
        })
    }

    /// Exact reverse of [`ProvisionDag::apply_plan`]; an entity waits for all
    /// of its dependents to be removed first.
    pub fn destroy_plan(&self) -> DagResult<ProvisionPlan> {
        let mut order = self.toposort()?;
        order.reverse();
        let steps = order
            .into_iter()
            .map(|idx| PlanStep {
                spec: self.graph[idx].spec.clone(),
                requires: self.requirements(idx, Direction::Outgoing),
            })
            .collect::<Vec<_>>();
        debug!("destroy plan has {} step(s)", steps.len());
        Ok(ProvisionPlan {
            direction: PlanDirection::Destroy,
            steps,
        })
    }

    /// Produce a DOT-format string of the graph. Ordering-only edges are dashed.
    pub fn to_dot_string(&self) -> String {
        use std::fmt::Write;

        let mut dot = String::new();
        let _ = writeln!(dot, "digraph {{");
        let _ = writeln!(dot, "    rankdir=LR;");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let _ = writeln!(dot, "    {} [label=\"{}\"];", idx.index(), node);
        }

        for edge in self.graph.edge_references() {
            let style = match edge.weight() {
                DependencyEdge::Hard => "",
                DependencyEdge::Ordering => " [style=dashed]",
            };
            let _ = writeln!(
                dot,
                "    {} -> {}{};",
                edge.source().index(),
                edge.target().index(),
                style
            );
        }
        let _ = writeln!(dot, "}}");

        dot
    }

    /// Write the dependency graph to the given path in DOT format.
    pub fn export_dot_to<P: AsRef<Path>>(&self, path: P) -> DagResult<()> {
        std::fs::write(path, self.to_dot_string())?;
        Ok(())
    }
}
