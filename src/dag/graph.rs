// src/dag/graph.rs

use std::collections::BTreeSet;
use std::fmt;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SiteError};
use crate::types::TaskId;

/// What a run was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunRequest {
    /// All four transforms in parallel, then one generator invocation.
    FullBuild,
    /// A single task on its own (CLI entry points).
    Task(TaskId),
    /// The entry task plus everything downstream of it, ending in a reload.
    /// This is what a watch binding triggers.
    Rebuild(TaskId),
}

impl fmt::Display for RunRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunRequest::FullBuild => write!(f, "full build"),
            RunRequest::Task(task) => write!(f, "{task}"),
            RunRequest::Rebuild(task) => write!(f, "rebuild from {task}"),
        }
    }
}

/// The static task graph.
///
/// Edge direction: dependency -> dependent, so for the site graph
/// `styles -> generate -> reload`. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraphMap<TaskId, ()>,
}

impl TaskGraph {
    /// The fixed site pipeline:
    ///
    /// ```text
    /// styles  ─┐
    /// fonts   ─┤
    /// scripts ─┼─> generate ─> reload
    /// images  ─┘
    /// ```
    pub fn site() -> Self {
        let mut graph = DiGraphMap::new();
        for task in TaskId::ALL {
            graph.add_node(task);
        }
        for transform in TaskId::TRANSFORMS {
            graph.add_edge(transform, TaskId::Generate, ());
        }
        graph.add_edge(TaskId::Generate, TaskId::Reload, ());
        Self { graph }
    }

    /// Immediate dependencies of a task, sorted.
    pub fn dependencies_of(&self, task: TaskId) -> Vec<TaskId> {
        let mut deps: Vec<TaskId> = self
            .graph
            .neighbors_directed(task, Direction::Incoming)
            .collect();
        deps.sort();
        deps
    }

    /// Immediate dependents of a task, sorted.
    pub fn dependents_of(&self, task: TaskId) -> Vec<TaskId> {
        let mut dependents: Vec<TaskId> = self
            .graph
            .neighbors_directed(task, Direction::Outgoing)
            .collect();
        dependents.sort();
        dependents
    }

    /// Tasks in an order where every dependency precedes its dependents.
    ///
    /// Fails only if the graph has a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        toposort(&self.graph, None).map_err(|cycle| {
            SiteError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))
        })
    }

    /// The set of tasks participating in a run for `request`.
    pub fn plan(&self, request: RunRequest) -> BTreeSet<TaskId> {
        match request {
            RunRequest::FullBuild => {
                let mut members: BTreeSet<TaskId> = TaskId::TRANSFORMS.into_iter().collect();
                members.insert(TaskId::Generate);
                members
            }
            RunRequest::Task(task) => BTreeSet::from([task]),
            RunRequest::Rebuild(entry) => self.downstream_closure(entry),
        }
    }

    /// `entry` plus all transitive dependents.
    fn downstream_closure(&self, entry: TaskId) -> BTreeSet<TaskId> {
        let mut members = BTreeSet::new();
        let mut stack = vec![entry];

        while let Some(task) = stack.pop() {
            if members.insert(task) {
                stack.extend(self.dependents_of(task));
            }
        }

        members
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::site()
    }
}
