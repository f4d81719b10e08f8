// tests/scheduler_properties.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use sitedag::dag::{RunId, RunReport, RunRequest, ScheduledTask, Scheduler, SchedulerStep, TaskGraph};
use sitedag::engine::TaskOutcome;
use sitedag::types::TaskId;

fn request_strategy() -> impl Strategy<Value = RunRequest> {
    prop_oneof![
        Just(RunRequest::FullBuild),
        (0..TaskId::ALL.len()).prop_map(|i| RunRequest::Task(TaskId::ALL[i])),
        (0..TaskId::ALL.len()).prop_map(|i| RunRequest::Rebuild(TaskId::ALL[i])),
    ]
}

struct Sim {
    graph: TaskGraph,
    plans: HashMap<RunId, BTreeSet<TaskId>>,
    executing: Vec<ScheduledTask>,
    dispatched: HashSet<(RunId, TaskId)>,
    succeeded: HashSet<(RunId, TaskId)>,
    reports: Vec<RunReport>,
}

impl Sim {
    fn absorb(&mut self, step: SchedulerStep) -> Result<(), TestCaseError> {
        for task in step.newly_scheduled {
            prop_assert!(
                self.dispatched.insert((task.run_id, task.task)),
                "{} dispatched twice in run {}",
                task.task,
                task.run_id
            );
            let plan = &self.plans[&task.run_id];
            for dep in self.graph.dependencies_of(task.task) {
                if plan.contains(&dep) {
                    prop_assert!(
                        self.succeeded.contains(&(task.run_id, dep)),
                        "{} started before {} succeeded",
                        task.task,
                        dep
                    );
                }
            }
            self.executing.push(task);
        }
        if let Some(report) = step.finished {
            self.reports.push(report);
        }
        Ok(())
    }
}

proptest! {
    #[test]
    fn runs_terminate_in_dependency_order(
        requests in proptest::collection::vec(request_strategy(), 1..5),
        failing in proptest::collection::hash_set(0..TaskId::ALL.len(), 0..3),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
    ) {
        let failing: HashSet<TaskId> = failing.into_iter().map(|i| TaskId::ALL[i]).collect();
        let graph = TaskGraph::site();
        let mut scheduler = Scheduler::new(graph.clone());
        let mut sim = Sim {
            graph,
            plans: HashMap::new(),
            executing: Vec::new(),
            dispatched: HashSet::new(),
            succeeded: HashSet::new(),
            reports: Vec::new(),
        };

        for request in &requests {
            let step = scheduler.start_run(*request);
            sim.plans.insert(step.run_id, sim.graph.plan(*request));
            sim.absorb(step)?;
        }

        let mut picks = picks.into_iter();
        let mut steps = 0;
        while !sim.executing.is_empty() {
            steps += 1;
            prop_assert!(steps < 1000, "simulation did not terminate");

            let idx = picks.next().unwrap_or(0) % sim.executing.len();
            let task = sim.executing.swap_remove(idx);
            let outcome = if failing.contains(&task.task) {
                TaskOutcome::Failed(2)
            } else {
                sim.succeeded.insert((task.run_id, task.task));
                TaskOutcome::Success
            };
            let step = scheduler.handle_completion(task.run_id, task.task, outcome);
            sim.absorb(step)?;
        }

        prop_assert!(scheduler.is_idle());
        prop_assert_eq!(sim.reports.len(), requests.len());

        for report in &sim.reports {
            let plan = &sim.plans[&report.run_id];
            let expect_success = plan.iter().all(|t| !failing.contains(t));
            prop_assert_eq!(report.outcome.is_success(), expect_success);

            if plan.contains(&TaskId::Reload) {
                let reloaded = sim.succeeded.contains(&(report.run_id, TaskId::Reload));
                prop_assert_eq!(reloaded, expect_success);
            }
        }
    }
}
