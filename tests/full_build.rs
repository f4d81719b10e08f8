// tests/full_build.rs

use std::time::Duration;

use tokio::sync::mpsc;

use sitedag::dag::{RunOutcome, RunRequest, Scheduler};
use sitedag::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use sitedag::exit_code_for;
use sitedag::types::TaskId;
use sitedag_test_utils::fake_executor::FakeExecutor;
use sitedag_test_utils::{init_tracing, with_timeout};

fn one_shot_core() -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::default(),
        RuntimeOptions {
            exit_when_idle: true,
        },
    )
}

async fn request(tx: &mpsc::Sender<RuntimeEvent>, request: RunRequest) {
    tx.send(RuntimeEvent::RunRequested {
        request,
        reason: TriggerReason::Manual,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn generator_starts_only_after_all_transforms_finished() {
    init_tracing();

    let (tx, rx) = mpsc::channel(64);
    let executor = FakeExecutor::new(tx.clone())
        .with_delay(TaskId::Styles, Duration::from_millis(20))
        .with_delay(TaskId::Images, Duration::from_millis(40));
    let records = executor.records();

    request(&tx, RunRequest::FullBuild).await;
    let reports = with_timeout(Runtime::new(one_shot_core(), rx, executor).run())
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, RunOutcome::Succeeded);
    assert_eq!(exit_code_for(&reports), 0);

    let records = records.lock().unwrap().clone();
    let find = |task: TaskId| records.iter().find(|r| r.task == task).cloned().unwrap();
    let generate = find(TaskId::Generate);

    for transform in TaskId::TRANSFORMS {
        assert!(
            find(transform).finished <= generate.started,
            "generator started before {transform} finished"
        );
    }
    assert_eq!(records.iter().filter(|r| r.task == TaskId::Generate).count(), 1);
    assert!(records.iter().all(|r| r.task != TaskId::Reload));

    // The transforms overlapped instead of running one after another.
    assert!(find(TaskId::Images).started < find(TaskId::Styles).finished);
}

#[tokio::test]
async fn transform_failure_fails_build_without_generator() {
    init_tracing();

    let (tx, rx) = mpsc::channel(64);
    let executor = FakeExecutor::new(tx.clone())
        .failing(TaskId::Scripts, 3)
        .with_delay(TaskId::Images, Duration::from_millis(30));
    let records = executor.records();

    request(&tx, RunRequest::FullBuild).await;
    let reports = with_timeout(Runtime::new(one_shot_core(), rx, executor).run())
        .await
        .unwrap();

    assert_eq!(
        reports[0].outcome,
        RunOutcome::Failed {
            task: TaskId::Scripts,
            code: 3
        }
    );
    assert_eq!(exit_code_for(&reports), 3);

    let records = records.lock().unwrap();
    assert!(records.iter().all(|r| r.task != TaskId::Generate));
    // Siblings already running were allowed to finish.
    assert!(records.iter().any(|r| r.task == TaskId::Images));
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn invalid_exit_codes_map_to_one() {
    init_tracing();

    let (tx, rx) = mpsc::channel(64);
    let executor = FakeExecutor::new(tx.clone()).failing(TaskId::Generate, -1);

    request(&tx, RunRequest::Task(TaskId::Generate)).await;
    let reports = with_timeout(Runtime::new(one_shot_core(), rx, executor).run())
        .await
        .unwrap();

    assert_eq!(exit_code_for(&reports), 1);
}
