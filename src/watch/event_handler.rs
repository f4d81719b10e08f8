// src/watch/event_handler.rs

//! Turns filesystem events into run requests.

use std::collections::BTreeSet;
use std::path::Path;

use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dag::RunRequest;
use crate::engine::{RuntimeEvent, TriggerReason};
use crate::types::TaskId;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// Entry tasks of the bindings matched by one notify event, in binding order.
///
/// Each binding counts at most once per event, however many of the event's
/// paths it matches. Access events never match: the generator reading
/// templates must not retrigger itself.
pub fn entries_for_event(root: &Path, event: &Event, bindings: &[WatchBinding]) -> Vec<TaskId> {
    if matches!(event.kind, EventKind::Access(_)) {
        return Vec::new();
    }

    let mut matched: BTreeSet<usize> = BTreeSet::new();
    for path in &event.paths {
        let Some(rel) = relative_str(root, path) else {
            warn!("could not relativize path {:?} against root {:?}", path, root);
            continue;
        };
        for (idx, binding) in bindings.iter().enumerate() {
            if binding.matches(&rel) && matched.insert(idx) {
                debug!(binding = %binding.name(), path = %rel, "watch match");
            }
        }
    }

    matched.into_iter().map(|idx| bindings[idx].entry()).collect()
}

/// Request one `Rebuild` run per binding matched by `event`.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_event(
    root: &Path,
    event: &Event,
    bindings: &[WatchBinding],
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    for entry in entries_for_event(root, event, bindings) {
        let request = RuntimeEvent::RunRequested {
            request: RunRequest::Rebuild(entry),
            reason: TriggerReason::FileWatch,
        };
        if let Err(err) = runtime_tx.send(request).await {
            warn!("failed to send RuntimeEvent::RunRequested: {err}");
            return false;
        }
    }
    true
}
