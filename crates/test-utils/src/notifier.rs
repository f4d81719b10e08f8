use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use sitedag::serve::ReloadNotifier;
use sitedag::transform::ProducedFile;

/// A `ReloadNotifier` that only counts what it was asked to do.
#[derive(Debug, Default)]
pub struct CountingNotifier {
    reloads: AtomicUsize,
    streamed: Mutex<Vec<ProducedFile>>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    /// Every produced file passed to `stream`, in call order.
    pub fn streamed(&self) -> Vec<ProducedFile> {
        self.streamed.lock().unwrap().clone()
    }
}

impl ReloadNotifier for CountingNotifier {
    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn stream(&self, produced: &[ProducedFile]) {
        self.streamed.lock().unwrap().extend_from_slice(produced);
    }
}
