// src/watch/mod.rs

//! File watching and change routing.
//!
//! This module is responsible for:
//! - Compiling the watch bindings (one per asset class plus templates).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning each filesystem event into `Rebuild` run requests.
//!
//! It does **not** know about task ordering; it only names the entry task
//! of the sequence a change should run.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{entries_for_event, process_event};
pub use patterns::{build_watch_bindings, glob_base, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
