// src/serve/mod.rs

//! Local preview of the generated site with live reload.
//!
//! - [`reload`] holds the connection registry (`LiveReload`) and the
//!   `ReloadNotifier` seam the executor talks to.
//! - [`server`] is a small HTTP/1.1 origin for the site directory plus a
//!   server-sent-events channel for reload messages.

pub mod reload;
pub mod server;

pub use reload::{LiveReload, ReloadMessage, ReloadNotifier};
pub use server::{PreviewHandle, PreviewServer, CLIENT_SCRIPT_PATH, EVENTS_PATH};
