// src/serve/reload.rs

use std::fmt;

use tokio::sync::broadcast;
use tracing::debug;

use crate::transform::ProducedFile;

/// Receives reload and produced-files signals from the executor.
pub trait ReloadNotifier: Send + Sync {
    /// Ask every connected client to refresh the page.
    fn reload(&self);

    /// Tell clients which output files changed (stylesheets are swapped in
    /// place without a full reload).
    fn stream(&self, produced: &[ProducedFile]);
}

/// A message pushed to preview clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadMessage {
    Reload,
    /// Root-relative, forward-slash paths of files whose bytes changed.
    Stream(Vec<String>),
}

impl ReloadMessage {
    /// Server-sent-events encoding of this message.
    pub fn to_sse(&self) -> String {
        match self {
            ReloadMessage::Reload => "event: reload\ndata: reload\n\n".to_string(),
            ReloadMessage::Stream(paths) => {
                let mut out = String::from("event: stream\n");
                for path in paths {
                    out.push_str("data: ");
                    out.push_str(path);
                    out.push('\n');
                }
                out.push('\n');
                out
            }
        }
    }
}

/// Registry of connected preview clients.
///
/// Each open event stream holds one broadcast receiver; dropping the
/// connection drops the receiver. Sending with no receivers is a no-op.
pub struct LiveReload {
    tx: broadcast::Sender<ReloadMessage>,
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { tx }
    }

    /// Register a new client.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, msg: ReloadMessage) {
        match self.tx.send(msg) {
            Ok(clients) => debug!(clients, "live reload message sent"),
            Err(_) => debug!("no preview clients connected; nothing to notify"),
        }
    }
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LiveReload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveReload")
            .field("clients", &self.client_count())
            .finish()
    }
}

impl ReloadNotifier for LiveReload {
    fn reload(&self) {
        self.send(ReloadMessage::Reload);
    }

    fn stream(&self, produced: &[ProducedFile]) {
        let changed: Vec<String> = produced
            .iter()
            .filter(|f| f.written)
            .map(|f| f.path.to_string_lossy().replace('\\', "/"))
            .collect();
        if !changed.is_empty() {
            self.send(ReloadMessage::Stream(changed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_without_clients_is_silent() {
        let hub = LiveReload::new();
        assert_eq!(hub.client_count(), 0);
        hub.reload();
    }

    #[tokio::test]
    async fn every_client_receives_reload() {
        let hub = LiveReload::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.client_count(), 2);

        hub.reload();
        assert_eq!(a.recv().await.unwrap(), ReloadMessage::Reload);
        assert_eq!(b.recv().await.unwrap(), ReloadMessage::Reload);

        drop(a);
        assert_eq!(hub.client_count(), 1);
    }

    #[test]
    fn sse_encoding_lists_one_path_per_data_line() {
        let msg = ReloadMessage::Stream(vec!["assets/css/a.css".into(), "assets/css/b.css".into()]);
        assert_eq!(
            msg.to_sse(),
            "event: stream\ndata: assets/css/a.css\ndata: assets/css/b.css\n\n"
        );
        assert!(ReloadMessage::Reload.to_sse().starts_with("event: reload\n"));
    }
}
