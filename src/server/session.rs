// src/server/session.rs

//! The set of connected preview clients.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::server::LiveReload;
use crate::watch::path_utils::relative_str;

/// One message pushed to a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Changed output files, as URL paths. Stylesheets are swapped in place.
    Inject { paths: Vec<String> },
    /// Full page refresh.
    Reload,
    /// A rebuild failed; shown in the browser console.
    BuildError { task: String, message: String },
}

impl ClientMessage {
    /// SSE event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::Inject { .. } => "inject",
            ClientMessage::Reload => "reload",
            ClientMessage::BuildError { .. } => "build-error",
        }
    }
}

type ClientTx = mpsc::UnboundedSender<ClientMessage>;

/// Connected client channels of the preview server.
///
/// Mutated only by connect/disconnect; read by `notify`/`reload`, which may
/// be called from any thread or runtime context.
#[derive(Debug)]
pub struct PreviewSession {
    root: PathBuf,
    next_id: AtomicU64,
    clients: Mutex<HashMap<u64, ClientTx>>,
}

/// Removes its client from the session when dropped.
#[derive(Debug)]
pub struct ClientGuard {
    id: u64,
    session: Arc<PreviewSession>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.session.disconnect(self.id);
    }
}

impl PreviewSession {
    /// `root` is the served output tree; absolute paths passed to `notify`
    /// are made relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_id: AtomicU64::new(1),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn connect(
        self: &Arc<Self>,
    ) -> (ClientGuard, mpsc::UnboundedReceiver<ClientMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let count = {
            let mut clients = self.lock();
            clients.insert(id, tx);
            clients.len()
        };
        info!(client = id, clients = count, "preview client connected");

        let guard = ClientGuard {
            id,
            session: Arc::clone(self),
        };
        (guard, rx)
    }

    fn disconnect(&self, id: u64) {
        let mut clients = self.lock();
        if clients.remove(&id).is_some() {
            debug!(client = id, clients = clients.len(), "preview client disconnected");
        }
    }

    /// Drop every client channel; their event streams end.
    pub fn disconnect_all(&self) {
        self.lock().clear();
    }

    pub fn client_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, ClientTx>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn broadcast(&self, message: ClientMessage) {
        let mut clients = self.lock();
        if clients.is_empty() {
            debug!(event = message.event_name(), "no preview clients connected");
            return;
        }
        clients.retain(|_, tx| tx.send(message.clone()).is_ok());
        debug!(event = message.event_name(), clients = clients.len(), "pushed to preview clients");
    }

    /// URL path (leading `/`) for an output file.
    ///
    /// Paths under the served root lose that prefix whether the root is
    /// absolute or relative. Anything else is taken as already relative.
    pub fn url_path(&self, path: &Path) -> String {
        let rel = relative_str(&self.root, path)
            .unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"));
        format!("/{}", rel.trim_start_matches('/'))
    }
}

impl LiveReload for PreviewSession {
    fn notify(&self, changed: &[PathBuf]) {
        if changed.is_empty() {
            return;
        }
        let paths = changed.iter().map(|p| self.url_path(p)).collect();
        self.broadcast(ClientMessage::Inject { paths });
    }

    fn reload(&self) {
        self.broadcast(ClientMessage::Reload);
    }

    fn build_error(&self, task: &str, message: &str) {
        self.broadcast(ClientMessage::BuildError {
            task: task.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_and_reload_without_clients_are_noops() {
        let session = PreviewSession::new("/site/build");
        session.notify(&[]);
        session.notify(&[PathBuf::from("/site/build/css/style.min.css")]);
        session.reload();
        assert_eq!(session.client_count(), 0);
    }

    #[test]
    fn clients_receive_messages_until_dropped() {
        let session = Arc::new(PreviewSession::new("/site/build"));
        let (guard, mut rx) = session.connect();
        assert_eq!(session.client_count(), 1);

        session.notify(&[PathBuf::from("/site/build/css/style.min.css")]);
        session.reload();
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientMessage::Inject {
                paths: vec!["/css/style.min.css".into()]
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ClientMessage::Reload);

        drop(guard);
        assert_eq!(session.client_count(), 0);
    }

    #[test]
    fn relative_root_is_stripped_from_notified_paths() {
        let session = Arc::new(PreviewSession::new("build"));
        let (_guard, mut rx) = session.connect();

        session.notify(&[
            PathBuf::from("build/css/style.min.css"),
            PathBuf::from("js/app.js"),
        ]);
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientMessage::Inject {
                paths: vec!["/css/style.min.css".into(), "/js/app.js".into()]
            }
        );
    }

    #[test]
    fn empty_notify_sends_nothing() {
        let session = Arc::new(PreviewSession::new("/out"));
        let (_guard, mut rx) = session.connect();
        session.notify(&[]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn messages_serialize_with_type_tag() {
        let json = serde_json::to_string(&ClientMessage::BuildError {
            task: "styles".into(),
            message: "bad".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"build-error","task":"styles","message":"bad"}"#);
    }
}
