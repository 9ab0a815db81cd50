// src/server/mod.rs

//! Local preview server with live reload.
//!
//! - [`session`] holds the connected client channels and implements
//!   [`LiveReload`].
//! - [`routes`] is the axum router: static output files, the injected
//!   client script and the Server-Sent Events push channel.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::model::ServerSection;
use crate::errors::{Result, SitebuildError};

pub mod routes;
pub mod session;

pub use routes::{inject_client, router};
pub use session::{ClientMessage, PreviewSession};

/// Capability handed to tasks that must tell preview clients about new
/// output. Implementations must be callable from any thread.
pub trait LiveReload: Send + Sync {
    /// Output files that can be swapped without a full refresh.
    fn notify(&self, changed: &[PathBuf]);

    /// Force every client to refresh.
    fn reload(&self);

    /// A rebuild failed.
    fn build_error(&self, _task: &str, _message: &str) {}
}

/// Used by release builds, where nobody is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLiveReload;

impl LiveReload for NoopLiveReload {
    fn notify(&self, _changed: &[PathBuf]) {}
    fn reload(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub cors: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors: true,
        }
    }
}

impl From<&ServerSection> for ServerOptions {
    fn from(section: &ServerSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            cors: section.cors,
        }
    }
}

/// A running server: its bound address and the way to stop it.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// The preview server. Owns the single [`PreviewSession`].
#[derive(Debug)]
pub struct PreviewServer {
    root: PathBuf,
    options: ServerOptions,
    session: Arc<PreviewSession>,
    handle: Mutex<Option<ServerHandle>>,
}

impl PreviewServer {
    pub fn new(root: impl Into<PathBuf>, options: ServerOptions) -> Self {
        let root = root.into();
        Self {
            session: Arc::new(PreviewSession::new(root.clone())),
            root,
            options,
            handle: Mutex::new(None),
        }
    }

    /// The notify/reload capability, for tasks to capture.
    pub fn live_reload(&self) -> Arc<dyn LiveReload> {
        self.session.clone()
    }

    pub fn session(&self) -> &Arc<PreviewSession> {
        &self.session
    }

    /// Bind and start serving the output tree. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr> {
        let bind = format!("{}:{}", self.options.host, self.options.port);
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .map_err(|e| SitebuildError::Server(format!("binding {bind}: {e}")))?;
        let addr = listener.local_addr()?;

        let app = router(Arc::clone(&self.session), self.root.clone(), self.options.cors);
        let (shutdown, rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
            if let Err(err) = served {
                warn!(error = %err, "preview server terminated with error");
            }
        });

        info!("preview server listening on http://{addr}");

        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ServerHandle {
                addr,
                shutdown,
                join,
            });
        if previous.is_some() {
            warn!("preview server started twice; previous instance detached");
        }

        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ServerHandle::local_addr)
    }

    /// Stop serving. Open event streams are closed first so graceful
    /// shutdown does not wait on them.
    pub async fn shutdown(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };

        self.session.disconnect_all();
        let _ = handle.shutdown.send(());
        if let Err(err) = handle.join.await {
            warn!(error = %err, "preview server task failed to join");
        }
        info!("preview server stopped");
    }
}

impl LiveReload for PreviewServer {
    fn notify(&self, changed: &[PathBuf]) {
        self.session.notify(changed);
    }

    fn reload(&self) {
        self.session.reload();
    }

    fn build_error(&self, task: &str, message: &str) {
        self.session.build_error(task, message);
    }
}
