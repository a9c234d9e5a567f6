use std::net::SocketAddr;

use blobd_store::BlobStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// blobd HTTP server.
pub struct BlobServer {
    config: ServerConfig,
}

impl BlobServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the store, bind the listener, and spawn the serve loop.
    ///
    /// Returns only once the store is reconciled and the socket is bound,
    /// so a bad root or a taken port surfaces here rather than in the
    /// background task.
    pub async fn start(self) -> ServerResult<RunningServer> {
        let store = BlobStore::open(self.config.store.clone()).await?;

        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let app = build_router(store.clone());
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
        });

        info!(
            addr = %local_addr,
            root = %store.root().display(),
            objects = store.len(),
            "blobd server listening"
        );
        Ok(RunningServer {
            local_addr,
            store,
            shutdown,
            task,
        })
    }

    /// Start serving and block until the serve loop exits.
    pub async fn serve(self) -> ServerResult<()> {
        self.start().await?.wait().await
    }
}

/// Handle on a started server.
pub struct RunningServer {
    local_addr: SocketAddr,
    store: BlobStore,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Token that stops the serve loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop accepting connections, let in-flight requests finish, and wait
    /// for the serve loop to exit.
    pub async fn shutdown(self) -> ServerResult<()> {
        info!(addr = %self.local_addr, "shutting down blobd server");
        self.shutdown.cancel();
        self.wait().await
    }

    /// Wait for the serve loop to exit without requesting it.
    pub async fn wait(self) -> ServerResult<()> {
        match self.task.await {
            Ok(result) => result.map_err(ServerError::Io),
            Err(e) => Err(ServerError::Internal(format!("serve task failed: {e}"))),
        }
    }
}
