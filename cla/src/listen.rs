use super::*;
use bpwire_async::{BoundedTaskPool, CancellationToken, TaskPool};
use core::num::NonZeroUsize;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, debug, info, info_span, warn};

/// A bound TCP listener serving each accepted connection in its own task.
///
/// Dropping the listener does not stop it; call [`Listener::shutdown`], which
/// stops accepting, cancels every session and waits for them to finish
/// their termination sequence.
pub struct Listener {
    tasks: TaskPool,
    sessions: Arc<BoundedTaskPool>,
    local_addr: SocketAddr,
}

impl core::fmt::Debug for Listener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.local_addr)
            .field("free_slots", &self.sessions.available())
            .finish()
    }
}

impl Listener {
    /// Connections arriving while `max_sessions` are running are sent
    /// `refusal` and closed.
    pub(crate) async fn bind<F, Fut>(
        address: SocketAddr,
        max_sessions: NonZeroUsize,
        refusal: &'static [u8],
        session: F,
    ) -> std::io::Result<Self>
    where
        F: Fn(TcpStream, SocketAddr, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(address)
            .await
            .inspect_err(|e| warn!("Failed to bind TCP listener on {address}: {e}"))?;
        let local_addr = listener.local_addr()?;
        info!("TCP server listening on {local_addr}");

        let tasks = TaskPool::new();
        let sessions = Arc::new(BoundedTaskPool::new(max_sessions));

        let cancel_token = tasks.cancel_token().clone();
        let pool = sessions.clone();
        let refusals = tasks.clone();
        bpwire_async::spawn!(tasks, "accept_loop", (%local_addr), async move {
            loop {
                tokio::select! {
                    r = listener.accept() => match r {
                        Ok((stream, remote_addr)) => {
                            debug!("Accepted connection from {remote_addr}");
                            if pool.available() == 0 {
                                info!("Refusing connection from {remote_addr}: session limit reached");
                                bpwire_async::spawn!(refusals, "refuse", (%remote_addr), async move {
                                    refuse(stream, refusal).await
                                });
                                continue;
                            }
                            let task = session(stream, remote_addr, pool.child_token())
                                .instrument(info_span!(parent: None, "session", %remote_addr));
                            if pool.try_spawn(task).is_err() {
                                warn!("Dropped connection from {remote_addr}: session pool closed");
                            }
                        }
                        Err(e) => warn!("Failed to accept connection: {e}"),
                    },
                    _ = cancel_token.cancelled() => break,
                }
            }
            debug!("Listener on {local_addr} stopped accepting");
        });

        Ok(Self {
            tasks,
            sessions,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn shutdown(&self) {
        self.tasks.shutdown().await;
        self.sessions.shutdown().await;
    }
}

async fn refuse(mut stream: TcpStream, refusal: &[u8]) {
    let r = async {
        stream.write_all(refusal).await?;
        stream.shutdown().await
    };
    if let Err(e) = r.await {
        debug!("Failed to close refused connection: {e}");
    }
}
