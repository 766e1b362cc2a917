use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::db::Store;
use crate::ipc::{self, Ctx, Request};

/// How long a worker waits on a silent peer before reclaiming the
/// connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection gateway: accepts TCP connections and runs one worker thread
/// per connection. Requests and responses are newline-delimited JSON, one
/// exchange per round trip; every accepted request gets exactly one
/// response, in order, or the connection is dropped.
pub struct Server {
    listener: TcpListener,
    store: Store,
    read_timeout: Duration,
}

impl Server {
    pub fn bind(addr: &str, store: Store) -> Result<Server> {
        let listener = TcpListener::bind(addr)?;
        Ok(Server {
            listener,
            store,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Server {
        self.read_timeout = timeout;
        self
    }

    /// The actually-bound address; useful when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Runs until the listener fails.
    pub fn run(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "listening");
        loop {
            let (stream, peer) = self.listener.accept()?;
            let store = self.store.clone();
            let timeout = self.read_timeout;
            thread::spawn(move || {
                if let Err(e) = handle_client(stream, peer, store, timeout) {
                    warn!(%peer, error = %e, "connection worker ended with error");
                }
            });
        }
    }
}

fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    store: Store,
    timeout: Duration,
) -> Result<()> {
    info!(%peer, "client connected");
    stream.set_read_timeout(Some(timeout))?;
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    // One database connection per worker: uncommitted work stays private,
    // committed writes are visible to every other worker.
    let mut ctx = Ctx::new(store.conn()?);

    for line in reader.lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                // Read timeout or peer reset; reclaim the worker.
                debug!(%peer, error = %e, "read ended");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<Request>(&line) {
            Ok(req) => {
                debug!(%peer, operation = %req.operation, "request");
                ipc::handle_request(&mut ctx, &req)
            }
            // Malformed payload: answer with a structured failure and keep
            // the connection usable for the next request.
            Err(e) => ipc::fail(format!("malformed request: {e}")),
        };

        let encoded = serde_json::to_string(&resp)
            .unwrap_or_else(|_| "{\"success\":false,\"message\":\"encode error\"}".to_string());
        if let Err(e) = writeln!(writer, "{encoded}") {
            error!(%peer, error = %e, "write failed");
            break;
        }
        writer.flush()?;
    }

    info!(%peer, "client disconnected");
    Ok(())
}
