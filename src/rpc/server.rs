//! Server-side handlers forwarding RPC requests into the engine (component
//! C8, server half).
//!
//! One task per accepted connection, looping read-request / dispatch /
//! write-reply until the client closes the stream — the same shape as the
//! teacher's dashboard server spawning one task per request, just over a
//! raw length-free framing instead of HTTP, since every request here is
//! fixed-width once the opcode is known. The RDMA transport and coroutine
//! scheduler this stands in for are explicitly out of scope (spec §1); this
//! module only has to honor the same request/reply contract they would
//! carry over.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::engine::RolexEngine;
use crate::error::RolexError;
use crate::rpc::protocol::{Reply, Request};

/// Runs the accept loop until the socket errors or the process is signaled
/// to stop; each connection is handled on its own spawned task so one slow
/// or stuck client never blocks another.
pub async fn serve<const N: usize>(
    engine: Arc<RolexEngine<N>>,
    addr: SocketAddr,
) -> std::io::Result<()>
where
    RolexEngine<N>: Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "rolex rpc server listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            tracing::debug!(%peer, "rpc connection accepted");
            if let Err(err) = handle_connection(stream, &engine).await {
                tracing::warn!(%peer, error = %err, "rpc connection ended with an error");
            } else {
                tracing::debug!(%peer, "rpc connection closed");
            }
        });
    }
}

async fn handle_connection<const N: usize>(
    mut stream: TcpStream,
    engine: &RolexEngine<N>,
) -> std::io::Result<()> {
    while let Some(request) = Request::read_from(&mut stream).await? {
        dispatch(&mut stream, engine, request).await?;
    }
    Ok(())
}

async fn dispatch<const N: usize>(
    stream: &mut TcpStream,
    engine: &RolexEngine<N>,
    request: Request,
) -> std::io::Result<()> {
    match request {
        Request::Get { key } => {
            tracing::debug!(key, "GET");
            let reply = match engine.search(key) {
                Some(v) => Reply::present(v),
                None => Reply::absent(),
            };
            reply.write_to(stream).await
        }
        Request::Put { key, val } => {
            tracing::debug!(key, val, "PUT");
            match engine.insert(key, val) {
                Ok(()) => Reply::present(val).write_to(stream).await,
                Err(RolexError::Duplicate { .. }) => {
                    // Spec: PUT's status is always 1 ("succeeded"); a
                    // duplicate key is resolved by overwriting in place.
                    engine.update(key, val);
                    Reply::present(val).write_to(stream).await
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "PUT requires retraining");
                    Reply::absent().write_to(stream).await
                }
            }
        }
        Request::Update { key, val } => {
            tracing::debug!(key, val, "UPDATE");
            let reply = if engine.update(key, val) {
                Reply::present(val)
            } else {
                Reply::absent()
            };
            reply.write_to(stream).await
        }
        Request::Delete { key } => {
            tracing::debug!(key, "DELETE");
            let reply = if engine.remove(key) {
                Reply { status: 1, val: 0 }
            } else {
                Reply::absent()
            };
            reply.write_to(stream).await
        }
        Request::Scan { key, n } => {
            tracing::debug!(key, n, "SCAN");
            let values = engine.scan(key, n as usize);
            let reply = if values.is_empty() {
                Reply::absent()
            } else {
                Reply { status: 1, val: 0 }
            };
            reply.write_to(stream).await?;
            Reply::write_scan_values(stream, &values).await
        }
    }
}
