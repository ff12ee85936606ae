//! Client-side stubs for compute-node callers (component C8, client half).
//!
//! These are the RPC-driven default path spec §4.7 mandates for
//! insert/update/remove on the compute side (as opposed to mutating the
//! memory node directly via one-sided RDMA + CAS, which the spec leaves
//! unspecified). Each call opens no new connection of its own — callers
//! hold one [`RolexClient`] per logical connection, matching the "one QP
//! per worker thread" shape the transport layer this stands in for uses.

use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::rpc::protocol::{Reply, Request};

/// A single-connection async client for the five KV RPCs.
pub struct RolexClient {
    stream: TcpStream,
}

impl RolexClient {
    pub async fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self { stream })
    }

    async fn send(&mut self, request: &Request) -> io::Result<()> {
        self.stream.write_all(&request.encode()).await
    }

    pub async fn get(&mut self, key: u64) -> io::Result<Option<u64>> {
        self.send(&Request::Get { key }).await?;
        let reply = Reply::read_from(&mut self.stream).await?;
        Ok(present(reply))
    }

    pub async fn put(&mut self, key: u64, val: u64) -> io::Result<()> {
        self.send(&Request::Put { key, val }).await?;
        let _ = Reply::read_from(&mut self.stream).await?;
        Ok(())
    }

    pub async fn update(&mut self, key: u64, val: u64) -> io::Result<bool> {
        self.send(&Request::Update { key, val }).await?;
        let reply = Reply::read_from(&mut self.stream).await?;
        Ok(reply.status == 1)
    }

    pub async fn delete(&mut self, key: u64) -> io::Result<bool> {
        self.send(&Request::Delete { key }).await?;
        let reply = Reply::read_from(&mut self.stream).await?;
        Ok(reply.status == 1)
    }

    pub async fn scan(&mut self, key: u64, n: u64) -> io::Result<Vec<u64>> {
        self.send(&Request::Scan { key, n }).await?;
        let _ = Reply::read_from(&mut self.stream).await?;
        Reply::read_scan_values(&mut self.stream).await
    }
}

fn present(reply: Reply) -> Option<u64> {
    if reply.status == 1 {
        Some(reply.val)
    } else {
        None
    }
}
