//! Remote-memory KV RPC surface: server-side handlers and client-side stubs
//! for the five KV operations (component C8). See module docs on
//! [`server`] and [`client`] for what this crate does and does not take on
//! from the full disaggregated design (the RDMA transport, UD/RC session
//! management, and coroutine scheduler all stay out of scope per spec §1).

pub mod client;
pub mod protocol;
pub mod server;

pub use client::RolexClient;
pub use protocol::{Opcode, Reply, Request};
pub use server::serve;
