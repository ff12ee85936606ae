//! # Rolex — a disaggregated, learned ordered key-value index
//!
//! Rolex is a learned index over fixed-width 64-bit keys and values: a
//! two-level model hierarchy (a sorted upper index routing keys to
//! piecewise-linear submodels) predicts where a key lives in a shared leaf
//! arena, and a per-submodel leaf table absorbs inserts that fall outside
//! the model's learned error bound via an overflow ("synonym") chain.
//!
//! ## Quick start
//!
//! ```rust
//! use rolex::{RolexConfig, RolexEngine};
//!
//! let keys: Vec<u64> = (1..=8).map(|i| i * 10).collect();
//! let vals = keys.clone();
//! let config = RolexConfig {
//!     leaf_capacity: 64,
//!     ..RolexConfig::default()
//! };
//! let engine: RolexEngine<4> = RolexEngine::train(&keys, &vals, config);
//!
//! assert_eq!(engine.search(30), Some(30));
//! engine.insert(35, 350).unwrap();
//! assert_eq!(engine.search(35), Some(350));
//! ```
//!
//! ## Architecture
//!
//! - [`model::leaf`] — fixed-capacity sorted leaf (C1).
//! - [`model::arena`] — bump-allocated leaf pool shared across submodels (C2).
//! - [`model::leaf_table`] — per-submodel directory plus overflow chains (C3).
//! - [`model::submodel`] — one PLR segment plus its leaf table (C4).
//! - [`model::model_arena`] — upper index and serialized submodel array (C5).
//! - [`engine`] — training, dispatch, and the public KV surface (C6).
//! - [`cache`] — compute-node replica of the model hierarchy (C7).
//! - [`rpc`] — server-side handlers and client stubs (C8).
//!
//! This crate implements the learned index engine itself; the RDMA
//! transport, RPC request-id dispatch/coroutine scheduler, workload
//! loaders, and huge-page region allocation the full disaggregated design
//! also includes are out of scope (see the repository's `spec.md` §1) —
//! [`rpc`] implements the request/reply contract those layers would carry
//! over TCP instead.

pub mod admin;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod rpc;

pub use cache::LearnedCache;
pub use config::RolexConfig;
pub use engine::RolexEngine;
pub use error::{Result, RolexError};
