//! Tracing setup shared by the CLI binary and integration tests.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Installs a global `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; only the first call takes effect.
pub fn init_tracing() {
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
