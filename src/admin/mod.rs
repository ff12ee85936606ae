//! Admin/stats surface: structured introspection reports replacing the
//! original source's ad hoc `print()`/`self_check()` debug helpers (see
//! `SPEC_FULL.md` §10.5/§11.3).

mod stats;
mod verify;

pub use stats::{stats, StatsReport, SubmodelStats};
pub use verify::{verify, VerifyCounts, VerifyFinding, VerifyReport, VerifySeverity};
