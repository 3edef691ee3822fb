#[macro_use]
mod prometheus_u64;
pub mod metrics;
pub mod stdout;

use crate::merge::differ::MergeStats;
use crate::sync::action::SyncCounts;
use std::time::Duration;

/// Outcome of one completed sync run.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SyncReport {
    pub counts: SyncCounts,
    pub merge: MergeStats,
    pub elapsed: Duration,
}
