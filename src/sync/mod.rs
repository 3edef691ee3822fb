//! Classification of merge outcomes into insert, update, delete and unchanged.
pub mod action;
pub mod compare;
pub mod driver;

pub use action::{ActionSink, Classification, SyncAction, SyncCounts};
pub use compare::{Comparison, EqComparator, RowComparator};
pub use driver::{StreamingPolicy, SyncMode, Synchronizer};
