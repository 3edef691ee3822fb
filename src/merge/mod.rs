//! Streaming sorted-merge of two key-ordered sources into a full outer join.
pub mod differ;
pub mod source;

pub use differ::{diff_iters, DuplicateKeys, JoinOutcome, MergeStats, SortedMergeDiffer};
pub use source::{OrderedSource, Side, Streaming};
