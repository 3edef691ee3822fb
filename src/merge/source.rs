use crate::errors::Result;
use serde::Serialize;
use std::fmt;

/// Which of the two merged inputs a row, key or failure belongs to.
///
/// `Left` is the source feed, `Right` the destination store.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left (source)"),
            Side::Right => write!(f, "right (destination)"),
        }
    }
}

/// How an adapter delivers its rows, as declared by the adapter itself.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Streaming {
    /// Rows are produced one at a time from the underlying medium.
    Streaming,
    /// Rows are fetched in fixed-size pages; memory is bounded by the page size.
    Batched { batch_size: usize },
    /// The full result set is held in memory before the first row is yielded.
    Buffered,
}

impl Streaming {
    /// Whether the adapter keeps memory independent of the input size.
    pub fn is_constant_memory(self) -> bool {
        match self {
            Streaming::Streaming | Streaming::Batched { .. } => true,
            Streaming::Buffered => false,
        }
    }
}

impl fmt::Display for Streaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Streaming::Streaming => write!(f, "streaming"),
            Streaming::Batched { batch_size } => write!(f, "batched ({} rows)", batch_size),
            Streaming::Buffered => write!(f, "buffered"),
        }
    }
}

/// Single-pass cursor over rows arriving in non-decreasing key order.
///
/// `Ok(None)` marks the end of the sequence and must be distinct from a failed pull.
/// Ordering is the adapter's promise; the differ only verifies it.
pub trait OrderedSource {
    type Row;

    /// Pulls the next row. May block on I/O.
    fn next_row(&mut self) -> Result<Option<Self::Row>>;

    /// The memory behaviour of this adapter.
    fn streaming(&self) -> Streaming;
}

impl<S> OrderedSource for Box<S>
where
    S: OrderedSource + ?Sized,
{
    type Row = S::Row;

    fn next_row(&mut self) -> Result<Option<Self::Row>> {
        self.as_mut().next_row()
    }

    fn streaming(&self) -> Streaming {
        self.as_ref().streaming()
    }
}

impl<S> OrderedSource for &mut S
where
    S: OrderedSource + ?Sized,
{
    type Row = S::Row;

    fn next_row(&mut self) -> Result<Option<Self::Row>> {
        (**self).next_row()
    }

    fn streaming(&self) -> Streaming {
        (**self).streaming()
    }
}
