use crate::errors::Result;
use crate::merge::source::{OrderedSource, Streaming};

/// Adapter over an infallible iterator that already yields rows in key order.
pub struct IterSource<I> {
    iter: I,
    streaming: Streaming,
}

impl<I> IterSource<I>
where
    I: Iterator,
{
    /// Wraps a lazily producing iterator.
    pub fn new(iter: I) -> IterSource<I> {
        IterSource {
            iter,
            streaming: Streaming::Streaming,
        }
    }
}

impl<T> IterSource<std::vec::IntoIter<T>> {
    /// Wraps rows that were materialized up front. Declared as `Buffered`.
    pub fn buffered(rows: Vec<T>) -> IterSource<std::vec::IntoIter<T>> {
        IterSource {
            iter: rows.into_iter(),
            streaming: Streaming::Buffered,
        }
    }
}

impl<I> OrderedSource for IterSource<I>
where
    I: Iterator,
{
    type Row = I::Item;

    fn next_row(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }

    fn streaming(&self) -> Streaming {
        self.streaming
    }
}

/// Adapter over an iterator whose pulls can fail, such as a cursor over a remote store.
pub struct FallibleSource<I> {
    iter: I,
}

impl<I> FallibleSource<I> {
    pub fn new(iter: I) -> FallibleSource<I> {
        FallibleSource { iter }
    }
}

impl<I, T> OrderedSource for FallibleSource<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Row = T;

    fn next_row(&mut self) -> Result<Option<T>> {
        self.iter.next().transpose()
    }

    fn streaming(&self) -> Streaming {
        Streaming::Streaming
    }
}
