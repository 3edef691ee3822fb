use crate::adapters::iter::IterSource;
use crate::errors::{ErrorKind, Result, ResultExt};
use crate::merge::source::{OrderedSource, Side, Streaming};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::mem;

/// One step of the full outer join. There is no "absent, absent" shape.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum JoinOutcome<L, R> {
    /// Key only present on the left; an insert candidate.
    LeftOnly(L),
    /// Key only present on the right; a delete candidate.
    RightOnly(R),
    /// Key present on both sides; an update candidate or a no-op.
    Matched(L, R),
}

impl<L, R> JoinOutcome<L, R> {
    /// Builds an outcome from two optional rows, `None` when both are absent.
    pub fn from_parts(left: Option<L>, right: Option<R>) -> Option<JoinOutcome<L, R>> {
        match (left, right) {
            (Some(l), Some(r)) => Some(JoinOutcome::Matched(l, r)),
            (Some(l), None) => Some(JoinOutcome::LeftOnly(l)),
            (None, Some(r)) => Some(JoinOutcome::RightOnly(r)),
            (None, None) => None,
        }
    }

    pub fn left(&self) -> Option<&L> {
        match self {
            JoinOutcome::LeftOnly(l) | JoinOutcome::Matched(l, _) => Some(l),
            JoinOutcome::RightOnly(_) => None,
        }
    }

    pub fn right(&self) -> Option<&R> {
        match self {
            JoinOutcome::RightOnly(r) | JoinOutcome::Matched(_, r) => Some(r),
            JoinOutcome::LeftOnly(_) => None,
        }
    }

    pub fn into_parts(self) -> (Option<L>, Option<R>) {
        match self {
            JoinOutcome::LeftOnly(l) => (Some(l), None),
            JoinOutcome::RightOnly(r) => (None, Some(r)),
            JoinOutcome::Matched(l, r) => (Some(l), Some(r)),
        }
    }
}

/// What to do when the same key is pulled twice in a row on one side.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DuplicateKeys {
    /// Fail the run with `DuplicateKey`.
    Reject,
    /// Keep merging. Every row is still emitted exactly once, and runs of an equal key
    /// on both sides pair off in arrival order.
    Allow,
}

impl Default for DuplicateKeys {
    fn default() -> Self {
        DuplicateKeys::Reject
    }
}

/// State counters used to observe the differ's memory shape.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct MergeStats {
    pub left_pulled: u64,
    pub right_pulled: u64,
    pub emitted: u64,
    /// Highest number of rows held at once across both cursors.
    pub peak_pending: usize,
}

enum CursorState<T, K> {
    /// Nothing pulled yet.
    Started,
    /// Holding the current row and its key.
    Active(T, K),
    /// The current row was handed out; the next pull is due.
    Consumed,
    Exhausted,
}

/// Cursor over one side. Holds at most one pending row plus the last key seen.
struct Cursor<S, F, K>
where
    S: OrderedSource,
{
    side: Side,
    source: S,
    key_fn: F,
    state: CursorState<S::Row, K>,
    last_key: Option<K>,
    pulled: u64,
}

impl<S, F, K> Cursor<S, F, K>
where
    S: OrderedSource,
    F: Fn(&S::Row) -> K,
    K: Ord + Debug,
{
    fn new(side: Side, source: S, key_fn: F) -> Self {
        Cursor {
            side,
            source,
            key_fn,
            state: CursorState::Started,
            last_key: None,
            pulled: 0,
        }
    }

    /// Pulls a row if the cursor has none pending and returns the current key.
    fn fill(&mut self, duplicates: DuplicateKeys) -> Result<Option<&K>> {
        if let CursorState::Started | CursorState::Consumed = self.state {
            let side = self.side;
            self.state = match self
                .source
                .next_row()
                .chain_err(|| ErrorKind::AdapterFailure(side))?
            {
                Some(row) => {
                    self.pulled += 1;
                    let key = (self.key_fn)(&row);
                    self.check_order(&key, duplicates)?;
                    CursorState::Active(row, key)
                }
                None => CursorState::Exhausted,
            };
        }

        match &self.state {
            CursorState::Active(_, key) => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    fn check_order(&self, key: &K, duplicates: DuplicateKeys) -> Result<()> {
        let previous = match &self.last_key {
            Some(previous) => previous,
            None => return Ok(()),
        };

        match key.cmp(previous) {
            Ordering::Less => Err(ErrorKind::OrderViolation(
                self.side,
                format!("{:?}", key),
                format!("{:?}", previous),
            )
            .into()),
            Ordering::Equal if duplicates == DuplicateKeys::Reject => {
                Err(ErrorKind::DuplicateKey(self.side, format!("{:?}", key)).into())
            }
            _ => Ok(()),
        }
    }

    /// Hands out the pending row, if any, and remembers its key.
    fn take(&mut self) -> Option<S::Row> {
        match mem::replace(&mut self.state, CursorState::Consumed) {
            CursorState::Active(row, key) => {
                self.last_key = Some(key);
                Some(row)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    fn pending(&self) -> usize {
        match self.state {
            CursorState::Active(..) => 1,
            _ => 0,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum MergeState {
    Running,
    Failed,
    Finished,
}

/// Two-pointer merge of two key-ordered sources into a lazy full outer join.
///
/// Each call to `next` pulls at most one row per side, compares the two current keys and
/// emits one `JoinOutcome`. Rows are never buffered beyond the current one per side, so
/// memory does not grow with the input. The differ does not sort: a key that is smaller
/// than its predecessor on the same side fails the run with `OrderViolation`, after
/// which the iterator is finished.
pub struct SortedMergeDiffer<L, R, LK, RK, K>
where
    L: OrderedSource,
    R: OrderedSource,
{
    left: Cursor<L, LK, K>,
    right: Cursor<R, RK, K>,
    duplicates: DuplicateKeys,
    state: MergeState,
    stats: MergeStats,
}

impl<L, R, LK, RK, K> SortedMergeDiffer<L, R, LK, RK, K>
where
    L: OrderedSource,
    R: OrderedSource,
    LK: Fn(&L::Row) -> K,
    RK: Fn(&R::Row) -> K,
    K: Ord + Debug,
{
    pub fn new(left: L, right: R, left_key: LK, right_key: RK) -> Self {
        SortedMergeDiffer {
            left: Cursor::new(Side::Left, left, left_key),
            right: Cursor::new(Side::Right, right, right_key),
            duplicates: DuplicateKeys::default(),
            state: MergeState::Running,
            stats: MergeStats::default(),
        }
    }

    pub fn with_duplicates(mut self, duplicates: DuplicateKeys) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// The declared memory behaviour of the adapter on the given side.
    pub fn streaming(&self, side: Side) -> Streaming {
        match side {
            Side::Left => self.left.source.streaming(),
            Side::Right => self.right.source.streaming(),
        }
    }

    pub fn stats(&self) -> MergeStats {
        MergeStats {
            left_pulled: self.left.pulled,
            right_pulled: self.right.pulled,
            ..self.stats
        }
    }

    /// Whether both sides were drained without a failure.
    pub fn is_finished(&self) -> bool {
        self.state == MergeState::Finished
    }

    /// Releases the two adapters.
    pub fn into_sources(self) -> (L, R) {
        (self.left.source, self.right.source)
    }

    fn step(&mut self) -> Result<Option<JoinOutcome<L::Row, R::Row>>> {
        let duplicates = self.duplicates;
        let order = match (self.left.fill(duplicates)?, self.right.fill(duplicates)?) {
            (Some(l), Some(r)) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return Ok(None),
        };

        let pending = self.left.pending() + self.right.pending();
        if pending > self.stats.peak_pending {
            self.stats.peak_pending = pending;
        }

        let (left, right) = match order {
            Ordering::Less => (self.left.take(), None),
            Ordering::Greater => (None, self.right.take()),
            Ordering::Equal => (self.left.take(), self.right.take()),
        };

        Ok(JoinOutcome::from_parts(left, right))
    }
}

impl<L, R, LK, RK, K> Iterator for SortedMergeDiffer<L, R, LK, RK, K>
where
    L: OrderedSource,
    R: OrderedSource,
    LK: Fn(&L::Row) -> K,
    RK: Fn(&R::Row) -> K,
    K: Ord + Debug,
{
    type Item = Result<JoinOutcome<L::Row, R::Row>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != MergeState::Running {
            return None;
        }

        match self.step() {
            Ok(Some(outcome)) => {
                self.stats.emitted += 1;
                Some(Ok(outcome))
            }
            Ok(None) => {
                self.state = MergeState::Finished;
                None
            }
            Err(e) => {
                self.state = MergeState::Failed;
                Some(Err(e))
            }
        }
    }
}

/// Merges two already sorted in-memory sequences.
pub fn diff_iters<LI, RI, LK, RK, K>(
    left: LI,
    right: RI,
    left_key: LK,
    right_key: RK,
) -> SortedMergeDiffer<IterSource<LI::IntoIter>, IterSource<RI::IntoIter>, LK, RK, K>
where
    LI: IntoIterator,
    RI: IntoIterator,
    LK: Fn(&LI::Item) -> K,
    RK: Fn(&RI::Item) -> K,
    K: Ord + Debug,
{
    SortedMergeDiffer::new(
        IterSource::new(left.into_iter()),
        IterSource::new(right.into_iter()),
        left_key,
        right_key,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::iter::FallibleSource;
    use crate::errors::Error;

    fn keys(outcomes: &[JoinOutcome<i32, i32>]) -> Vec<(Option<i32>, Option<i32>)> {
        outcomes
            .iter()
            .map(|o| (o.left().copied(), o.right().copied()))
            .collect()
    }

    fn run(left: Vec<i32>, right: Vec<i32>) -> Vec<JoinOutcome<i32, i32>> {
        diff_iters(left, right, |l: &i32| *l, |r: &i32| *r)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_merge_interleaved() {
        let out = run(vec![1, 3, 4, 7], vec![2, 3, 7, 9]);

        assert_eq!(
            keys(&out),
            vec![
                (Some(1), None),
                (None, Some(2)),
                (Some(3), Some(3)),
                (Some(4), None),
                (Some(7), Some(7)),
                (None, Some(9)),
            ]
        );
    }

    #[test]
    fn test_merge_empty_sides() {
        assert!(run(vec![], vec![]).is_empty());
        assert_eq!(
            run(vec![1, 2], vec![]),
            vec![JoinOutcome::LeftOnly(1), JoinOutcome::LeftOnly(2)]
        );
        assert_eq!(
            run(vec![], vec![5]),
            vec![JoinOutcome::RightOnly(5)]
        );
    }

    #[test]
    fn test_merge_with_different_row_types() {
        let left = vec![(1i64, "a"), (2i64, "b")];
        let right = vec![2i64, 3];
        let out = diff_iters(left, right, |l: &(i64, &str)| l.0, |r: &i64| *r)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(
            out,
            vec![
                JoinOutcome::LeftOnly((1, "a")),
                JoinOutcome::Matched((2, "b"), 2),
                JoinOutcome::RightOnly(3),
            ]
        );
    }

    #[test]
    fn test_order_violation_stops_the_merge() {
        let mut differ = diff_iters(vec![1, 5, 3], vec![10], |l: &i32| *l, |r: &i32| *r);

        assert_eq!(differ.next().unwrap().unwrap(), JoinOutcome::LeftOnly(1));
        assert_eq!(differ.next().unwrap().unwrap(), JoinOutcome::LeftOnly(5));
        match differ.next() {
            Some(Err(Error(ErrorKind::OrderViolation(side, key, previous), _))) => {
                assert_eq!(side, Side::Left);
                assert_eq!(key, "3");
                assert_eq!(previous, "5");
            }
            other => panic!("Expected an order violation, got {:?}", other),
        }
        assert!(differ.next().is_none());
        assert!(!differ.is_finished());
    }

    #[test]
    fn test_order_violation_on_right_side() {
        let result = diff_iters(vec![1], vec![2, 1], |l: &i32| *l, |r: &i32| *r)
            .collect::<Result<Vec<_>>>();

        match result {
            Err(Error(ErrorKind::OrderViolation(Side::Right, _, _), _)) => {}
            other => panic!("Expected an order violation, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keys_rejected_by_default() {
        let result = diff_iters(vec![1, 1], vec![1], |l: &i32| *l, |r: &i32| *r)
            .collect::<Result<Vec<_>>>();

        match result {
            Err(Error(ErrorKind::DuplicateKey(Side::Left, key), _)) => assert_eq!(key, "1"),
            other => panic!("Expected a duplicate key error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keys_allowed_consume_each_row_once() {
        let out = diff_iters(vec![1, 1, 2], vec![1, 2, 2], |l: &i32| *l, |r: &i32| *r)
            .with_duplicates(DuplicateKeys::Allow)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let lefts = out.iter().filter(|o| o.left().is_some()).count();
        let rights = out.iter().filter(|o| o.right().is_some()).count();
        assert_eq!(lefts, 3);
        assert_eq!(rights, 3);
        assert_eq!(out[0], JoinOutcome::Matched(1, 1));
    }

    #[test]
    fn test_allowed_duplicate_runs_pair_off() {
        let out = diff_iters(vec![1, 1, 2], vec![1, 1], |l: &i32| *l, |r: &i32| *r)
            .with_duplicates(DuplicateKeys::Allow)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(
            out,
            vec![
                JoinOutcome::Matched(1, 1),
                JoinOutcome::Matched(1, 1),
                JoinOutcome::LeftOnly(2),
            ]
        );
    }

    #[test]
    fn test_adapter_failure_names_the_side() {
        let right = FallibleSource::new(
            vec![Ok(1), Err(Error::from("connection reset"))].into_iter(),
        );
        let mut differ = SortedMergeDiffer::new(
            IterSource::new(vec![2, 3].into_iter()),
            right,
            |l: &i32| *l,
            |r: &i32| *r,
        );

        assert_eq!(differ.next().unwrap().unwrap(), JoinOutcome::RightOnly(1));
        match differ.next() {
            Some(Err(e)) => {
                match e.kind() {
                    ErrorKind::AdapterFailure(Side::Right) => {}
                    other => panic!("Unexpected error kind {:?}", other),
                }
                assert_eq!(e.iter().nth(1).unwrap().to_string(), "connection reset");
            }
            other => panic!("Expected an adapter failure, got {:?}", other),
        }
        assert!(differ.next().is_none());
    }

    #[test]
    fn test_pulls_lazily_and_holds_at_most_one_row_per_side() {
        let mut differ = diff_iters(vec![1, 2, 3], vec![2], |l: &i32| *l, |r: &i32| *r);

        differ.next().unwrap().unwrap();
        assert_eq!(differ.stats().left_pulled, 1);
        assert_eq!(differ.stats().right_pulled, 1);

        while let Some(outcome) = differ.next() {
            outcome.unwrap();
        }

        let stats = differ.stats();
        assert!(differ.is_finished());
        assert_eq!(stats.left_pulled, 3);
        assert_eq!(stats.right_pulled, 1);
        assert_eq!(stats.emitted, 3);
        assert_eq!(stats.peak_pending, 2);
    }

    #[test]
    fn test_from_parts_never_builds_an_empty_outcome() {
        assert_eq!(JoinOutcome::<i32, i32>::from_parts(None, None), None);
        assert_eq!(
            JoinOutcome::<i32, i32>::from_parts(Some(1), Some(1)).map(JoinOutcome::into_parts),
            Some((Some(1), Some(1)))
        );
    }
}
