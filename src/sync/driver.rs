use crate::errors::{Error, ErrorKind, Result, ResultExt};
use crate::merge::differ::{JoinOutcome, SortedMergeDiffer};
use crate::merge::source::{OrderedSource, Side};
use crate::sync::action::{ActionSink, SyncAction, SyncCounts};
use crate::sync::compare::{Comparison, RowComparator};
use std::fmt::Debug;

/// Whether a run hands every action to a sink or only keeps the totals.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SyncMode {
    Counts,
    Actions,
}

/// What to do with an adapter that buffers its whole result set.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StreamingPolicy {
    /// Refuse to run.
    Require,
    /// Log a warning and run anyway; results are correct, memory is not constant.
    Warn,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum RunState {
    Running,
    Failed,
    Finished,
}

/// Drives a stream of join outcomes and classifies each one.
///
/// Only the outcome currently being classified is held. The synchronizer is itself an
/// iterator of actions; `run`, `tally` and `apply` drain it.
pub struct Synchronizer<D, C> {
    outcomes: D,
    comparator: C,
    counts: SyncCounts,
    state: RunState,
}

impl<D, C> Synchronizer<D, C> {
    pub fn new(outcomes: D, comparator: C) -> Synchronizer<D, C> {
        Synchronizer {
            outcomes,
            comparator,
            counts: SyncCounts::default(),
            state: RunState::Running,
        }
    }

    /// Totals classified so far. Only final once `is_complete` returns true.
    pub fn counts(&self) -> SyncCounts {
        self.counts
    }

    /// Whether the outcome stream was drained without a failure.
    pub fn is_complete(&self) -> bool {
        self.state == RunState::Finished
    }

    pub fn outcomes(&self) -> &D {
        &self.outcomes
    }

    pub fn into_inner(self) -> D {
        self.outcomes
    }
}

impl<L, R, LK, RK, K, C> Synchronizer<SortedMergeDiffer<L, R, LK, RK, K>, C>
where
    L: OrderedSource,
    R: OrderedSource,
    LK: Fn(&L::Row) -> K,
    RK: Fn(&R::Row) -> K,
    K: Ord + Debug,
{
    /// Builds a synchronizer over a differ after checking both adapters can stream.
    pub fn for_differ(
        differ: SortedMergeDiffer<L, R, LK, RK, K>,
        comparator: C,
        policy: StreamingPolicy,
    ) -> Result<Self> {
        for side in [Side::Left, Side::Right].iter() {
            let streaming = differ.streaming(*side);
            if streaming.is_constant_memory() {
                debug!(target: "merge_sync", "The {} adapter is {}", side, streaming);
                continue;
            }

            match policy {
                StreamingPolicy::Require => {
                    return Err(ErrorKind::NonStreamingSource(*side).into());
                }
                StreamingPolicy::Warn => warn!(
                    target: "merge_sync",
                    "The {} adapter is {}, memory grows with the input", side, streaming
                ),
            }
        }

        Ok(Synchronizer::new(differ, comparator))
    }
}

impl<D, C, L, R> Synchronizer<D, C>
where
    D: Iterator<Item = Result<JoinOutcome<L, R>>>,
    C: RowComparator<L, R>,
    L: Debug,
{
    /// Drains the outcome stream. In `Actions` mode every action goes to `sink`.
    ///
    /// Any failure aborts the run. The returned error is chained under `SyncAborted`,
    /// which carries the partial counts. In `Actions` mode those only include actions
    /// the sink accepted. A synchronizer that failed once keeps failing.
    pub fn run<S>(&mut self, mode: SyncMode, sink: &mut S) -> Result<SyncCounts>
    where
        S: ActionSink<L, R>,
    {
        debug!(target: "merge_sync", "Starting sync in {:?} mode", mode);

        while let Some(action) = self.next_action() {
            let action = match action {
                Ok(action) => action,
                Err(e) => return Err(e).chain_err(|| ErrorKind::SyncAborted(self.counts)),
            };
            let classification = action.classification();

            if mode == SyncMode::Actions {
                let applied = sink
                    .apply(action)
                    .chain_err(|| ErrorKind::SinkFailure(classification.to_string()));

                if let Err(e) = applied {
                    self.state = RunState::Failed;
                    return Err(e).chain_err(|| ErrorKind::SyncAborted(self.counts));
                }
            }
            self.counts.record(classification);
        }

        if self.state == RunState::Failed {
            return Err(Error::from("The outcome stream already failed"))
                .chain_err(|| ErrorKind::SyncAborted(self.counts));
        }

        debug!(target: "merge_sync", "Sync finished ({})", self.counts);
        Ok(self.counts)
    }

    /// Count-only run.
    pub fn tally(&mut self) -> Result<SyncCounts> {
        self.run(SyncMode::Counts, &mut DiscardActions)
    }

    /// Hands every action to `sink`.
    pub fn apply<S>(&mut self, sink: &mut S) -> Result<SyncCounts>
    where
        S: ActionSink<L, R>,
    {
        self.run(SyncMode::Actions, sink)
    }
}

impl<D, C, L, R> Iterator for Synchronizer<D, C>
where
    D: Iterator<Item = Result<JoinOutcome<L, R>>>,
    C: RowComparator<L, R>,
    L: Debug,
{
    type Item = Result<SyncAction<L, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let action = self.next_action()?;
        if let Ok(action) = &action {
            self.counts.record(action.classification());
        }

        Some(action)
    }
}

impl<D, C, L, R> Synchronizer<D, C>
where
    D: Iterator<Item = Result<JoinOutcome<L, R>>>,
    C: RowComparator<L, R>,
    L: Debug,
{
    /// Classifies the next outcome without counting it.
    fn next_action(&mut self) -> Option<Result<SyncAction<L, R>>> {
        if self.state != RunState::Running {
            return None;
        }

        let outcome = match self.outcomes.next() {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                self.state = RunState::Failed;
                return Some(Err(e));
            }
            None => {
                self.state = RunState::Finished;
                return None;
            }
        };

        match classify(&self.comparator, outcome) {
            Ok(action) => {
                trace!(target: "merge_sync", "Classified {:?}", action.classification());
                Some(Ok(action))
            }
            Err(e) => {
                self.state = RunState::Failed;
                Some(Err(e))
            }
        }
    }
}

/// Maps one join outcome to its action. Matched pairs go through the comparator.
pub fn classify<L, R, C>(comparator: &C, outcome: JoinOutcome<L, R>) -> Result<SyncAction<L, R>>
where
    C: RowComparator<L, R>,
    L: Debug,
{
    match outcome {
        JoinOutcome::LeftOnly(source) => Ok(SyncAction::Insert { source }),
        JoinOutcome::RightOnly(destination) => Ok(SyncAction::Delete { destination }),
        JoinOutcome::Matched(source, destination) => {
            let comparison = comparator
                .compare(&source, &destination)
                .chain_err(|| ErrorKind::ComparatorFailure(format!("{:?}", source)))?;

            Ok(match comparison {
                Comparison::Equal => SyncAction::Unchanged {
                    source,
                    destination,
                },
                Comparison::Changed(changed) => SyncAction::Update {
                    source,
                    destination,
                    changed,
                },
            })
        }
    }
}

struct DiscardActions;

impl<L, R> ActionSink<L, R> for DiscardActions {
    fn apply(&mut self, _: SyncAction<L, R>) -> Result<()> {
        Ok(())
    }
}
