use crate::errors::Result;
use serde::Serialize;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Insert,
    Update,
    Delete,
    Unchanged,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Insert,
        Classification::Update,
        Classification::Delete,
        Classification::Unchanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Insert => "insert",
            Classification::Update => "update",
            Classification::Delete => "delete",
            Classification::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified join outcome, carrying the rows the caller needs to act on it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SyncAction<L, R> {
    Insert {
        source: L,
    },
    Update {
        source: L,
        destination: R,
        changed: Vec<String>,
    },
    Delete {
        destination: R,
    },
    Unchanged {
        source: L,
        destination: R,
    },
}

impl<L, R> SyncAction<L, R> {
    pub fn classification(&self) -> Classification {
        match self {
            SyncAction::Insert { .. } => Classification::Insert,
            SyncAction::Update { .. } => Classification::Update,
            SyncAction::Delete { .. } => Classification::Delete,
            SyncAction::Unchanged { .. } => Classification::Unchanged,
        }
    }
}

/// Running totals per classification.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct SyncCounts {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
    pub unchanged: u64,
}

impl SyncCounts {
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Insert => self.inserted += 1,
            Classification::Update => self.updated += 1,
            Classification::Delete => self.deleted += 1,
            Classification::Unchanged => self.unchanged += 1,
        }
    }

    pub fn get(&self, classification: Classification) -> u64 {
        match classification {
            Classification::Insert => self.inserted,
            Classification::Update => self.updated,
            Classification::Delete => self.deleted,
            Classification::Unchanged => self.unchanged,
        }
    }

    /// Number of distinct keys seen across both sides.
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted + self.unchanged
    }
}

impl fmt::Display for SyncCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted: {}, updated: {}, deleted: {}, unchanged: {}",
            self.inserted, self.updated, self.deleted, self.unchanged
        )
    }
}

/// Receiver of classified actions, e.g. a writer issuing statements against a store.
pub trait ActionSink<L, R> {
    fn apply(&mut self, action: SyncAction<L, R>) -> Result<()>;
}

impl<L, R, F> ActionSink<L, R> for F
where
    F: FnMut(SyncAction<L, R>) -> Result<()>,
{
    fn apply(&mut self, action: SyncAction<L, R>) -> Result<()> {
        self(action)
    }
}
