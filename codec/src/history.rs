//! Per-version change history.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use loadout::{SlotIndex, Version};

use crate::delta::DeltaMask;

/// Errors that can occur when recording into the version history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    /// Versions must be strictly increasing.
    OutOfOrder {
        last_version: Version,
        new_version: Version,
    },
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfOrder {
                last_version,
                new_version,
            } => write!(
                f,
                "version {new_version} recorded after {last_version}"
            ),
        }
    }
}

impl std::error::Error for HistoryError {}

/// A fixed-capacity ring of per-version slot sets.
///
/// Replaying the sets for `V+1..=current` reconstructs exactly which slots
/// changed since `V`, as long as that range is still retained.
#[derive(Debug)]
pub struct VersionHistory {
    entries: Vec<Option<Entry>>,
    head: usize,
    len: usize,
    last_version: Option<Version>,
}

#[derive(Debug)]
struct Entry {
    version: Version,
    slots: BTreeSet<SlotIndex>,
}

impl VersionHistory {
    /// Creates a new history retaining at most `capacity` versions.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        let mut entries = Vec::with_capacity(cap);
        entries.resize_with(cap, || None);
        Self {
            entries,
            head: 0,
            len: 0,
            last_version: None,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest retained version.
    #[must_use]
    pub fn oldest(&self) -> Option<Version> {
        self.iter().next().map(|(version, _)| version)
    }

    /// Newest retained version.
    #[must_use]
    pub const fn latest(&self) -> Option<Version> {
        self.last_version
    }

    /// Records the slots changed at `version`, evicting the oldest entry
    /// when full.
    pub fn record(
        &mut self,
        version: Version,
        slots: impl IntoIterator<Item = SlotIndex>,
    ) -> Result<(), HistoryError> {
        if let Some(last) = self.last_version {
            if version <= last {
                return Err(HistoryError::OutOfOrder {
                    last_version: last,
                    new_version: version,
                });
            }
        }

        let entry = Entry {
            version,
            slots: slots.into_iter().collect(),
        };
        let cap = self.entries.len();
        if self.len < cap {
            let idx = (self.head + self.len) % cap;
            self.entries[idx] = Some(entry);
            self.len += 1;
        } else {
            self.entries[self.head] = Some(entry);
            self.head = (self.head + 1) % cap;
        }

        self.last_version = Some(version);
        Ok(())
    }

    /// Returns the slots recorded for exactly `version`.
    #[must_use]
    pub fn get(&self, version: Version) -> Option<&BTreeSet<SlotIndex>> {
        self.iter().find(|(v, _)| *v == version).map(|(_, s)| s)
    }

    /// Unions the masks for versions in `(from, to]`.
    ///
    /// Returns `None` unless every version in the range is retained, in which
    /// case the caller must fall back to a full snapshot.
    #[must_use]
    pub fn mask_between(&self, from: Version, to: Version) -> Option<DeltaMask> {
        let mut mask = DeltaMask::new(from, to);
        if to <= from {
            return Some(mask);
        }
        if self.last_version.map_or(true, |last| last < to) {
            return None;
        }
        if self.oldest().map_or(true, |oldest| oldest > from.next()) {
            return None;
        }

        let mut covered = 0u32;
        for (version, slots) in self.iter() {
            if version > from && version <= to {
                covered += 1;
                mask.slots.extend(slots.iter().copied());
            }
        }
        (covered == to.gap_since(from)).then_some(mask)
    }

    /// Returns an iterator from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Version, &BTreeSet<SlotIndex>)> {
        let cap = self.entries.len();
        (0..self.len).filter_map(move |i| {
            let idx = (self.head + i) % cap;
            self.entries[idx]
                .as_ref()
                .map(|entry| (entry.version, &entry.slots))
        })
    }

    /// Forgets every entry but keeps the last recorded version, so ordering
    /// is still enforced.
    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
        self.head = 0;
        self.len = 0;
    }
}
