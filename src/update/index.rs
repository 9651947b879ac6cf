//! Mapping from output indices to their source.
//!
//! The engine addresses output items by a dense index `0..count`. Items that
//! survive from the source archive come first, in their original order, then
//! the newly added items in insertion order:
//!
//! ```text
//! source:   0  1  2  3  4        deleted = {1, 3}
//! new:      n0 n1
//! output:   0->E0  1->E2  2->E4  3->N0  4->N1
//! ```

use std::collections::BTreeSet;

/// Where an output item comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputIndex {
    /// An item of the source archive, by its index there.
    Existing(u32),
    /// A newly added item, by its position in the new-item list.
    New(u32),
}

impl InputIndex {
    /// Decodes the packed form, where new items follow the
    /// `existing_count` source items.
    pub fn from_packed(packed: u32, existing_count: u32) -> Self {
        if packed < existing_count {
            Self::Existing(packed)
        } else {
            Self::New(packed - existing_count)
        }
    }

    /// Encodes to the packed form. See [`from_packed`](Self::from_packed).
    pub fn to_packed(self, existing_count: u32) -> u32 {
        match self {
            Self::Existing(index) => index,
            Self::New(slot) => existing_count + slot,
        }
    }

    /// The source-archive index, for existing items.
    pub fn existing(self) -> Option<u32> {
        match self {
            Self::Existing(index) => Some(index),
            Self::New(_) => None,
        }
    }

    /// True for newly added items.
    pub fn is_new(self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// The resolved output-index table.
///
/// When nothing is deleted the table stays empty and the identity mapping
/// is implied, so large source archives cost nothing to append to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMapping {
    entries: Option<Vec<InputIndex>>,
    existing_count: u32,
}

impl IndexMapping {
    /// Builds the table for `existing_count` source items, of which `deleted`
    /// are dropped, followed by `new_count` new items.
    ///
    /// Deleted indices at or past `existing_count` are ignored.
    pub fn build(existing_count: u32, deleted: &BTreeSet<u32>, new_count: u32) -> Self {
        if deleted.is_empty() {
            return Self {
                entries: None,
                existing_count,
            };
        }

        let kept = existing_count as usize - deleted.range(..existing_count).count();
        let mut entries = Vec::with_capacity(kept + new_count as usize);
        let mut pending = deleted.iter().copied().peekable();
        for index in 0..existing_count {
            if pending.peek() == Some(&index) {
                pending.next();
                continue;
            }
            entries.push(InputIndex::Existing(index));
        }
        entries.extend((0..new_count).map(InputIndex::New));

        Self {
            entries: Some(entries),
            existing_count,
        }
    }

    /// Resolves an output index.
    pub fn get(&self, output_index: u32) -> InputIndex {
        let Some(entries) = &self.entries else {
            return InputIndex::from_packed(output_index, self.existing_count);
        };
        match entries.get(output_index as usize) {
            Some(&input) => input,
            // Past the end: the slot that would follow the last new item.
            None => {
                let kept = entries.iter().filter(|i| !i.is_new()).count() as u32;
                InputIndex::New(output_index - kept)
            }
        }
    }

    /// Resolves an output index straight from the delete set, without a
    /// table. Agrees with [`build`](Self::build) followed by
    /// [`get`](Self::get) for the same inputs.
    pub fn resolve(existing_count: u32, deleted: &BTreeSet<u32>, output_index: u32) -> InputIndex {
        let live = deleted.range(..existing_count);
        let kept = existing_count - live.clone().count() as u32;
        if output_index >= kept {
            return InputIndex::New(output_index - kept);
        }
        // Every deleted index at or before the candidate shifts it by one.
        let mut candidate = output_index;
        for &index in live {
            if index > candidate {
                break;
            }
            candidate += 1;
        }
        InputIndex::Existing(candidate)
    }

    /// True if no table was materialized.
    pub fn is_identity(&self) -> bool {
        self.entries.is_none()
    }
}
