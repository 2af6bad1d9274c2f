use shared::domain::SlideId;

use crate::error::HostSessionError;

/// Ordered slide ids for one presentation, bracketed by a sentinel slot at
/// each end so the navigation window can hang off either edge of the deck.
/// Built once per presentation load and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSequence {
    slots: Vec<Option<SlideId>>,
}

impl SlideSequence {
    /// Builds the bracketed sequence from the raw ordered ids returned by
    /// the slide directory. An empty input means the data has not arrived
    /// yet and is reported as `EmptySequence`.
    pub fn from_slide_ids(slide_ids: &[SlideId]) -> Result<Self, HostSessionError> {
        if slide_ids.is_empty() {
            return Err(HostSessionError::EmptySequence);
        }
        let mut slots = Vec::with_capacity(slide_ids.len() + 2);
        slots.push(None);
        slots.extend(slide_ids.iter().copied().map(Some));
        slots.push(None);
        Ok(Self { slots })
    }

    /// Indexed slot access. Anything outside the sequence reads as the
    /// sentinel, which keeps the window arithmetic free of bounds checks.
    pub fn slot(&self, index: usize) -> Option<SlideId> {
        self.slots.get(index).copied().flatten()
    }

    /// Index of a real slide within the bracketed sequence.
    pub fn position(&self, slide_id: SlideId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(slide_id))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/sequence_tests.rs"]
mod tests;
