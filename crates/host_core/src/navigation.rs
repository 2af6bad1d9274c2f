use serde::Serialize;
use shared::domain::SlideId;
use tracing::debug;

use crate::{error::HostSessionError, sequence::SlideSequence};

/// Sliding 3-window over the slide sequence. `cur` is always a real slide
/// while a deck is loaded; `prev` and `next` read as the sentinel at the
/// deck edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub prev: Option<SlideId>,
    pub cur: Option<SlideId>,
    pub next: Option<SlideId>,
}

/// Drives which slide is on air. Transitions that would move `cur` onto a
/// sentinel are guarded no-ops.
#[derive(Debug, Clone)]
pub struct Navigator {
    sequence: SlideSequence,
    cursor: usize,
}

impl Navigator {
    /// Playback always starts on the first real slide: index 1, right
    /// after the leading sentinel. The same rule resolves decks of 1, 2,
    /// or more slides.
    pub fn new(sequence: SlideSequence) -> Self {
        Self {
            sequence,
            cursor: 1,
        }
    }

    pub fn state(&self) -> NavigationState {
        NavigationState {
            prev: self.sequence.slot(self.cursor.wrapping_sub(1)),
            cur: self.sequence.slot(self.cursor),
            next: self.sequence.slot(self.cursor + 1),
        }
    }

    pub fn current(&self) -> Option<SlideId> {
        self.sequence.slot(self.cursor)
    }

    /// Shifts the window one slide forward. Returns `false`, moving
    /// nothing, when already on the last real slide.
    pub fn advance(&mut self) -> bool {
        if self.sequence.slot(self.cursor + 1).is_none() {
            debug!(cursor = self.cursor, "advance past the last slide ignored");
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Shifts the window one slide back. Returns `false` when already on
    /// the first real slide.
    pub fn retreat(&mut self) -> bool {
        if self.sequence.slot(self.cursor.wrapping_sub(1)).is_none() {
            debug!(cursor = self.cursor, "retreat before the first slide ignored");
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Recomputes the window around `slide_id`. The cursor is untouched
    /// when the slide is not part of the deck.
    pub fn jump(&mut self, slide_id: SlideId) -> Result<(), HostSessionError> {
        let position = self
            .sequence
            .position(slide_id)
            .ok_or(HostSessionError::SlideNotFound { slide_id })?;
        self.cursor = position;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
