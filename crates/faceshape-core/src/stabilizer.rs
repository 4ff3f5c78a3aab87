//! Temporal smoothing of per-frame shape labels.
//!
//! Keeps the last N labels and reports the most frequent one, so a single
//! noisy frame does not flip the displayed result.

use crate::types::ShapeLabel;
use std::collections::VecDeque;

/// Default number of frames the majority vote covers.
pub const DEFAULT_HISTORY_SIZE: usize = 30;

/// Bounded FIFO of recent labels with a majority-vote readout.
#[derive(Debug, Clone)]
pub struct ShapeHistory {
    entries: VecDeque<ShapeLabel>,
    capacity: usize,
}

impl Default for ShapeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl ShapeHistory {
    /// Create an empty history. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a label, evicting the oldest entry once over capacity.
    pub fn push(&mut self, label: ShapeLabel) {
        self.entries.push_back(label);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Most frequent label in the window, or `None` when empty.
    ///
    /// Ties go to the label that reached the winning count most recently,
    /// so an even split follows the newer frames.
    pub fn current_label(&self) -> Option<ShapeLabel> {
        let mut counts = [0usize; ShapeLabel::ALL.len()];
        let mut best: Option<(ShapeLabel, usize)> = None;

        for &label in &self.entries {
            counts[label.index()] += 1;
            let count = counts[label.index()];
            if best.map_or(true, |(_, n)| count >= n) {
                best = Some((label, count));
            }
        }

        best.map(|(label, _)| label)
    }

    /// Occurrences of each label currently in the window.
    pub fn counts(&self) -> Vec<(ShapeLabel, usize)> {
        ShapeLabel::ALL
            .into_iter()
            .map(|label| (label, self.entries.iter().filter(|&&l| l == label).count()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Labels from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = ShapeLabel> + '_ {
        self.entries.iter().copied()
    }
}
