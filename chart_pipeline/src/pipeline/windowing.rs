//! Initial X-axis window: which record positions are visible on first draw.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::models::record::RecordSeries;

/// Bars visible when a chart first opens.
pub const DEFAULT_VISIBLE_BARS: usize = 50;

/// Inclusive range of record positions shown on the X axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    /// Zero for a hand-built window with `end < start`.
    pub fn len(&self) -> usize {
        self.end.checked_sub(self.start).map_or(0, |span| span + 1)
    }

    pub fn contains(&self, position: usize) -> bool {
        self.range().contains(&position)
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// The last [`DEFAULT_VISIBLE_BARS`] positions of a sequence of `len` records,
/// or all of them if there are fewer. `None` for an empty sequence.
pub fn default_window(len: usize) -> Option<Window> {
    window_with(len, DEFAULT_VISIBLE_BARS)
}

/// Like [`default_window`] with a custom bar count (at least one bar is shown).
pub fn window_with(len: usize, visible: usize) -> Option<Window> {
    let end = len.checked_sub(1)?;
    let start = len.saturating_sub(visible.max(1));
    Some(Window { start, end })
}

impl RecordSeries {
    pub fn default_window(&self) -> Option<Window> {
        default_window(self.len())
    }
}
