//! Raster undo/redo.
//!
//! Each entry is the full surface captured just before a change began.
//! Position `cursor` is the state currently displayed: positions below it
//! are undo targets, positions above it redo targets. The live surface at
//! the tip is not stored until the first undo leaves it.

use crate::renderer::RenderResult;
use crate::surface::Surface;
use std::collections::VecDeque;

/// Maximum number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Vec<u8>>,
    cursor: usize,
    /// The live surface saved by an undo from the tip.
    tip: Option<Vec<u8>>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create an empty history holding at most `limit` entries (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            tip: None,
            limit: limit.max(1),
        }
    }

    /// Capture the surface before a change. Discards anything redoable.
    pub fn snapshot<S: Surface + ?Sized>(&mut self, surface: &S) {
        self.entries.truncate(self.cursor);
        self.tip = None;
        self.entries.push_back(surface.read_pixels());
        self.cursor += 1;
        if self.entries.len() > self.limit {
            self.entries.pop_front();
            self.cursor -= 1;
        }
    }

    /// Step back one entry. Returns whether anything changed.
    pub fn undo<S: Surface + ?Sized>(&mut self, surface: &mut S) -> RenderResult<bool> {
        if self.cursor == 0 {
            return Ok(false);
        }
        if self.cursor == self.entries.len() {
            self.tip = Some(surface.read_pixels());
        }
        surface.write_pixels(&self.entries[self.cursor - 1])?;
        self.cursor -= 1;
        Ok(true)
    }

    /// Step forward one entry. Returns whether anything changed.
    pub fn redo<S: Surface + ?Sized>(&mut self, surface: &mut S) -> RenderResult<bool> {
        if self.cursor >= self.entries.len() {
            return Ok(false);
        }
        let next = self.cursor + 1;
        let pixels = if next == self.entries.len() {
            self.tip.as_ref()
        } else {
            self.entries.get(next)
        };
        let Some(pixels) = pixels else {
            return Ok(false);
        };
        surface.write_pixels(pixels)?;
        self.cursor = next;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Paint, RasterSurface};
    use kurbo::BezPath;
    use peniko::Color;

    fn scribble(surface: &mut RasterSurface, row: usize) {
        let y = (row % 16) as f64 + 0.5;
        let mut path = BezPath::new();
        path.move_to((0.0, y));
        path.line_to((16.0, y));
        surface.stroke(&path, &Paint::solid(Color::from_rgba8(0, 0, 0, 255), 1.0));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut surface = RasterSurface::new(16, 16).unwrap();
        let mut history = History::default();
        let blank = surface.read_pixels();
        let mut states = Vec::new();
        for i in 0..10 {
            history.snapshot(&surface);
            scribble(&mut surface, i);
            states.push(surface.read_pixels());
        }
        let last = surface.read_pixels();

        for _ in 0..10 {
            assert!(history.undo(&mut surface).unwrap());
        }
        assert_eq!(surface.read_pixels(), blank);
        assert!(!history.undo(&mut surface).unwrap());

        for i in 0..10 {
            assert!(history.redo(&mut surface).unwrap());
            assert_eq!(surface.read_pixels(), states[i]);
        }
        assert_eq!(surface.read_pixels(), last);
        assert!(!history.redo(&mut surface).unwrap());
    }

    #[test]
    fn test_undo_at_lower_bound_is_noop() {
        let mut surface = RasterSurface::new(4, 4).unwrap();
        let mut history = History::default();
        assert!(!history.can_undo());
        assert!(!history.undo(&mut surface).unwrap());
        assert!(!history.redo(&mut surface).unwrap());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut surface = RasterSurface::new(16, 16).unwrap();
        let mut history = History::default();
        for i in 0..51 {
            history.snapshot(&surface);
            scribble(&mut surface, i);
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(history.cursor(), DEFAULT_HISTORY_LIMIT);

        let mut depth = 0;
        while history.undo(&mut surface).unwrap() {
            depth += 1;
        }
        assert_eq!(depth, DEFAULT_HISTORY_LIMIT);
        // The blank entry was evicted, so the oldest reachable state holds the first line.
        assert!(!surface.is_blank());
    }

    #[test]
    fn test_snapshot_after_undo_discards_redo() {
        let mut surface = RasterSurface::new(16, 16).unwrap();
        let mut history = History::default();
        for i in 0..3 {
            history.snapshot(&surface);
            scribble(&mut surface, i);
        }
        history.undo(&mut surface).unwrap();
        history.undo(&mut surface).unwrap();
        assert!(history.can_redo());

        history.snapshot(&surface);
        scribble(&mut surface, 9);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), 2);
    }
}
