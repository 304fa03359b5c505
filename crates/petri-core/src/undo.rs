//! Bounded snapshot history for brush strokes.

use std::collections::VecDeque;

use crate::grid::FieldGrid;

/// Default history depth.
pub const DEFAULT_DEPTH: usize = 10;

/// A deep copy of both channels at a point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Channel U copy.
    pub u: Vec<f32>,
    /// Channel V copy.
    pub v: Vec<f32>,
}

/// Bounded stack of grid snapshots.
///
/// Push before a stroke begins, pop to revert exactly one stroke. The
/// oldest snapshot is dropped once the stack exceeds its depth.
#[derive(Debug)]
pub struct UndoStack {
    snapshots: VecDeque<Snapshot>,
    depth: usize,
}

impl UndoStack {
    /// Creates a stack with the default depth.
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_DEPTH)
    }

    /// Creates a stack bounded to `depth` snapshots.
    pub fn with_depth(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Deep-copies the current channels onto the stack.
    pub fn push(&mut self, grid: &FieldGrid) {
        self.push_raw(grid.u().to_vec(), grid.v().to_vec());
    }

    /// Pushes already-copied channel buffers (used by backends that read
    /// state back from device memory).
    pub fn push_raw(&mut self, u: Vec<f32>, v: Vec<f32>) {
        self.snapshots.push_back(Snapshot { u, v });
        if self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
    }

    /// Pops the most recent snapshot, or `None` if the stack is empty.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    /// Pops and restores into the grid. Returns false, with no effect, on
    /// an empty stack.
    pub fn restore_into(&mut self, grid: &mut FieldGrid) -> bool {
        match self.pop() {
            Some(snapshot) => {
                grid.restore(&snapshot.u, &snapshot.v);
                true
            }
            None => false,
        }
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True if nothing can be undone.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drops all history (required after a grid reallocation).
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_restore() {
        let mut grid = FieldGrid::new(8, 8);
        let mut undo = UndoStack::new();

        undo.push(&grid);
        grid.set_v(4, 4, 0.9);

        assert!(undo.restore_into(&mut grid));
        assert_eq!(grid.get_v(4, 4), 0.0);
    }

    #[test]
    fn test_empty_pop_is_noop() {
        let mut grid = FieldGrid::new(4, 4);
        grid.set_v(1, 1, 0.7);
        let mut undo = UndoStack::new();

        assert!(!undo.restore_into(&mut grid));
        assert_eq!(grid.get_v(1, 1), 0.7);
    }

    #[test]
    fn test_depth_evicts_oldest() {
        let mut grid = FieldGrid::new(4, 4);
        let mut undo = UndoStack::with_depth(3);

        for i in 0..5 {
            grid.set_v(0, 0, i as f32 * 0.1);
            undo.push(&grid);
        }

        assert_eq!(undo.len(), 3);
        // The two oldest states (0.0, 0.1) are gone; the deepest restore
        // lands on the third push.
        undo.restore_into(&mut grid);
        undo.restore_into(&mut grid);
        undo.restore_into(&mut grid);
        assert!((grid.get_v(0, 0) - 0.2).abs() < 1e-6);
        assert!(undo.is_empty());
    }

    #[test]
    fn test_n_strokes_n_undos_restores_exactly() {
        let mut grid = FieldGrid::new(16, 16);
        let mut undo = UndoStack::new();
        let original = grid.clone();

        for i in 0..4 {
            undo.push(&grid);
            grid.set_v(i, i, 0.5);
        }
        for _ in 0..4 {
            assert!(undo.restore_into(&mut grid));
        }

        assert_eq!(grid.u(), original.u());
        assert_eq!(grid.v(), original.v());
    }

    #[test]
    fn test_clear() {
        let grid = FieldGrid::new(4, 4);
        let mut undo = UndoStack::new();
        undo.push(&grid);
        undo.clear();
        assert!(undo.is_empty());
    }
}
