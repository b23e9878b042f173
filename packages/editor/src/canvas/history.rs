//! Snapshot history for the canvas editor.
//!
//! Every change pushes a full copy of the canvas content. Undo and redo move
//! an index over the list, and pushing after an undo drops the redo tail.

pub const DEFAULT_MAX_SNAPSHOTS: usize = 50;

#[derive(Debug, Clone)]
pub struct SnapshotHistory<T> {
    snapshots: Vec<T>,
    index: usize,
    max_size: usize,
}

impl<T: Clone> SnapshotHistory<T> {
    /// Starts with `initial` as the only snapshot. A `max_size` of 0 is
    /// treated as 1.
    pub fn new(initial: T, max_size: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            max_size: max_size.max(1),
        }
    }

    pub fn push(&mut self, snapshot: T) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Forget everything and start over from `initial`
    pub fn reset(&mut self, initial: T) {
        self.snapshots = vec![initial];
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
