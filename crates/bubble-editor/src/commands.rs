//! Undo/redo snapshot stack.
//!
//! Every mutation pushes a snapshot of the whole graph taken *before* it
//! runs. Undo swaps the live graph for the newest snapshot and keeps the
//! state it replaced for redo. Snapshots are the flattened record list
//! packed with MessagePack, and rebuilding goes through the same two-pass
//! restore as loading from storage.
//!
//! Drag gestures use **snapshot batching**: the state is captured when the
//! gesture starts and only pushed when it ends, if anything changed, so a
//! whole drag undoes in one step.

use crate::error::EditError;
use bubble_core::{BubbleRecord, SceneGraph};

/// One packed graph state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
    pub description: String,
}

impl Snapshot {
    pub fn capture(graph: &SceneGraph, description: &str) -> Result<Self, EditError> {
        let bytes = rmp_serde::to_vec_named(&graph.to_records()).map_err(|e| EditError::Snapshot(e.to_string()))?;
        Ok(Self {
            bytes,
            description: description.to_string(),
        })
    }

    pub fn records(&self) -> Result<Vec<BubbleRecord>, EditError> {
        rmp_serde::from_slice(&self.bytes).map_err(|e| EditError::Snapshot(e.to_string()))
    }

    pub fn restore_into(&self, graph: &mut SceneGraph) -> Result<(), EditError> {
        let records = self.records()?;
        graph.restore(&records);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bounded undo history with a redo side.
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Maximum undo depth.
    max_depth: usize,
    /// State captured when the current gesture began.
    batch_snapshot: Option<Snapshot>,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_snapshot: None,
        }
    }

    /// Save the current state before a mutation. Clears redo.
    /// Inside a batch this is a no-op: the batch snapshot already covers it.
    pub fn record(&mut self, graph: &SceneGraph, description: &str) -> Result<(), EditError> {
        if self.batch_snapshot.is_some() {
            return Ok(());
        }
        let snapshot = Snapshot::capture(graph, description)?;
        self.push(snapshot);
        self.redo_stack.clear();
        Ok(())
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Start a gesture. Nested calls keep the outermost snapshot.
    pub fn begin_batch(&mut self, graph: &SceneGraph, description: &str) -> Result<(), EditError> {
        if self.batch_snapshot.is_none() {
            self.batch_snapshot = Some(Snapshot::capture(graph, description)?);
        }
        Ok(())
    }

    /// Finish a gesture. Pushes the starting state if the graph changed.
    /// Returns whether an undo step was added.
    pub fn end_batch(&mut self, graph: &SceneGraph) -> Result<bool, EditError> {
        let Some(before) = self.batch_snapshot.take() else {
            return Ok(false);
        };
        let after = Snapshot::capture(graph, &before.description)?;
        if after.bytes == before.bytes {
            return Ok(false);
        }
        self.push(before);
        self.redo_stack.clear();
        Ok(true)
    }

    pub fn in_batch(&self) -> bool {
        self.batch_snapshot.is_some()
    }

    /// Restore the newest snapshot. Returns its description, or `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self, graph: &mut SceneGraph) -> Result<Option<String>, EditError> {
        let Some(snapshot) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let current = match Snapshot::capture(graph, &snapshot.description) {
            Ok(current) => current,
            Err(e) => {
                self.undo_stack.push(snapshot);
                return Err(e);
            }
        };
        if let Err(e) = snapshot.restore_into(graph) {
            self.undo_stack.push(snapshot);
            return Err(e);
        }
        self.redo_stack.push(current);
        Ok(Some(snapshot.description))
    }

    /// Reapply the state the last undo replaced.
    pub fn redo(&mut self, graph: &mut SceneGraph) -> Result<Option<String>, EditError> {
        let Some(snapshot) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let current = match Snapshot::capture(graph, &snapshot.description) {
            Ok(current) => current,
            Err(e) => {
                self.redo_stack.push(snapshot);
                return Err(e);
            }
        };
        if let Err(e) = snapshot.restore_into(graph) {
            self.redo_stack.push(snapshot);
            return Err(e);
        }
        self.push(current);
        Ok(Some(snapshot.description))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}
