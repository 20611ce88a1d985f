use crate::row::RowId;

/// Serialized state of one row at the edges of an edit. Snapshots are written
/// without children; the tree shape is not part of a row edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    pub row: RowId,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone)]
pub struct Edit {
    pub name: String,
    pub rows: Vec<RowSnapshot>,
}

#[derive(Debug, Clone)]
struct Pending {
    name: String,
    before: Vec<(RowId, String)>,
    depth: usize,
}

/// Linear undo/redo history of row edits.
///
/// The document captures the snapshots (it owns the rows); this type only keeps
/// them in order and tracks where the last save happened.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    edits: Vec<Edit>,
    /// Number of edits currently applied.
    position: usize,
    /// `position` at the last save, `None` once that state can no longer be reached.
    saved_at: Option<usize>,
    pending: Option<Pending>,
    limit: usize,
}

pub const DEFAULT_UNDO_LIMIT: usize = 100;

impl Default for UndoHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            edits: Vec::new(),
            position: 0,
            saved_at: Some(0),
            pending: None,
            limit: limit.max(1),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.pending.is_some()
    }

    /// Opens an edit, or joins the one already open. Rows already captured keep their
    /// first snapshot.
    pub(crate) fn begin(&mut self, name: &str, before: Vec<(RowId, String)>) {
        match &mut self.pending {
            Some(pending) => {
                pending.depth += 1;
                for (row, snapshot) in before {
                    if !pending.before.iter().any(|(id, _)| *id == row) {
                        pending.before.push((row, snapshot));
                    }
                }
            }
            None => {
                self.pending = Some(Pending {
                    name: name.to_string(),
                    before,
                    depth: 1,
                })
            }
        }
    }

    /// Rows captured by the open edit.
    pub(crate) fn pending_rows(&self) -> Vec<RowId> {
        self.pending
            .as_ref()
            .map(|p| p.before.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    /// Whether the next [`UndoHistory::end`] closes the outermost edit.
    pub(crate) fn closing(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.depth == 1)
    }

    /// Closes one level of the open edit. At the outermost level `after` holds the
    /// final snapshots; rows that did not change are dropped, and an edit with no
    /// changed rows is not recorded. Returns whether an edit was recorded.
    pub(crate) fn end(&mut self, after: Vec<(RowId, String)>) -> bool {
        let Some(pending) = &mut self.pending else {
            log::error!("end of edit without a matching begin");
            return false;
        };
        if pending.depth > 1 {
            pending.depth -= 1;
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let rows: Vec<RowSnapshot> = pending
            .before
            .into_iter()
            .filter_map(|(row, before)| {
                let after = after.iter().find(|(id, _)| *id == row)?.1.clone();
                (before != after).then_some(RowSnapshot { row, before, after })
            })
            .collect();
        if rows.is_empty() {
            log::trace!("edit '{}' changed nothing; not recorded", pending.name);
            return false;
        }

        self.edits.truncate(self.position);
        if self.saved_at.is_some_and(|saved| saved > self.position) {
            self.saved_at = None;
        }
        self.edits.push(Edit {
            name: pending.name,
            rows,
        });
        if self.edits.len() > self.limit {
            self.edits.remove(0);
            self.saved_at = self.saved_at.and_then(|saved| saved.checked_sub(1));
        }
        self.position = self.edits.len();
        true
    }

    /// Drops the open edit and the entire history.
    pub fn discard_all(&mut self) {
        self.edits.clear();
        self.pending = None;
        self.position = 0;
        self.saved_at = None;
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.edits.len()
    }

    pub fn undo_name(&self) -> Option<&str> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.edits.get(i))
            .map(|e| e.name.as_str())
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.edits.get(self.position).map(|e| e.name.as_str())
    }

    /// Steps back; the caller restores each row's `before`.
    pub(crate) fn step_back(&mut self) -> Option<&Edit> {
        if !self.can_undo() {
            return None;
        }
        self.position -= 1;
        self.edits.get(self.position)
    }

    /// Steps forward; the caller restores each row's `after`.
    pub(crate) fn step_forward(&mut self) -> Option<&Edit> {
        if !self.can_redo() {
            return None;
        }
        self.position += 1;
        self.edits.get(self.position - 1)
    }

    pub fn mark_saved(&mut self) {
        self.saved_at = Some(self.position);
    }

    /// Whether the applied edits are exactly those present at the last save.
    pub fn at_save_point(&self) -> bool {
        self.saved_at == Some(self.position)
    }
}
