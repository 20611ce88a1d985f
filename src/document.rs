use crate::codec::{self, LoadState};
use crate::kinds::Family;
use crate::notify::Notifier;
use crate::resolve::{CharacterAttributes, MAX_ENCUMBRANCE_LEVEL, Resolver};
use crate::row::{CaseSensitivity, Row, RowId, RowIter, skills_named};
use crate::skill_default::Attribute;
use crate::statics;
use crate::undo::UndoHistory;
use crate::weapon::WeaponStats;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::{Rc, Weak};

/// The part of a document rows can reach. Rows hold it weakly, so a row that
/// outlives its document, or was never added to one, talks to nobody.
#[derive(Debug, Default)]
pub(crate) struct DocumentLink {
    notifier: Notifier,
    modified: Cell<bool>,
}

impl DocumentLink {
    /// Marks the document modified and broadcasts `id`. Suppression only silences
    /// the broadcast.
    pub(crate) fn changed(&self, producer: Option<RowId>, id: &str) {
        self.modified.set(true);
        self.notifier.notify(producer, id, None);
    }

    /// Broadcasts `id` without touching the modified flag, for derived state that
    /// is never written out.
    pub(crate) fn announce(&self, producer: Option<RowId>, id: &str) {
        self.notifier.notify(producer, id, None);
    }
}

/// A character sheet: the row forest plus sheet-wide state.
///
/// The document is the only broadcaster of change notifications. Rows announce
/// their own field changes through it while attached.
#[derive(Debug)]
pub struct Document {
    link: Rc<DocumentLink>,
    rows: Vec<Row>,
    attributes: CharacterAttributes,
    include_kick_boots: bool,
    history: UndoHistory,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_parts(CharacterAttributes::default(), false, Vec::new())
    }

    pub(crate) fn from_parts(
        attributes: CharacterAttributes,
        include_kick_boots: bool,
        mut rows: Vec<Row>,
    ) -> Self {
        let link = Rc::new(DocumentLink::default());
        let weak = Rc::downgrade(&link);
        for row in &mut rows {
            row.parent = None;
            row.attach(&weak);
        }
        Self {
            link,
            rows,
            attributes,
            include_kick_boots,
            history: UndoHistory::default(),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.link.notifier
    }

    pub fn is_modified(&self) -> bool {
        self.link.modified.get()
    }

    pub fn set_modified(&self, modified: bool) {
        self.link.modified.set(modified);
    }

    /// Records that the current state has been written out.
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
        self.set_modified(false);
    }

    /// Broadcasts a document-level change.
    pub fn notify(&self, id: &str) {
        self.link.changed(None, id);
    }

    /// The coalesced "rows were added, removed or moved" notification for a family.
    pub fn notify_list_changed(&self, family: Family) {
        self.notify(family.ids().list_changed);
    }

    /// Runs `f` with notifications suppressed. Changes made inside still mark the
    /// document modified; callers announce the outcome afterwards.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.link.notifier.suppress();
        let result = f(self);
        self.link.notifier.resume();
        result
    }

    // ---- rows ----

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// Every row, depth first.
    pub fn iter(&self) -> RowIter<'_> {
        RowIter::over(&self.rows)
    }

    pub fn find(&self, id: RowId) -> Option<&Row> {
        self.iter().find(|row| row.id() == id)
    }

    pub fn find_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find_map(|row| row.find_mut(id))
    }

    pub fn add_row(&mut self, row: Row) -> RowId {
        let at = self.rows.len();
        self.insert_row(at, row)
    }

    /// Inserts a top-level row. Ids already used in this document are replaced.
    pub fn insert_row(&mut self, index: usize, mut row: Row) -> RowId {
        let mut taken: HashSet<RowId> = self.iter().map(Row::id).collect();
        make_ids_unique(&mut row, &mut taken);
        row.parent = None;
        row.attach(&Rc::downgrade(&self.link));
        let id = row.id();
        let family = row.family();
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
        self.notify_list_changed(family);
        id
    }

    /// Adds `row` beneath the container `parent` and returns the new row's id. When
    /// `parent` is not in this document or does not accept the row, the row is
    /// handed back untouched.
    pub fn add_child_row(&mut self, parent: RowId, mut row: Row) -> Result<RowId, Row> {
        let accepts = match self.find(parent) {
            Some(target) => target.is_container() && target.family() == row.family(),
            None => false,
        };
        if !accepts {
            log::debug!("row {parent} cannot hold a {} row", row.kind().row_type());
            return Err(row);
        }
        let mut taken: HashSet<RowId> = self.iter().map(Row::id).collect();
        make_ids_unique(&mut row, &mut taken);
        let id = row.id();
        let family = row.family();
        match self.find_mut(parent) {
            Some(target) => target.add_child(row),
            None => return Err(row),
        }
        self.notify_list_changed(family);
        Ok(id)
    }

    /// Removes a row (at any depth) and returns it detached.
    pub fn remove_row(&mut self, id: RowId) -> Option<Row> {
        let removed = match self.rows.iter().position(|row| row.id() == id) {
            Some(pos) => {
                let mut row = self.rows.remove(pos);
                row.attach(&Weak::new());
                row
            }
            None => {
                let parent = self.find(id)?.parent()?;
                self.find_mut(parent)?.remove_child(id)?
            }
        };
        self.notify_list_changed(removed.family());
        Some(removed)
    }

    /// Deep-copies `rows` (typically from another document) into this one.
    pub fn add_rows<'r>(&mut self, rows: impl IntoIterator<Item = &'r Row>) -> Vec<RowId> {
        let copies: Vec<Row> = rows.into_iter().map(|row| row.duplicate(true)).collect();
        let mut families: Vec<Family> = Vec::new();
        for row in &copies {
            if !families.contains(&row.family()) {
                families.push(row.family());
            }
        }
        let ids = self.batch(|doc| copies.into_iter().map(|row| doc.add_row(row)).collect());
        for family in families {
            self.notify_list_changed(family);
        }
        ids
    }

    /// Skill and technique items named `name`, the lookup skill defaults use.
    pub fn skills_named(&self, name: &str, specialization: &str) -> Vec<&Row> {
        skills_named(&self.rows, name, specialization)
    }

    /// Ids of all rows containing `text`, in document order.
    pub fn search(&self, text: &str, case: CaseSensitivity) -> Vec<RowId> {
        self.iter()
            .filter(|row| row.contains(text, case))
            .map(Row::id)
            .collect()
    }

    /// Nameable keys used by each of `roots` and their descendants. Rows without
    /// keys are left out.
    pub fn nameables(&self, roots: &[RowId]) -> Vec<(RowId, BTreeSet<String>)> {
        let mut found = Vec::new();
        for root in roots.iter().filter_map(|id| self.find(*id)) {
            for row in root.iter() {
                let mut keys = BTreeSet::new();
                row.fill_with_nameable_keys(&mut keys);
                if !keys.is_empty() {
                    found.push((row.id(), keys));
                }
            }
        }
        found
    }

    pub fn apply_nameables(&mut self, id: RowId, values: &HashMap<String, String>) -> bool {
        self.find_mut(id)
            .is_some_and(|row| row.apply_nameable_keys(values))
    }

    // ---- character ----

    pub fn attributes(&self) -> &CharacterAttributes {
        &self.attributes
    }

    pub fn set_attribute(&mut self, attr: Attribute, value: i32) -> bool {
        let slot = self.attributes.get_mut(attr);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.notify(&format!("{}{}", statics::ID_ATTRIBUTES, attr.key()));
        true
    }

    pub fn set_striking_strength_bonus(&mut self, bonus: i32) -> bool {
        if self.attributes.striking_st_bonus == bonus {
            return false;
        }
        self.attributes.striking_st_bonus = bonus;
        self.notify(&format!("{}striking_st_bonus", statics::ID_ATTRIBUTES));
        true
    }

    pub fn set_encumbrance_level(&mut self, level: i32) -> bool {
        let level = level.clamp(0, MAX_ENCUMBRANCE_LEVEL);
        if self.attributes.encumbrance_level == level {
            return false;
        }
        self.attributes.encumbrance_level = level;
        self.notify(&format!("{}encumbrance_level", statics::ID_ATTRIBUTES));
        true
    }

    pub fn include_kick_boots(&self) -> bool {
        self.include_kick_boots
    }

    pub fn set_include_kick_boots(&mut self, include: bool) -> bool {
        if self.include_kick_boots == include {
            return false;
        }
        self.include_kick_boots = include;
        self.notify(statics::ID_INCLUDE_KICK_BOOTS);
        true
    }

    pub fn resolver(&self) -> Resolver<'_, CharacterAttributes> {
        Resolver::new(&self.rows, &self.attributes)
    }

    pub fn weapon_skill_level(&self, weapon: &WeaponStats) -> i32 {
        self.resolver().weapon_skill_level(weapon)
    }

    // ---- undo ----

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Starts (or extends) an undoable edit of `rows`.
    pub fn begin_edit(&mut self, name: &str, rows: &[RowId]) {
        let before = self.snapshots(rows);
        self.history.begin(name, before);
    }

    /// Ends the edit opened by the matching [`Document::begin_edit`]. Returns whether
    /// an undoable edit was recorded.
    pub fn end_edit(&mut self) -> bool {
        if !self.history.closing() {
            return self.history.end(Vec::new());
        }
        let after = self.snapshots(&self.history.pending_rows());
        self.history.end(after)
    }

    pub fn discard_all_edits(&mut self) {
        self.history.discard_all();
    }

    pub fn undo(&mut self) -> bool {
        let Some(edit) = self.history.step_back() else {
            return false;
        };
        let restore: Vec<(RowId, String)> = edit
            .rows
            .iter()
            .map(|snap| (snap.row, snap.before.clone()))
            .collect();
        self.restore(restore);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(edit) = self.history.step_forward() else {
            return false;
        };
        let restore: Vec<(RowId, String)> = edit
            .rows
            .iter()
            .map(|snap| (snap.row, snap.after.clone()))
            .collect();
        self.restore(restore);
        true
    }

    fn snapshots(&self, ids: &[RowId]) -> Vec<(RowId, String)> {
        ids.iter()
            .filter_map(|id| self.find(*id))
            .map(|row| (row.id(), codec::write_row(row, true, statics::NL_LF)))
            .collect()
    }

    fn restore(&mut self, snapshots: Vec<(RowId, String)>) {
        for (id, snapshot) in snapshots {
            let Some(row) = self.find_mut(id) else {
                log::debug!("undo target {id} is no longer in the document");
                continue;
            };
            if let Err(err) = codec::load_row_into(row, snapshot.as_bytes(), LoadState::for_undo()) {
                log::error!("restoring row {id}: {err}");
                continue;
            }
            row.notify_of_change();
        }
        self.set_modified(!self.history.at_save_point());
    }
}

/// Gives `row` and its subtree fresh ids wherever they collide with `taken`.
fn make_ids_unique(row: &mut Row, taken: &mut HashSet<RowId>) {
    if !taken.insert(row.id) {
        row.id = RowId::new();
        taken.insert(row.id);
        row.adopt_weapons();
    }
    let id = row.id;
    for child in &mut row.children {
        child.parent = Some(id);
        make_ids_unique(child, taken);
    }
}
