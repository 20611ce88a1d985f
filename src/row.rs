use crate::document::DocumentLink;
use crate::kinds::{Family, RowKind};
use crate::prereq::Prereq;
use crate::skill_default::SkillDefault;
use crate::statics;
use crate::weapon::{WeaponEditor, WeaponStats};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Weak;
use std::sync::LazyLock;
use uuid::Uuid;

static NAMEABLE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([^@\r\n]+)@").expect("valid nameable key regex"));

/// Stable identity of a row, independent of where it sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        RowId(Uuid::new_v4())
    }

    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text.trim()).ok().map(RowId)
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sends notifications on behalf of one row. Silent while the row is detached.
pub(crate) struct Emitter<'a> {
    row: RowId,
    link: &'a Weak<DocumentLink>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(row: RowId, link: &'a Weak<DocumentLink>) -> Self {
        Self { row, link }
    }

    pub(crate) fn emit(&self, id: &str) {
        if let Some(link) = self.link.upgrade() {
            link.changed(Some(self.row), id);
        }
    }

    /// Like [`Emitter::emit`], but the document stays unmodified.
    pub(crate) fn announce(&self, id: &str) {
        if let Some(link) = self.link.upgrade() {
            link.announce(Some(self.row), id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

/// Fields every row carries regardless of its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCommon {
    pub open: bool,
    pub categories: BTreeSet<String>,
    pub satisfied: bool,
    pub unsatisfied_reason: String,
    pub notes: String,
    pub prereqs: Vec<Prereq>,
}

impl Default for RowCommon {
    fn default() -> Self {
        Self {
            open: true,
            categories: BTreeSet::new(),
            satisfied: true,
            unsatisfied_reason: String::new(),
            notes: String::new(),
            prereqs: Vec::new(),
        }
    }
}

/// Categories are trimmed, de-duplicated and kept sorted; blanks are dropped.
pub(crate) fn normalize_categories<I, S>(categories: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    categories
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// One node of a character sheet's row tree.
///
/// Rows own their children outright. The parent is remembered by id only, and the
/// owning document is reached through a weak link that is empty while the row is
/// detached.
#[derive(Debug)]
pub struct Row {
    pub(crate) id: RowId,
    pub(crate) parent: Option<RowId>,
    pub(crate) children: Vec<Row>,
    pub(crate) container: bool,
    pub(crate) common: RowCommon,
    pub(crate) kind: RowKind,
    pub(crate) link: Weak<DocumentLink>,
}

impl Row {
    pub(crate) fn bare(id: RowId, kind: RowKind, container: bool) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            container,
            common: RowCommon::default(),
            kind,
            link: Weak::new(),
        }
    }

    /// A new detached row. Techniques cannot be containers.
    pub fn new(kind: RowKind, container: bool) -> Self {
        let allowed = !container || kind.can_be_container();
        debug_assert!(allowed, "{} rows cannot be containers", kind.row_type());
        if !allowed {
            log::error!("{} rows cannot be containers; creating an item", kind.row_type());
        }
        let container = container && allowed;
        let mut row = Self::bare(RowId::new(), kind, container);
        row.adopt_weapons();
        row
    }

    pub fn item(kind: RowKind) -> Self {
        Self::new(kind, false)
    }

    pub fn container(kind: RowKind) -> Self {
        Self::new(kind, true)
    }

    pub(crate) fn adopt_weapons(&mut self) {
        let id = self.id;
        if let Some(weapons) = self.kind.weapons_mut() {
            for weapon in weapons {
                weapon.set_owner(Some(id));
            }
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn parent(&self) -> Option<RowId> {
        self.parent
    }

    pub fn children(&self) -> &[Row] {
        &self.children
    }

    /// Children can be edited and reordered in place but not added or removed here.
    pub fn children_mut(&mut self) -> &mut [Row] {
        &mut self.children
    }

    pub fn is_container(&self) -> bool {
        self.container
    }

    pub fn kind(&self) -> &RowKind {
        &self.kind
    }

    /// Direct access to the payload. Nothing is announced; follow up with
    /// [`Row::notify_of_change`] once done.
    pub fn kind_mut(&mut self) -> &mut RowKind {
        &mut self.kind
    }

    pub fn family(&self) -> Family {
        self.kind.family()
    }

    pub fn common(&self) -> &RowCommon {
        &self.common
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn is_open(&self) -> bool {
        self.common.open
    }

    pub fn notes(&self) -> &str {
        &self.common.notes
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.common.categories
    }

    pub fn prereqs(&self) -> &[Prereq] {
        &self.common.prereqs
    }

    pub fn is_satisfied(&self) -> bool {
        self.common.satisfied
    }

    pub fn unsatisfied_reason(&self) -> &str {
        &self.common.unsatisfied_reason
    }

    pub fn weapons(&self) -> &[WeaponStats] {
        self.kind.weapons()
    }

    /// Whether this row is currently part of a live document.
    pub fn is_attached(&self) -> bool {
        self.link.strong_count() > 0
    }

    // ---- tree ----

    pub fn add_child(&mut self, child: Row) {
        let at = self.children.len();
        self.insert_child(at, child);
    }

    /// Inserts `child` at `index` (clamped to the end). Only containers accept children,
    /// and only of their own family.
    pub fn insert_child(&mut self, index: usize, mut child: Row) {
        let accepted = self.container && child.family() == self.family();
        debug_assert!(
            accepted,
            "cannot add a {} row to {} {}",
            child.kind.row_type(),
            self.kind.row_type(),
            if self.container { "container" } else { "item" }
        );
        if !accepted {
            log::error!(
                "ignoring attempt to add a {} row to {} row {}",
                child.kind.row_type(),
                self.kind.row_type(),
                self.id
            );
            return;
        }
        child.parent = Some(self.id);
        child.attach(&self.link);
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    /// Removes and returns the direct child with `id`, detached.
    pub fn remove_child(&mut self, id: RowId) -> Option<Row> {
        let pos = self.children.iter().position(|c| c.id == id)?;
        let mut child = self.children.remove(pos);
        child.parent = None;
        child.attach(&Weak::new());
        Some(child)
    }

    /// Points this row and its whole subtree at `link`.
    pub(crate) fn attach(&mut self, link: &Weak<DocumentLink>) {
        self.link = link.clone();
        for child in &mut self.children {
            child.attach(link);
        }
    }

    /// This row followed by all of its descendants, depth first.
    pub fn iter(&self) -> RowIter<'_> {
        RowIter { stack: vec![self] }
    }

    pub fn find(&self, id: RowId) -> Option<&Row> {
        self.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: RowId) -> Option<&mut Row> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// A detached copy with a fresh id. A deep copy brings the children along, in order.
    pub fn duplicate(&self, deep: bool) -> Row {
        let mut row = Self::bare(RowId::new(), self.kind.clone(), self.container);
        row.common = self.common.clone();
        row.adopt_weapons();
        if deep {
            for child in &self.children {
                let mut copy = child.duplicate(true);
                copy.parent = Some(row.id);
                row.children.push(copy);
            }
        }
        row
    }

    /// Deep structural equality. Ids, satisfaction and document attachment are ignored.
    pub fn is_equivalent_to(&self, other: &Row) -> bool {
        // Only containers persist their open state.
        self.container == other.container
            && (!self.container || self.common.open == other.common.open)
            && self.common.categories == other.common.categories
            && self.common.notes == other.common.notes
            && self.common.prereqs == other.common.prereqs
            && self.kind.equivalent(&other.kind)
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.is_equivalent_to(b))
    }

    // ---- notifications ----

    pub fn notify_single(&self, id: &str) {
        Emitter::new(self.id, &self.link).emit(id);
    }

    /// Announces that something about this row changed, under its family prefix.
    pub fn notify_of_change(&self) {
        self.notify_single(self.family().ids().prefix);
    }

    fn changed(&self, changed: bool, id: &str) -> bool {
        if changed {
            self.notify_single(id);
        }
        changed
    }

    // ---- shared field mutators ----

    pub fn set_open(&mut self, open: bool) -> bool {
        let changed = replace_if_changed(&mut self.common.open, open);
        self.changed(changed, self.family().ids().open)
    }

    pub fn set_notes(&mut self, notes: &str) -> bool {
        let changed = set_text(&mut self.common.notes, notes);
        self.changed(changed, self.family().ids().notes)
    }

    pub fn set_categories<I, S>(&mut self, categories: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let changed = replace_if_changed(
            &mut self.common.categories,
            normalize_categories(categories),
        );
        self.changed(changed, self.family().ids().categories)
    }

    pub fn set_prereqs(&mut self, prereqs: Vec<Prereq>) -> bool {
        let changed = replace_if_changed(&mut self.common.prereqs, prereqs);
        self.changed(changed, self.family().ids().prereqs)
    }

    /// Records the outcome of a prerequisite check. `reason` is ignored when satisfied.
    /// Satisfaction is derived, so listeners hear about it but the document is not
    /// marked modified.
    pub fn set_satisfied(&mut self, satisfied: bool, reason: &str) -> bool {
        let reason = if satisfied { statics::EN_EMPTY } else { reason };
        let changed = replace_if_changed(&mut self.common.satisfied, satisfied)
            | set_text(&mut self.common.unsatisfied_reason, reason);
        if changed {
            Emitter::new(self.id, &self.link).announce(self.family().ids().satisfied);
        }
        changed
    }

    // ---- kind field mutators ----

    /// Sets the display name: a note's text or an equipment description.
    pub fn set_name(&mut self, name: &str) -> bool {
        let (changed, id) = match &mut self.kind {
            RowKind::Note(d) => (set_text(&mut d.text, name), statics::NOTE_ID_TEXT),
            RowKind::Trait(d) => (set_text(&mut d.name, name), statics::TRAIT_ID_NAME),
            RowKind::Skill(d) => (set_text(&mut d.name, name), statics::SKILL_ID_NAME),
            RowKind::Technique(d) => (set_text(&mut d.name, name), statics::SKILL_ID_NAME),
            RowKind::Spell(d) => (set_text(&mut d.name, name), statics::SPELL_ID_NAME),
            RowKind::Equipment(d) => (
                set_text(&mut d.description, name),
                statics::EQUIPMENT_ID_DESCRIPTION,
            ),
        };
        self.changed(changed, id)
    }

    /// Points spent on the row. For traits these are the base points.
    pub fn set_points(&mut self, points: i32) -> bool {
        let (changed, id) = match &mut self.kind {
            RowKind::Trait(d) => (
                replace_if_changed(&mut d.base_points, points),
                statics::TRAIT_ID_POINTS,
            ),
            RowKind::Skill(d) => (
                replace_if_changed(&mut d.points, points.max(0)),
                statics::SKILL_ID_POINTS,
            ),
            RowKind::Technique(d) => (
                replace_if_changed(&mut d.points, points.max(0)),
                statics::SKILL_ID_POINTS,
            ),
            RowKind::Spell(d) => (
                replace_if_changed(&mut d.points, points.max(0)),
                statics::SPELL_ID_POINTS,
            ),
            RowKind::Note(_) | RowKind::Equipment(_) => return false,
        };
        self.changed(changed, id)
    }

    pub fn set_levels(&mut self, levels: Option<i32>) -> bool {
        let RowKind::Trait(d) = &mut self.kind else {
            return false;
        };
        let changed = replace_if_changed(&mut d.levels, levels.map(|l| l.max(0)));
        self.changed(changed, statics::TRAIT_ID_LEVELS)
    }

    pub fn set_specialization(&mut self, specialization: &str) -> bool {
        let changed = match &mut self.kind {
            RowKind::Skill(d) => set_text(&mut d.specialization, specialization),
            _ => return false,
        };
        self.changed(changed, statics::SKILL_ID_SPECIALIZATION)
    }

    pub fn set_difficulty(&mut self, difficulty: crate::kinds::Difficulty) -> bool {
        let changed = match &mut self.kind {
            RowKind::Skill(d) => replace_if_changed(&mut d.difficulty, difficulty),
            _ => return false,
        };
        self.changed(changed, statics::SKILL_ID_DIFFICULTY)
    }

    /// Replaces a skill's defaults, or a technique's base when exactly one is given.
    pub fn set_defaults(&mut self, defaults: Vec<SkillDefault>) -> bool {
        let changed = match &mut self.kind {
            RowKind::Skill(d) => replace_if_changed(&mut d.defaults, defaults),
            RowKind::Technique(d) => match <[SkillDefault; 1]>::try_from(defaults) {
                Ok([def]) => replace_if_changed(&mut d.default, def),
                Err(_) => return false,
            },
            _ => return false,
        };
        self.changed(changed, statics::SKILL_ID_DEFAULTS)
    }

    pub fn set_quantity(&mut self, quantity: i32) -> bool {
        let RowKind::Equipment(d) = &mut self.kind else {
            return false;
        };
        let changed = replace_if_changed(&mut d.quantity, quantity.max(0));
        self.changed(changed, statics::EQUIPMENT_ID_QUANTITY)
    }

    pub fn set_equipped(&mut self, equipped: bool) -> bool {
        let RowKind::Equipment(d) = &mut self.kind else {
            return false;
        };
        let changed = replace_if_changed(&mut d.equipped, equipped);
        self.changed(changed, statics::EQUIPMENT_ID_EQUIPPED)
    }

    /// Adds a weapon owned by this row. Notes carry no weapons.
    pub fn add_weapon(&mut self, mut weapon: WeaponStats) -> bool {
        let id = self.id;
        let Some(weapons) = self.kind.weapons_mut() else {
            return false;
        };
        weapon.set_owner(Some(id));
        weapons.push(weapon);
        self.notify_single(statics::WEAPON_ID_LIST_CHANGED);
        true
    }

    pub fn remove_weapon(&mut self, index: usize) -> Option<WeaponStats> {
        let weapons = self.kind.weapons_mut()?;
        if index >= weapons.len() {
            return None;
        }
        let mut weapon = weapons.remove(index);
        weapon.set_owner(None);
        self.notify_single(statics::WEAPON_ID_LIST_CHANGED);
        Some(weapon)
    }

    /// Editor for one of this row's weapons; its changes are announced as this row's.
    pub fn weapon_mut(&mut self, index: usize) -> Option<WeaponEditor<'_>> {
        let weapon = self.kind.weapons_mut()?.get_mut(index)?;
        Some(WeaponEditor::new(weapon, Emitter::new(self.id, &self.link)))
    }

    // ---- search & nameables ----

    /// Substring search over the row's own text: kind fields, notes and categories.
    pub fn contains(&self, text: &str, case: CaseSensitivity) -> bool {
        let matches = |hay: &str| match case {
            CaseSensitivity::Sensitive => hay.contains(text),
            CaseSensitivity::Insensitive => hay.to_lowercase().contains(&text.to_lowercase()),
        };
        self.kind.search_texts().into_iter().any(matches)
            || matches(&self.common.notes)
            || self.common.categories.iter().any(|c| matches(c))
    }

    /// Adds every `@Key@` placeholder found in this row's text to `keys`.
    pub fn fill_with_nameable_keys(&self, keys: &mut BTreeSet<String>) {
        let texts = self
            .kind
            .nameable_texts()
            .into_iter()
            .chain(std::iter::once(self.common.notes.as_str()));
        for text in texts {
            extract_nameables(text, keys);
        }
    }

    /// Substitutes the supplied values for `@Key@` placeholders. Keys without a value
    /// are left as they are.
    pub fn apply_nameable_keys(&mut self, values: &HashMap<String, String>) -> bool {
        let mut changed = false;
        for text in self.kind.nameable_texts_mut() {
            changed |= apply_nameables(text, values);
        }
        if let Some(weapons) = self.kind.weapons_mut() {
            for text in weapons.iter_mut().flat_map(WeaponStats::nameable_texts_mut) {
                changed |= apply_nameables(text, values);
            }
        }
        changed |= apply_nameables(&mut self.common.notes, values);
        if changed {
            self.notify_of_change();
        }
        changed
    }
}

/// Depth-first walk over a row and its descendants.
pub struct RowIter<'a> {
    stack: Vec<&'a Row>,
}

impl<'a> RowIter<'a> {
    pub(crate) fn over(rows: &'a [Row]) -> Self {
        Self {
            stack: rows.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a Row;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.stack.pop()?;
        self.stack.extend(row.children.iter().rev());
        Some(row)
    }
}

/// Skill and technique items named `name` (ignoring case). When `specialization` is
/// non-empty it must match too.
pub fn skills_named<'a>(rows: &'a [Row], name: &str, specialization: &str) -> Vec<&'a Row> {
    RowIter::over(rows)
        .filter(|row| !row.container)
        .filter(|row| match &row.kind {
            RowKind::Skill(d) => {
                d.name.eq_ignore_ascii_case(name)
                    && (specialization.is_empty()
                        || d.specialization.eq_ignore_ascii_case(specialization))
            }
            RowKind::Technique(d) => d.name.eq_ignore_ascii_case(name),
            _ => false,
        })
        .collect()
}

pub(crate) fn extract_nameables(text: &str, keys: &mut BTreeSet<String>) {
    for cap in NAMEABLE_KEY.captures_iter(text) {
        if let Some(key) = cap.get(1) {
            keys.insert(key.as_str().to_string());
        }
    }
}

pub(crate) fn apply_nameables(text: &mut String, values: &HashMap<String, String>) -> bool {
    if !text.contains('@') {
        return false;
    }
    let replaced = NAMEABLE_KEY.replace_all(text, |cap: &regex::Captures<'_>| {
        values
            .get(&cap[1])
            .cloned()
            .unwrap_or_else(|| cap[0].to_string())
    });
    if replaced == text.as_str() {
        return false;
    }
    *text = replaced.into_owned();
    true
}

fn replace_if_changed<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}

fn set_text(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    *field = value.to_string();
    true
}

#[cfg(test)]
mod tests {
    use super::{CaseSensitivity, Row, RowId, skills_named};
    use crate::kinds::{NoteData, RowKind, SkillData, TechniqueData};
    use crate::skill_default::SkillDefault;
    use crate::weapon::WeaponStats;
    use std::collections::{BTreeSet, HashMap};

    fn skill(name: &str) -> Row {
        Row::item(RowKind::Skill(SkillData {
            name: name.to_string(),
            ..Default::default()
        }))
    }

    #[test]
    fn children_track_their_parent() {
        let mut group = Row::container(RowKind::Skill(SkillData::default()));
        let a = skill("Axe/Mace");
        let b = skill("Brawling");
        let a_id = a.id();
        group.add_child(a);
        group.insert_child(0, b);
        assert_eq!(group.children().len(), 2);
        assert_eq!(group.children()[0].name(), "Brawling");
        assert!(group.children().iter().all(|c| c.parent() == Some(group.id())));

        let removed = group.remove_child(a_id).unwrap();
        assert_eq!(removed.parent(), None);
        assert_eq!(group.children().len(), 1);
        assert!(group.remove_child(a_id).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn items_refuse_children_in_debug_builds() {
        let mut item = skill("Judo");
        item.add_child(skill("Karate"));
    }

    #[test]
    fn duplicate_is_equivalent_but_distinct() {
        let mut group = Row::container(RowKind::Skill(SkillData::default()));
        group.set_notes("combat");
        let mut child = skill("Broadsword");
        child.add_weapon(WeaponStats::melee());
        group.add_child(child);

        let copy = group.duplicate(true);
        assert_ne!(copy.id(), group.id());
        assert!(copy.is_equivalent_to(&group));
        assert!(group.is_equivalent_to(&copy));
        let copied_child = &copy.children()[0];
        assert_ne!(copied_child.id(), group.children()[0].id());
        assert_eq!(copied_child.parent(), Some(copy.id()));
        assert_eq!(copied_child.weapons()[0].owner(), Some(copied_child.id()));

        let shallow = group.duplicate(false);
        assert!(shallow.children().is_empty());
        assert!(!shallow.is_equivalent_to(&group));
    }

    #[test]
    fn equivalence_ignores_satisfaction() {
        let a = skill("Stealth");
        let mut b = a.duplicate(false);
        b.set_satisfied(false, "needs DX 12");
        assert!(a.is_equivalent_to(&b));
        b.set_points(4);
        assert!(!a.is_equivalent_to(&b));
    }

    #[test]
    fn detached_mutation_updates_field() {
        let mut row = Row::item(RowKind::Note(NoteData::default()));
        assert!(!row.is_attached());
        assert!(row.set_name("Remember the milk"));
        assert!(!row.set_name("Remember the milk"));
        assert_eq!(row.name(), "Remember the milk");
        assert!(!row.set_points(3));
    }

    #[test]
    fn categories_are_normalized() {
        let mut row = skill("Climbing");
        assert!(row.set_categories(["Outdoor", " Athletic ", "", "Outdoor"]));
        let expected: Vec<&str> = vec!["Athletic", "Outdoor"];
        assert_eq!(row.categories().iter().map(String::as_str).collect::<Vec<_>>(), expected);
        assert!(!row.set_categories(["Athletic", "Outdoor"]));
    }

    #[test]
    fn contains_searches_kind_notes_and_categories() {
        let mut row = skill("Lockpicking");
        row.set_notes("Thief kit");
        row.set_categories(["Criminal"]);
        assert!(row.contains("lock", CaseSensitivity::Insensitive));
        assert!(!row.contains("lock", CaseSensitivity::Sensitive));
        assert!(row.contains("kit", CaseSensitivity::Sensitive));
        assert!(row.contains("crim", CaseSensitivity::Insensitive));
        assert!(!row.contains("sword", CaseSensitivity::Insensitive));
    }

    #[test]
    fn nameable_keys_are_collected_and_applied() {
        let mut row = Row::item(RowKind::Skill(SkillData {
            name: "Hobby (@Subject@)".to_string(),
            defaults: vec![SkillDefault::skill("@Subject@", "", -2)],
            ..Default::default()
        }));
        row.set_notes("See @Book@");
        let mut keys = BTreeSet::new();
        row.fill_with_nameable_keys(&mut keys);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["Book", "Subject"]);

        let values = HashMap::from([("Subject".to_string(), "Chess".to_string())]);
        assert!(row.apply_nameable_keys(&values));
        assert_eq!(row.name(), "Hobby (Chess)");
        assert_eq!(row.notes(), "See @Book@");
        let RowKind::Skill(data) = row.kind() else {
            panic!("not a skill");
        };
        assert_eq!(data.defaults[0].name, "Chess");
        assert!(!row.apply_nameable_keys(&values));
    }

    #[test]
    fn skills_named_matches_case_insensitively() {
        let mut pistol = skill("Guns");
        pistol.set_specialization("Pistol");
        let rows = vec![
            pistol,
            skill("guns"),
            Row::item(RowKind::Technique(TechniqueData {
                name: "GUNS".to_string(),
                ..Default::default()
            })),
            skill("Bow"),
        ];
        assert_eq!(skills_named(&rows, "Guns", "").len(), 3);
        assert_eq!(skills_named(&rows, "Guns", "pistol").len(), 2);
        assert!(skills_named(&rows, "Sling", "").is_empty());
    }

    #[test]
    fn row_ids_parse_back() {
        let id = RowId::new();
        assert_eq!(RowId::parse(&id.to_string()), Some(id));
        assert_eq!(RowId::parse("not-an-id"), None);
    }
}
