//! Reading and writing rows and whole sheets as XML.
//!
//! Writes are deterministic: the same in-memory state always produces the same
//! bytes. Reads are forgiving about leaf values (bad numbers and unknown tokens
//! fall back to defaults, unknown elements are skipped) but fail on broken XML.

use crate::document::Document;
use crate::kinds::RowKind;
use crate::prereq::Prereq;
use crate::resolve::{CharacterAttributes, DEFAULT_ATTRIBUTE, MAX_ENCUMBRANCE_LEVEL};
use crate::row::{Row, RowId, normalize_categories};
use crate::skill_default::Attribute;
use crate::statics;
use crate::weapon::WeaponStats;
use crate::xml::{CodecError, Tag, XmlReader, XmlWriter, parse_i32};
use std::collections::HashSet;

const ATTR_STRIKING_ST_BONUS: &str = "striking_st_bonus";
const ATTR_ENCUMBRANCE_LEVEL: &str = "encumbrance_level";

/// Context threaded through a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadState {
    /// Format version of the enclosing document.
    pub data_version: i32,
    /// Restoring an undo snapshot: the row's own fields only, children untouched.
    pub for_undo: bool,
}

impl LoadState {
    pub fn new(data_version: i32) -> Self {
        Self {
            data_version,
            for_undo: false,
        }
    }

    pub fn for_undo() -> Self {
        Self {
            data_version: statics::CHARACTER_VERSION,
            for_undo: true,
        }
    }
}

impl Default for LoadState {
    fn default() -> Self {
        Self::new(statics::CHARACTER_VERSION)
    }
}

// ---- rows ----

/// Serializes `row` (and its subtree, unless `for_undo`).
pub fn write_row(row: &Row, for_undo: bool, newline: &'static str) -> String {
    let mut out = XmlWriter::new(newline);
    write_row_to(&mut out, row, for_undo);
    out.finish()
}

pub(crate) fn write_row_to(out: &mut XmlWriter, row: &Row, for_undo: bool) {
    let tag = row.kind.tag(row.container);
    let mut attrs = vec![
        (statics::ATTR_VERSION, row.kind.current_version().to_string()),
        (statics::ATTR_ID, row.id.to_string()),
    ];
    if row.container {
        let open = if row.common.open { "yes" } else { "no" };
        attrs.push((statics::ATTR_OPEN, open.to_string()));
    }
    out.start_tag(tag, &attrs);

    if !row.common.categories.is_empty() {
        out.start_tag(statics::TAG_CATEGORIES, &[]);
        for category in &row.common.categories {
            out.simple_tag(statics::TAG_CATEGORY, category);
        }
        out.end_tag(statics::TAG_CATEGORIES);
    }
    out.simple_tag_not_empty(statics::TAG_NOTES, &row.common.notes);
    Prereq::save_list(out, &row.common.prereqs);

    row.kind.save_self(out);
    for weapon in row.kind.weapons() {
        weapon.save(out);
    }

    if !for_undo {
        for child in &row.children {
            write_row_to(out, child, false);
        }
    }
    out.end_tag(tag);
}

/// Reads a single row element (with its subtree) into a new detached row.
pub fn read_row(bytes: &[u8], state: LoadState) -> Result<Row, CodecError> {
    let mut reader = XmlReader::new(bytes);
    let root = reader.root()?;
    read_row_from(&mut reader, &root, state, &mut HashSet::new())
}

/// Reloads `row` in place from a serialized copy of itself, keeping its id.
///
/// With [`LoadState::for_undo`] nested rows in the input are ignored and the row's
/// current children stay where they are; otherwise the children are replaced.
pub fn load_row_into(row: &mut Row, bytes: &[u8], state: LoadState) -> Result<(), CodecError> {
    let mut reader = XmlReader::new(bytes);
    let root = reader.root()?;
    let expected = row.kind.tag(row.container);
    if root.name != expected {
        return Err(CodecError::UnexpectedRoot {
            expected: expected.to_string(),
            found: root.name,
        });
    }
    let mut ids = HashSet::from([row.id]);
    load_body(&mut reader, &root, row, state, &mut ids)?;
    let link = row.link.clone();
    row.attach(&link);
    Ok(())
}

pub(crate) fn read_row_from(
    reader: &mut XmlReader<'_>,
    tag: &Tag,
    state: LoadState,
    ids: &mut HashSet<RowId>,
) -> Result<Row, CodecError> {
    let Some(kind) = RowKind::for_tag(&tag.name) else {
        return Err(CodecError::NotARow(tag.name.clone()));
    };
    let container = RowKind::is_container_tag(&tag.name);

    let id = match tag.attr(statics::ATTR_ID).map(|text| (text, RowId::parse(text))) {
        Some((_, Some(id))) if !ids.contains(&id) => id,
        Some((text, _)) => {
            log::debug!("<{}> id {text:?} is malformed or reused; assigning a new one", tag.name);
            RowId::new()
        }
        None => RowId::new(),
    };
    ids.insert(id);

    let mut row = Row::bare(id, kind, container);
    load_body(reader, tag, &mut row, state, ids)?;
    Ok(row)
}

fn load_body(
    reader: &mut XmlReader<'_>,
    tag: &Tag,
    row: &mut Row,
    state: LoadState,
    ids: &mut HashSet<RowId>,
) -> Result<(), CodecError> {
    let current = row.kind.current_version();
    let version = tag.attr_i32(statics::ATTR_VERSION).unwrap_or({
        if state.data_version < statics::CHARACTER_VERSION {
            1
        } else {
            current
        }
    });
    if version > current {
        log::debug!("<{}> version {version} is newer than {current}", tag.name);
    }

    // Satisfaction is derived state and survives a reload.
    row.common.open = !row.container || tag.attr_bool(statics::ATTR_OPEN).unwrap_or(true);
    row.common.categories.clear();
    row.common.notes.clear();
    row.common.prereqs.clear();
    row.kind.reset();
    if !state.for_undo {
        row.children.clear();
    }
    if tag.empty {
        return Ok(());
    }

    let family = row.family();
    while let Some(child) = reader.next_child(&tag.name)? {
        match child.name.as_str() {
            statics::TAG_CATEGORIES => row.common.categories = read_categories(reader, &child)?,
            statics::TAG_NOTES => row.common.notes = reader.read_text(&child)?,
            statics::TAG_PREREQS => row.common.prereqs = Prereq::load_list(reader, &child)?,
            statics::TAG_MELEE_WEAPON | statics::TAG_RANGED_WEAPON if row.kind.has_weapons() => {
                let weapon = WeaponStats::load(reader, &child, Some(row.id))?;
                if let Some(weapons) = row.kind.weapons_mut() {
                    weapons.push(weapon);
                }
            }
            name if family.accepts_tag(name) => {
                if state.for_undo {
                    reader.skip(&child)?;
                } else if !row.container {
                    log::debug!("dropping <{name}> nested in non-container <{}>", tag.name);
                    reader.skip(&child)?;
                } else {
                    let mut nested = read_row_from(reader, &child, state, ids)?;
                    nested.parent = Some(row.id);
                    row.children.push(nested);
                }
            }
            name => {
                if !row.kind.load_sub_element(reader, &child, version)? {
                    log::trace!("skipping unknown <{name}> in <{}>", tag.name);
                    reader.skip(&child)?;
                }
            }
        }
    }
    Ok(())
}

fn read_categories(
    reader: &mut XmlReader<'_>,
    tag: &Tag,
) -> Result<std::collections::BTreeSet<String>, CodecError> {
    let mut found = Vec::new();
    if tag.empty {
        return Ok(normalize_categories(found));
    }
    while let Some(child) = reader.next_child(&tag.name)? {
        if child.name == statics::TAG_CATEGORY {
            found.push(reader.read_text(&child)?);
        } else {
            reader.skip(&child)?;
        }
    }
    Ok(normalize_categories(found))
}

// ---- documents ----

fn read_attributes(tag: &Tag) -> CharacterAttributes {
    let mut attrs = CharacterAttributes::default();
    for attr in Attribute::ALL {
        if let Some(text) = tag.attr(attr.key()) {
            *attrs.get_mut(attr) = parse_i32(text, DEFAULT_ATTRIBUTE, i32::MIN, i32::MAX);
        }
    }
    if let Some(text) = tag.attr(ATTR_STRIKING_ST_BONUS) {
        attrs.striking_st_bonus = parse_i32(text, 0, i32::MIN, i32::MAX);
    }
    if let Some(text) = tag.attr(ATTR_ENCUMBRANCE_LEVEL) {
        attrs.encumbrance_level = parse_i32(text, 0, 0, MAX_ENCUMBRANCE_LEVEL);
    }
    attrs
}

fn attribute_pairs(attrs: &CharacterAttributes) -> Vec<(&'static str, String)> {
    let mut pairs: Vec<(&'static str, String)> = Attribute::ALL
        .into_iter()
        .map(|attr| (attr.key(), attrs.get(attr).to_string()))
        .collect();
    pairs.push((ATTR_STRIKING_ST_BONUS, attrs.striking_st_bonus.to_string()));
    pairs.push((ATTR_ENCUMBRANCE_LEVEL, attrs.encumbrance_level.to_string()));
    pairs
}

/// Serializes a whole sheet, XML declaration included.
pub fn write_document(doc: &Document, newline: &'static str) -> String {
    let mut out = XmlWriter::with_declaration(newline);
    out.start_tag(
        statics::TAG_CHARACTER,
        &[(statics::ATTR_VERSION, statics::CHARACTER_VERSION.to_string())],
    );
    out.empty_tag(statics::TAG_ATTRIBUTES, &attribute_pairs(doc.attributes()));
    out.flag_tag(statics::TAG_INCLUDE_KICK_BOOTS, doc.include_kick_boots());
    out.start_tag(statics::TAG_ROWS, &[]);
    for row in doc.rows() {
        write_row_to(&mut out, row, false);
    }
    out.end_tag(statics::TAG_ROWS);
    out.end_tag(statics::TAG_CHARACTER);
    out.finish()
}

/// Reads a whole sheet. Version 1 sheets kept the attributes on the root element
/// and their rows directly beneath it; both layouts are accepted.
pub fn read_document(bytes: &[u8]) -> Result<Document, CodecError> {
    let mut reader = XmlReader::new(bytes);
    let root = reader.root()?;
    if root.name != statics::TAG_CHARACTER {
        return Err(CodecError::UnexpectedRoot {
            expected: statics::TAG_CHARACTER.to_string(),
            found: root.name,
        });
    }
    let data_version = root.attr_i32(statics::ATTR_VERSION).unwrap_or(1);
    if data_version > statics::CHARACTER_VERSION {
        log::debug!(
            "sheet version {data_version} is newer than {}",
            statics::CHARACTER_VERSION
        );
    }
    let state = LoadState::new(data_version);

    let mut attributes = if data_version < statics::CHARACTER_VERSION {
        read_attributes(&root)
    } else {
        CharacterAttributes::default()
    };
    let mut include_kick_boots = false;
    let mut rows = Vec::new();
    let mut ids = HashSet::new();

    if !root.empty {
        while let Some(child) = reader.next_child(&root.name)? {
            match child.name.as_str() {
                statics::TAG_ATTRIBUTES => {
                    attributes = read_attributes(&child);
                    reader.skip(&child)?;
                }
                statics::TAG_INCLUDE_KICK_BOOTS => {
                    include_kick_boots = true;
                    reader.skip(&child)?;
                }
                statics::TAG_ROWS => {
                    if child.empty {
                        continue;
                    }
                    while let Some(entry) = reader.next_child(&child.name)? {
                        if RowKind::for_tag(&entry.name).is_some() {
                            rows.push(read_row_from(&mut reader, &entry, state, &mut ids)?);
                        } else {
                            log::trace!("skipping unknown <{}> in <rows>", entry.name);
                            reader.skip(&entry)?;
                        }
                    }
                }
                name if RowKind::for_tag(name).is_some() => {
                    rows.push(read_row_from(&mut reader, &child, state, &mut ids)?);
                }
                name => {
                    log::trace!("skipping unknown <{name}> in <{}>", root.name);
                    reader.skip(&child)?;
                }
            }
        }
    }

    log::debug!("read sheet version {data_version} with {} top-level rows", rows.len());
    Ok(Document::from_parts(attributes, include_kick_boots, rows))
}
