//! Variant payloads for the rows of a character sheet.
//!
//! Each payload knows its own persisted tags, format version and fields. The
//! generic row machinery in `row.rs` and `codec.rs` handles everything they share.

use crate::skill_default::{Attribute, SkillDefault};
use crate::statics;
use crate::weapon::WeaponStats;
use crate::xml::{CodecError, Tag, XmlReader, XmlWriter, parse_f64};
use std::fmt;

/// Per-variant persistence and comparison hooks.
pub(crate) trait Variant: Default + PartialEq {
    const CURRENT_VERSION: i32;
    const TAG: &'static str;
    const CONTAINER_TAG: &'static str;

    /// Reads one sub-element. Returns `false` when the tag is not one of ours,
    /// leaving it for the shared fields (or to be skipped).
    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        version: i32,
    ) -> Result<bool, CodecError>;

    /// Writes the variant-specific fields, in a fixed order.
    fn save_self(&self, out: &mut XmlWriter);

    /// Structural comparison of the variant fields.
    fn equivalent(&self, other: &Self) -> bool {
        self == other
    }
}

/// Text a row contributes to a search.
pub trait Searchable {
    fn search_texts(&self) -> Vec<&str>;
}

/// Text fields that may carry `@Key@` nameable placeholders.
pub(crate) trait Nameable {
    fn nameable_texts(&self) -> Vec<&str>;
    fn nameable_texts_mut(&mut self) -> Vec<&mut String>;
}

/// How hard a skill is to learn; sets the base offset from the controlling attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Average,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "e",
            Difficulty::Average => "a",
            Difficulty::Hard => "h",
            Difficulty::VeryHard => "vh",
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "e" => Difficulty::Easy,
            "a" => Difficulty::Average,
            "h" => Difficulty::Hard,
            "vh" => Difficulty::VeryHard,
            other => {
                log::trace!("unknown difficulty {other:?}; using average");
                Difficulty::Average
            }
        }
    }

    pub fn base_relative_level(self) -> i32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Average => -1,
            Difficulty::Hard => -2,
            Difficulty::VeryHard => -3,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_ascii_uppercase())
    }
}

/// "dx/h" style pair used by skills and spells.
fn format_attr_difficulty(attr: Attribute, difficulty: Difficulty) -> String {
    format!("{}/{}", attr.key(), difficulty.key())
}

fn parse_attr_difficulty(text: &str, attr_default: Attribute) -> (Attribute, Difficulty) {
    match text.split_once('/') {
        Some((attr, diff)) => (
            Attribute::from_key(attr).unwrap_or(attr_default),
            Difficulty::from_key(diff),
        ),
        None => (attr_default, Difficulty::from_key(text)),
    }
}

fn parse_optional_i32(text: &str, min: i32, max: i32) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<i64>()
        .ok()
        .map(|v| v.clamp(min as i64, max as i64) as i32)
}

/// Leading numeric portion of strings such as "3 lb" or "1.5kg".
fn parse_leading_number(text: &str) -> f64 {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_digit() || *ch == '.' || *ch == '-'))
        .map_or(text.len(), |(i, _)| i);
    parse_f64(&text[..end], 0.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteData {
    pub text: String,
}

impl Variant for NoteData {
    const CURRENT_VERSION: i32 = 1;
    const TAG: &'static str = statics::TAG_NOTE;
    const CONTAINER_TAG: &'static str = statics::TAG_NOTE_CONTAINER;

    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        _version: i32,
    ) -> Result<bool, CodecError> {
        if tag.name == "text" {
            self.text = reader.read_text(tag)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn save_self(&self, out: &mut XmlWriter) {
        out.simple_tag_not_empty("text", &self.text);
    }
}

impl Searchable for NoteData {
    fn search_texts(&self) -> Vec<&str> {
        vec![&self.text]
    }
}

impl Nameable for NoteData {
    fn nameable_texts(&self) -> Vec<&str> {
        vec![&self.text]
    }

    fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.text]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitData {
    pub name: String,
    /// `None` for traits that are not leveled.
    pub levels: Option<i32>,
    pub base_points: i32,
    pub points_per_level: i32,
    pub reference: String,
    pub weapons: Vec<WeaponStats>,
}

impl TraitData {
    pub fn points(&self) -> i32 {
        self.base_points
            .saturating_add(self.levels.unwrap_or(0).saturating_mul(self.points_per_level))
    }
}

impl Variant for TraitData {
    const CURRENT_VERSION: i32 = 1;
    const TAG: &'static str = statics::TAG_TRAIT;
    const CONTAINER_TAG: &'static str = statics::TAG_TRAIT_CONTAINER;

    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        _version: i32,
    ) -> Result<bool, CodecError> {
        match tag.name.as_str() {
            "name" => self.name = reader.read_text(tag)?,
            "levels" => self.levels = parse_optional_i32(&reader.read_text(tag)?, 0, i32::MAX),
            "base_points" => {
                self.base_points = reader.read_i32(tag, 0, i32::MIN, i32::MAX)?;
            }
            "points_per_level" => {
                self.points_per_level = reader.read_i32(tag, 0, i32::MIN, i32::MAX)?;
            }
            "reference" => self.reference = reader.read_text(tag)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn save_self(&self, out: &mut XmlWriter) {
        out.simple_tag("name", &self.name);
        if let Some(levels) = self.levels {
            out.simple_tag_i32("levels", levels);
        }
        out.simple_tag_not_zero("base_points", self.base_points);
        out.simple_tag_not_zero("points_per_level", self.points_per_level);
        out.simple_tag_not_empty("reference", &self.reference);
    }
}

impl Searchable for TraitData {
    fn search_texts(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl Nameable for TraitData {
    fn nameable_texts(&self) -> Vec<&str> {
        vec![&self.name]
    }

    fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.name]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillData {
    pub name: String,
    pub specialization: String,
    pub tech_level: String,
    pub attribute: Attribute,
    pub difficulty: Difficulty,
    pub points: i32,
    /// Multiplies the encumbrance penalty (0 = unaffected).
    pub encumbrance_penalty_multiplier: i32,
    pub defaults: Vec<SkillDefault>,
    pub reference: String,
    pub weapons: Vec<WeaponStats>,
}

impl Default for SkillData {
    fn default() -> Self {
        Self {
            name: String::new(),
            specialization: String::new(),
            tech_level: String::new(),
            attribute: Attribute::Dx,
            difficulty: Difficulty::Average,
            points: 1,
            encumbrance_penalty_multiplier: 0,
            defaults: Vec::new(),
            reference: String::new(),
            weapons: Vec::new(),
        }
    }
}

impl Variant for SkillData {
    const CURRENT_VERSION: i32 = 1;
    const TAG: &'static str = statics::TAG_SKILL;
    const CONTAINER_TAG: &'static str = statics::TAG_SKILL_CONTAINER;

    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        _version: i32,
    ) -> Result<bool, CodecError> {
        match tag.name.as_str() {
            "name" => self.name = reader.read_text(tag)?,
            "specialization" => self.specialization = reader.read_text(tag)?,
            "tech_level" => self.tech_level = reader.read_text(tag)?,
            "difficulty" => {
                (self.attribute, self.difficulty) =
                    parse_attr_difficulty(&reader.read_text(tag)?, Attribute::Dx);
            }
            "points" => self.points = reader.read_i32(tag, 0, 0, i32::MAX)?,
            "encumbrance_penalty_multiplier" => {
                self.encumbrance_penalty_multiplier = reader.read_i32(tag, 0, 0, i32::MAX)?;
            }
            statics::TAG_DEFAULT => self.defaults.push(SkillDefault::load(reader, tag)?),
            "reference" => self.reference = reader.read_text(tag)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn save_self(&self, out: &mut XmlWriter) {
        out.simple_tag("name", &self.name);
        out.simple_tag_not_empty("specialization", &self.specialization);
        out.simple_tag_not_empty("tech_level", &self.tech_level);
        out.simple_tag(
            "difficulty",
            &format_attr_difficulty(self.attribute, self.difficulty),
        );
        out.simple_tag_i32("points", self.points);
        out.simple_tag_not_zero(
            "encumbrance_penalty_multiplier",
            self.encumbrance_penalty_multiplier,
        );
        out.simple_tag_not_empty("reference", &self.reference);
        for def in &self.defaults {
            def.save(out);
        }
    }
}

impl Searchable for SkillData {
    fn search_texts(&self) -> Vec<&str> {
        vec![&self.name, &self.specialization]
    }
}

impl Nameable for SkillData {
    fn nameable_texts(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = vec![&self.name, &self.specialization];
        for def in &self.defaults {
            texts.push(&def.name);
            texts.push(&def.specialization);
        }
        texts
    }

    fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        let mut texts = vec![&mut self.name, &mut self.specialization];
        for def in &mut self.defaults {
            texts.push(&mut def.name);
            texts.push(&mut def.specialization);
        }
        texts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechniqueData {
    pub name: String,
    /// The skill (or attribute) this technique is an improvement of.
    pub default: SkillDefault,
    /// Maximum levels above the default; `None` means uncapped.
    pub limit: Option<i32>,
    /// Only average and hard are meaningful for techniques.
    pub difficulty: Difficulty,
    pub points: i32,
    pub reference: String,
    pub weapons: Vec<WeaponStats>,
}

impl Default for TechniqueData {
    fn default() -> Self {
        Self {
            name: String::new(),
            default: SkillDefault::skill("", "", 0),
            limit: None,
            difficulty: Difficulty::Average,
            points: 1,
            reference: String::new(),
            weapons: Vec::new(),
        }
    }
}

impl Variant for TechniqueData {
    const CURRENT_VERSION: i32 = 1;
    const TAG: &'static str = statics::TAG_TECHNIQUE;
    // Techniques are never containers.
    const CONTAINER_TAG: &'static str = statics::TAG_TECHNIQUE;

    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        _version: i32,
    ) -> Result<bool, CodecError> {
        match tag.name.as_str() {
            "name" => self.name = reader.read_text(tag)?,
            "limit" => {
                self.limit = parse_optional_i32(&reader.read_text(tag)?, i32::MIN, i32::MAX);
            }
            "difficulty" => {
                self.difficulty = match Difficulty::from_key(&reader.read_text(tag)?) {
                    Difficulty::Hard => Difficulty::Hard,
                    _ => Difficulty::Average,
                };
            }
            "points" => self.points = reader.read_i32(tag, 0, 0, i32::MAX)?,
            statics::TAG_DEFAULT => self.default = SkillDefault::load(reader, tag)?,
            "reference" => self.reference = reader.read_text(tag)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn save_self(&self, out: &mut XmlWriter) {
        out.simple_tag("name", &self.name);
        if let Some(limit) = self.limit {
            out.simple_tag_i32("limit", limit);
        }
        out.simple_tag("difficulty", self.difficulty.key());
        out.simple_tag_i32("points", self.points);
        out.simple_tag_not_empty("reference", &self.reference);
        self.default.save(out);
    }
}

impl Searchable for TechniqueData {
    fn search_texts(&self) -> Vec<&str> {
        vec![&self.name, &self.default.name]
    }
}

impl Nameable for TechniqueData {
    fn nameable_texts(&self) -> Vec<&str> {
        vec![&self.name, &self.default.name, &self.default.specialization]
    }

    fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        vec![
            &mut self.name,
            &mut self.default.name,
            &mut self.default.specialization,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpellData {
    pub name: String,
    pub college: String,
    pub spell_class: String,
    pub casting_cost: String,
    pub duration: String,
    pub attribute: Attribute,
    pub difficulty: Difficulty,
    pub points: i32,
    pub reference: String,
    pub weapons: Vec<WeaponStats>,
}

impl Default for SpellData {
    fn default() -> Self {
        Self {
            name: String::new(),
            college: String::new(),
            spell_class: String::new(),
            casting_cost: String::new(),
            duration: String::new(),
            attribute: Attribute::Iq,
            difficulty: Difficulty::Hard,
            points: 1,
            reference: String::new(),
            weapons: Vec::new(),
        }
    }
}

impl Variant for SpellData {
    const CURRENT_VERSION: i32 = 1;
    const TAG: &'static str = statics::TAG_SPELL;
    const CONTAINER_TAG: &'static str = statics::TAG_SPELL_CONTAINER;

    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        _version: i32,
    ) -> Result<bool, CodecError> {
        match tag.name.as_str() {
            "name" => self.name = reader.read_text(tag)?,
            "college" => self.college = reader.read_text(tag)?,
            "spell_class" => self.spell_class = reader.read_text(tag)?,
            "casting_cost" => self.casting_cost = reader.read_text(tag)?,
            "duration" => self.duration = reader.read_text(tag)?,
            "difficulty" => {
                (self.attribute, self.difficulty) =
                    parse_attr_difficulty(&reader.read_text(tag)?, Attribute::Iq);
            }
            "points" => self.points = reader.read_i32(tag, 0, 0, i32::MAX)?,
            "reference" => self.reference = reader.read_text(tag)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn save_self(&self, out: &mut XmlWriter) {
        out.simple_tag("name", &self.name);
        out.simple_tag_not_empty("college", &self.college);
        out.simple_tag_not_empty("spell_class", &self.spell_class);
        out.simple_tag_not_empty("casting_cost", &self.casting_cost);
        out.simple_tag_not_empty("duration", &self.duration);
        out.simple_tag(
            "difficulty",
            &format_attr_difficulty(self.attribute, self.difficulty),
        );
        out.simple_tag_i32("points", self.points);
        out.simple_tag_not_empty("reference", &self.reference);
    }
}

impl Searchable for SpellData {
    fn search_texts(&self) -> Vec<&str> {
        vec![&self.name, &self.college, &self.spell_class]
    }
}

impl Nameable for SpellData {
    fn nameable_texts(&self) -> Vec<&str> {
        vec![&self.name, &self.college]
    }

    fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.name, &mut self.college]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentData {
    pub description: String,
    pub quantity: i32,
    /// Value of a single unit.
    pub value: f64,
    /// Weight of a single unit, in pounds.
    pub weight: f64,
    pub equipped: bool,
    pub tech_level: String,
    pub legality_class: String,
    pub reference: String,
    pub weapons: Vec<WeaponStats>,
}

impl Default for EquipmentData {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: 1,
            value: 0.0,
            weight: 0.0,
            equipped: true,
            tech_level: String::new(),
            legality_class: String::new(),
            reference: String::new(),
            weapons: Vec::new(),
        }
    }
}

impl Variant for EquipmentData {
    // Version 1 stored weight as free text ("3 lb").
    const CURRENT_VERSION: i32 = 2;
    const TAG: &'static str = statics::TAG_EQUIPMENT;
    const CONTAINER_TAG: &'static str = statics::TAG_EQUIPMENT_CONTAINER;

    fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        version: i32,
    ) -> Result<bool, CodecError> {
        match tag.name.as_str() {
            "description" => self.description = reader.read_text(tag)?,
            "quantity" => self.quantity = reader.read_i32(tag, 1, 0, i32::MAX)?,
            "value" => self.value = parse_f64(&reader.read_text(tag)?, 0.0).max(0.0),
            "weight" => {
                let text = reader.read_text(tag)?;
                self.weight = if version < 2 {
                    parse_leading_number(&text)
                } else {
                    parse_f64(&text, 0.0)
                }
                .max(0.0);
            }
            "unequipped" => {
                reader.skip(tag)?;
                self.equipped = false;
            }
            "tech_level" => self.tech_level = reader.read_text(tag)?,
            "legality_class" => self.legality_class = reader.read_text(tag)?,
            "reference" => self.reference = reader.read_text(tag)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn save_self(&self, out: &mut XmlWriter) {
        out.simple_tag("description", &self.description);
        out.simple_tag_i32("quantity", self.quantity);
        out.simple_tag_f64("value", self.value);
        out.simple_tag_f64("weight", self.weight);
        out.flag_tag("unequipped", !self.equipped);
        out.simple_tag_not_empty("tech_level", &self.tech_level);
        out.simple_tag_not_empty("legality_class", &self.legality_class);
        out.simple_tag_not_empty("reference", &self.reference);
    }

    // Floats compare by bit pattern so that a reloaded row is equivalent to its source.
    fn equivalent(&self, other: &Self) -> bool {
        self.description == other.description
            && self.quantity == other.quantity
            && self.value.to_bits() == other.value.to_bits()
            && self.weight.to_bits() == other.weight.to_bits()
            && self.equipped == other.equipped
            && self.tech_level == other.tech_level
            && self.legality_class == other.legality_class
            && self.reference == other.reference
            && self.weapons == other.weapons
    }
}

impl Searchable for EquipmentData {
    fn search_texts(&self) -> Vec<&str> {
        vec![&self.description, &self.tech_level]
    }
}

impl Nameable for EquipmentData {
    fn nameable_texts(&self) -> Vec<&str> {
        vec![&self.description]
    }

    fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.description]
    }
}

/// Which list of the sheet a row belongs to. Rows only nest inside rows of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Notes,
    Traits,
    Skills,
    Spells,
    Equipment,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Notes,
        Family::Traits,
        Family::Skills,
        Family::Spells,
        Family::Equipment,
    ];

    pub fn ids(self) -> &'static statics::SharedIds {
        match self {
            Family::Notes => &statics::note::IDS,
            Family::Traits => &statics::traits::IDS,
            Family::Skills => &statics::skill::IDS,
            Family::Spells => &statics::spell::IDS,
            Family::Equipment => &statics::equipment::IDS,
        }
    }

    /// Whether `tag` names a row element of this family.
    pub fn accepts_tag(self, tag: &str) -> bool {
        match self {
            Family::Notes => tag == statics::TAG_NOTE || tag == statics::TAG_NOTE_CONTAINER,
            Family::Traits => tag == statics::TAG_TRAIT || tag == statics::TAG_TRAIT_CONTAINER,
            Family::Skills => {
                tag == statics::TAG_SKILL
                    || tag == statics::TAG_SKILL_CONTAINER
                    || tag == statics::TAG_TECHNIQUE
            }
            Family::Spells => tag == statics::TAG_SPELL || tag == statics::TAG_SPELL_CONTAINER,
            Family::Equipment => {
                tag == statics::TAG_EQUIPMENT || tag == statics::TAG_EQUIPMENT_CONTAINER
            }
        }
    }
}

/// The closed set of row payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    Note(NoteData),
    Trait(TraitData),
    Skill(SkillData),
    Technique(TechniqueData),
    Spell(SpellData),
    Equipment(EquipmentData),
}

/// Runs `$body` with `$data` bound to the payload of whichever variant `$kind` holds.
macro_rules! with_variant {
    ($kind:expr, $data:ident => $body:expr) => {
        match $kind {
            $crate::kinds::RowKind::Note($data) => $body,
            $crate::kinds::RowKind::Trait($data) => $body,
            $crate::kinds::RowKind::Skill($data) => $body,
            $crate::kinds::RowKind::Technique($data) => $body,
            $crate::kinds::RowKind::Spell($data) => $body,
            $crate::kinds::RowKind::Equipment($data) => $body,
        }
    };
}
pub(crate) use with_variant;

/// Generic access to the per-variant `Variant` constants.
fn tags_of<V: Variant>(_: &V) -> (&'static str, &'static str, i32) {
    (V::TAG, V::CONTAINER_TAG, V::CURRENT_VERSION)
}

impl RowKind {
    /// A fresh, empty payload for a row element tag.
    pub fn for_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            statics::TAG_NOTE | statics::TAG_NOTE_CONTAINER => RowKind::Note(NoteData::default()),
            statics::TAG_TRAIT | statics::TAG_TRAIT_CONTAINER => {
                RowKind::Trait(TraitData::default())
            }
            statics::TAG_SKILL | statics::TAG_SKILL_CONTAINER => {
                RowKind::Skill(SkillData::default())
            }
            statics::TAG_TECHNIQUE => RowKind::Technique(TechniqueData::default()),
            statics::TAG_SPELL | statics::TAG_SPELL_CONTAINER => {
                RowKind::Spell(SpellData::default())
            }
            statics::TAG_EQUIPMENT | statics::TAG_EQUIPMENT_CONTAINER => {
                RowKind::Equipment(EquipmentData::default())
            }
            _ => return None,
        })
    }

    pub fn is_container_tag(tag: &str) -> bool {
        matches!(
            tag,
            statics::TAG_NOTE_CONTAINER
                | statics::TAG_TRAIT_CONTAINER
                | statics::TAG_SKILL_CONTAINER
                | statics::TAG_SPELL_CONTAINER
                | statics::TAG_EQUIPMENT_CONTAINER
        )
    }

    pub fn family(&self) -> Family {
        match self {
            RowKind::Note(_) => Family::Notes,
            RowKind::Trait(_) => Family::Traits,
            RowKind::Skill(_) | RowKind::Technique(_) => Family::Skills,
            RowKind::Spell(_) => Family::Spells,
            RowKind::Equipment(_) => Family::Equipment,
        }
    }

    pub fn can_be_container(&self) -> bool {
        !matches!(self, RowKind::Technique(_))
    }

    pub fn tag(&self, container: bool) -> &'static str {
        let (item, container_tag, _) = with_variant!(self, d => tags_of(d));
        if container { container_tag } else { item }
    }

    pub fn current_version(&self) -> i32 {
        with_variant!(self, d => tags_of(d).2)
    }

    /// Resets the payload to its defaults ahead of a load.
    pub(crate) fn reset(&mut self) {
        with_variant!(self, d => *d = Default::default());
    }

    pub(crate) fn load_sub_element(
        &mut self,
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        version: i32,
    ) -> Result<bool, CodecError> {
        with_variant!(self, d => d.load_sub_element(reader, tag, version))
    }

    pub(crate) fn save_self(&self, out: &mut XmlWriter) {
        with_variant!(self, d => d.save_self(out))
    }

    pub fn equivalent(&self, other: &RowKind) -> bool {
        match (self, other) {
            (RowKind::Note(a), RowKind::Note(b)) => a.equivalent(b),
            (RowKind::Trait(a), RowKind::Trait(b)) => a.equivalent(b),
            (RowKind::Skill(a), RowKind::Skill(b)) => a.equivalent(b),
            (RowKind::Technique(a), RowKind::Technique(b)) => a.equivalent(b),
            (RowKind::Spell(a), RowKind::Spell(b)) => a.equivalent(b),
            (RowKind::Equipment(a), RowKind::Equipment(b)) => a.equivalent(b),
            _ => false,
        }
    }

    pub fn search_texts(&self) -> Vec<&str> {
        with_variant!(self, d => d.search_texts())
    }

    pub(crate) fn nameable_texts(&self) -> Vec<&str> {
        let mut texts = with_variant!(self, d => d.nameable_texts());
        for weapon in self.weapons() {
            texts.push(weapon.usage());
            for def in weapon.defaults() {
                texts.push(&def.name);
                texts.push(&def.specialization);
            }
        }
        texts
    }

    pub(crate) fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        with_variant!(self, d => d.nameable_texts_mut())
    }

    /// Display name: the row's name, description or text.
    pub fn name(&self) -> &str {
        match self {
            RowKind::Note(d) => &d.text,
            RowKind::Trait(d) => &d.name,
            RowKind::Skill(d) => &d.name,
            RowKind::Technique(d) => &d.name,
            RowKind::Spell(d) => &d.name,
            RowKind::Equipment(d) => &d.description,
        }
    }

    /// Specialization of skill-like rows; empty for everything else.
    pub fn specialization(&self) -> &str {
        match self {
            RowKind::Skill(d) => &d.specialization,
            RowKind::Technique(d) => &d.default.specialization,
            _ => statics::EN_EMPTY,
        }
    }

    pub fn weapons(&self) -> &[WeaponStats] {
        match self {
            RowKind::Note(_) => &[],
            RowKind::Trait(d) => &d.weapons,
            RowKind::Skill(d) => &d.weapons,
            RowKind::Technique(d) => &d.weapons,
            RowKind::Spell(d) => &d.weapons,
            RowKind::Equipment(d) => &d.weapons,
        }
    }

    pub fn has_weapons(&self) -> bool {
        !matches!(self, RowKind::Note(_))
    }

    pub(crate) fn weapons_mut(&mut self) -> Option<&mut Vec<WeaponStats>> {
        match self {
            RowKind::Note(_) => None,
            RowKind::Trait(d) => Some(&mut d.weapons),
            RowKind::Skill(d) => Some(&mut d.weapons),
            RowKind::Technique(d) => Some(&mut d.weapons),
            RowKind::Spell(d) => Some(&mut d.weapons),
            RowKind::Equipment(d) => Some(&mut d.weapons),
        }
    }

    pub fn row_type(&self) -> &'static str {
        match self {
            RowKind::Note(_) => "Note",
            RowKind::Trait(_) => "Trait",
            RowKind::Skill(_) => "Skill",
            RowKind::Technique(_) => "Technique",
            RowKind::Spell(_) => "Spell",
            RowKind::Equipment(_) => "Equipment",
        }
    }
}
