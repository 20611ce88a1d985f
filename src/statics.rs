// Central place for persisted tag names, notification ids and other non-localized constants.
// Keep these out of the codec and row code to reduce duplication and make tweaks safer.

// Newline constants (used for sheet formatting; keep out of codec code).
pub const NL_LF: &str = "\n";
pub const NL_CRLF: &str = "\r\n";

// Document-level tags.
pub const TAG_CHARACTER: &str = "character";
pub const TAG_ATTRIBUTES: &str = "attributes";
pub const TAG_ROWS: &str = "rows";
pub const TAG_INCLUDE_KICK_BOOTS: &str = "include_kick_boots";

/// Current version of the `<character>` document format.
/// Version 1 stored the attributes directly on the root element.
pub const CHARACTER_VERSION: i32 = 2;

// Attributes shared by every row element.
pub const ATTR_VERSION: &str = "version";
pub const ATTR_ID: &str = "id";
pub const ATTR_OPEN: &str = "open";

// Sub-elements shared by every row element.
pub const TAG_CATEGORIES: &str = "categories";
pub const TAG_CATEGORY: &str = "category";
pub const TAG_NOTES: &str = "notes";
pub const TAG_PREREQS: &str = "prereqs";
pub const TAG_ATTRIBUTE_PREREQ: &str = "attribute_prereq";
pub const TAG_SKILL_PREREQ: &str = "skill_prereq";

// Row element tags, item form / container form.
pub const TAG_NOTE: &str = "note";
pub const TAG_NOTE_CONTAINER: &str = "note_container";
pub const TAG_TRAIT: &str = "trait";
pub const TAG_TRAIT_CONTAINER: &str = "trait_container";
pub const TAG_SKILL: &str = "skill";
pub const TAG_SKILL_CONTAINER: &str = "skill_container";
pub const TAG_TECHNIQUE: &str = "technique";
pub const TAG_SPELL: &str = "spell";
pub const TAG_SPELL_CONTAINER: &str = "spell_container";
pub const TAG_EQUIPMENT: &str = "equipment";
pub const TAG_EQUIPMENT_CONTAINER: &str = "equipment_container";

// Weapon and default tags.
pub const TAG_MELEE_WEAPON: &str = "melee_weapon";
pub const TAG_RANGED_WEAPON: &str = "ranged_weapon";
pub const TAG_DAMAGE: &str = "damage";
pub const TAG_STRENGTH: &str = "strength";
pub const TAG_USAGE: &str = "usage";
pub const TAG_DEFAULT: &str = "default";

// Notification ids. The namespace is a contract with UI/undo collaborators; do not rename.
pub const CHARACTER_PREFIX: &str = "gcs.character.";
pub const ID_INCLUDE_KICK_BOOTS: &str = "gcs.character.IncludeKickBoots";
pub const ID_ATTRIBUTES: &str = "gcs.character.attributes.";

/// Notification ids for the fields every row shares, for one row family.
pub struct SharedIds {
    pub prefix: &'static str,
    pub open: &'static str,
    pub notes: &'static str,
    pub categories: &'static str,
    pub prereqs: &'static str,
    pub satisfied: &'static str,
    pub list_changed: &'static str,
}

macro_rules! shared_field_ids {
    ($module:ident, $prefix:literal) => {
        pub mod $module {
            pub const IDS: super::SharedIds = super::SharedIds {
                prefix: $prefix,
                open: concat!($prefix, "Open"),
                notes: concat!($prefix, "Notes"),
                categories: concat!($prefix, "Categories"),
                prereqs: concat!($prefix, "Prereqs"),
                satisfied: concat!($prefix, "Satisfied"),
                list_changed: concat!($prefix, "ListChanged"),
            };
        }
    };
}

shared_field_ids!(note, "gcs.character.note.");
shared_field_ids!(traits, "gcs.character.trait.");
shared_field_ids!(skill, "gcs.character.skill.");
shared_field_ids!(spell, "gcs.character.spell.");
shared_field_ids!(equipment, "gcs.character.equipment.");

pub const NOTE_ID_TEXT: &str = "gcs.character.note.Text";

pub const TRAIT_ID_NAME: &str = "gcs.character.trait.Name";
pub const TRAIT_ID_POINTS: &str = "gcs.character.trait.Points";
pub const TRAIT_ID_LEVELS: &str = "gcs.character.trait.Levels";

pub const SKILL_ID_NAME: &str = "gcs.character.skill.Name";
pub const SKILL_ID_SPECIALIZATION: &str = "gcs.character.skill.Specialization";
pub const SKILL_ID_POINTS: &str = "gcs.character.skill.Points";
pub const SKILL_ID_DEFAULTS: &str = "gcs.character.skill.Defaults";
pub const SKILL_ID_DIFFICULTY: &str = "gcs.character.skill.Difficulty";

pub const SPELL_ID_NAME: &str = "gcs.character.spell.Name";
pub const SPELL_ID_POINTS: &str = "gcs.character.spell.Points";

pub const EQUIPMENT_ID_DESCRIPTION: &str = "gcs.character.equipment.Description";
pub const EQUIPMENT_ID_QUANTITY: &str = "gcs.character.equipment.Quantity";
pub const EQUIPMENT_ID_EQUIPPED: &str = "gcs.character.equipment.Equipped";

pub const WEAPON_ID_DAMAGE: &str = "gcs.character.weapon.damage";
pub const WEAPON_ID_STRENGTH: &str = "gcs.character.weapon.strength";
pub const WEAPON_ID_USAGE: &str = "gcs.character.weapon.usage";
pub const WEAPON_ID_DEFAULTS: &str = "gcs.character.weapon.defaults";
pub const WEAPON_ID_PARRY: &str = "gcs.character.weapon.parry";
pub const WEAPON_ID_LIST_CHANGED: &str = "gcs.character.weapon.ListChanged";

// Settings keys for the font table.
pub const FONT_LABEL_PRIMARY: &str = "label.primary";
pub const FONT_LABEL_SECONDARY: &str = "label.secondary";
pub const FONT_FIELD_PRIMARY: &str = "field.primary";
pub const FONT_FIELD_SECONDARY: &str = "field.secondary";
pub const FONT_FOOTER_PRIMARY: &str = "footer.primary";
pub const FONT_FOOTER_SECONDARY: &str = "footer.secondary";
pub const FONT_NOTIFICATION_KEY: &str = "FontsChanged";

pub const EN_EMPTY: &str = "";
pub const EN_UNSATISFIED_PREFIX: &str = "Prerequisites not met: ";
