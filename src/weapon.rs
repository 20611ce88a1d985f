use crate::row::{Emitter, RowId};
use crate::skill_default::SkillDefault;
use crate::statics;
use crate::xml::{CodecError, Tag, XmlReader, XmlWriter};

/// Fields that only apply to one style of weapon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeaponKind {
    Melee {
        reach: String,
        parry: String,
        block: String,
    },
    Ranged {
        accuracy: String,
        range: String,
        rate_of_fire: String,
    },
}

impl WeaponKind {
    pub fn melee() -> Self {
        WeaponKind::Melee {
            reach: String::new(),
            parry: String::new(),
            block: String::new(),
        }
    }

    pub fn ranged() -> Self {
        WeaponKind::Ranged {
            accuracy: String::new(),
            range: String::new(),
            rate_of_fire: String::new(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            WeaponKind::Melee { .. } => statics::TAG_MELEE_WEAPON,
            WeaponKind::Ranged { .. } => statics::TAG_RANGED_WEAPON,
        }
    }
}

/// The stats for one attack mode of a row (a sword's swing, a trait's innate attack, ...).
///
/// Always owned by exactly one row; the owner is tracked by id so that notifications
/// and derived values can find their way back to it.
#[derive(Debug, Clone)]
pub struct WeaponStats {
    owner: Option<RowId>,
    damage: String,
    strength: String,
    usage: String,
    defaults: Vec<SkillDefault>,
    kind: WeaponKind,
}

impl PartialEq for WeaponStats {
    fn eq(&self, other: &Self) -> bool {
        self.damage == other.damage
            && self.strength == other.strength
            && self.usage == other.usage
            && self.defaults == other.defaults
            && self.kind == other.kind
    }
}

impl WeaponStats {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            owner: None,
            damage: String::new(),
            strength: String::new(),
            usage: String::new(),
            defaults: Vec::new(),
            kind,
        }
    }

    pub fn melee() -> Self {
        Self::new(WeaponKind::melee())
    }

    pub fn ranged() -> Self {
        Self::new(WeaponKind::ranged())
    }

    /// Copy of this weapon belonging to `owner`.
    pub fn clone_for(&self, owner: Option<RowId>) -> Self {
        let mut copy = self.clone();
        copy.owner = owner;
        copy
    }

    pub fn owner(&self) -> Option<RowId> {
        self.owner
    }

    /// Re-parents this weapon without copying it.
    pub fn set_owner(&mut self, owner: Option<RowId>) {
        self.owner = owner;
    }

    pub fn kind(&self) -> &WeaponKind {
        &self.kind
    }

    pub fn damage(&self) -> &str {
        &self.damage
    }

    pub fn strength(&self) -> &str {
        &self.strength
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn defaults(&self) -> &[SkillDefault] {
        &self.defaults
    }

    pub fn parry(&self) -> Option<&str> {
        match &self.kind {
            WeaponKind::Melee { parry, .. } => Some(parry),
            WeaponKind::Ranged { .. } => None,
        }
    }

    pub fn set_damage(&mut self, damage: &str) -> bool {
        set_if_changed(&mut self.damage, damage)
    }

    pub fn set_strength(&mut self, strength: &str) -> bool {
        set_if_changed(&mut self.strength, strength)
    }

    pub fn set_usage(&mut self, usage: &str) -> bool {
        set_if_changed(&mut self.usage, usage)
    }

    pub fn set_defaults(&mut self, defaults: Vec<SkillDefault>) -> bool {
        if self.defaults == defaults {
            return false;
        }
        self.defaults = defaults;
        true
    }

    /// Sets the parry notation; ranged weapons have none and report no change.
    pub fn set_parry(&mut self, value: &str) -> bool {
        match &mut self.kind {
            WeaponKind::Melee { parry, .. } => set_if_changed(parry, value),
            WeaponKind::Ranged { .. } => false,
        }
    }

    /// The minimum ST to use this weapon: the leading run of digits of the strength
    /// text ("12†" is 12). `None` when the text does not start with a digit.
    pub fn min_strength_value(&self) -> Option<i32> {
        let text = self.strength.trim_start();
        let end = text
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map_or(text.len(), |(i, _)| i);
        if end == 0 {
            return None;
        }
        text[..end].parse().ok()
    }

    /// Text that may hold `@Key@` placeholders: the usage and the default names.
    pub(crate) fn nameable_texts_mut(&mut self) -> Vec<&mut String> {
        let mut texts = vec![&mut self.usage];
        for def in &mut self.defaults {
            texts.push(&mut def.name);
            texts.push(&mut def.specialization);
        }
        texts
    }

    pub(crate) fn load(
        reader: &mut XmlReader<'_>,
        tag: &Tag,
        owner: Option<RowId>,
    ) -> Result<Self, CodecError> {
        let kind = if tag.name == statics::TAG_RANGED_WEAPON {
            WeaponKind::ranged()
        } else {
            WeaponKind::melee()
        };
        let mut weapon = Self::new(kind);
        weapon.owner = owner;
        if tag.empty {
            return Ok(weapon);
        }
        while let Some(child) = reader.next_child(&tag.name)? {
            let name = child.name.as_str();
            match name {
                statics::TAG_DAMAGE => weapon.damage = reader.read_text(&child)?,
                statics::TAG_STRENGTH => weapon.strength = reader.read_text(&child)?,
                statics::TAG_USAGE => weapon.usage = reader.read_text(&child)?,
                statics::TAG_DEFAULT => {
                    weapon.defaults.push(SkillDefault::load(reader, &child)?);
                }
                _ => match weapon.kind_field_mut(name) {
                    Some(field) => *field = reader.read_text(&child)?,
                    None => reader.skip(&child)?,
                },
            }
        }
        Ok(weapon)
    }

    fn kind_field_mut(&mut self, name: &str) -> Option<&mut String> {
        match &mut self.kind {
            WeaponKind::Melee {
                reach,
                parry,
                block,
            } => match name {
                "reach" => Some(reach),
                "parry" => Some(parry),
                "block" => Some(block),
                _ => None,
            },
            WeaponKind::Ranged {
                accuracy,
                range,
                rate_of_fire,
            } => match name {
                "accuracy" => Some(accuracy),
                "range" => Some(range),
                "rate_of_fire" => Some(rate_of_fire),
                _ => None,
            },
        }
    }

    pub(crate) fn save(&self, out: &mut XmlWriter) {
        let tag = self.kind.tag();
        out.start_tag(tag, &[]);
        out.simple_tag_not_empty(statics::TAG_DAMAGE, &self.damage);
        out.simple_tag_not_empty(statics::TAG_STRENGTH, &self.strength);
        out.simple_tag_not_empty(statics::TAG_USAGE, &self.usage);
        match &self.kind {
            WeaponKind::Melee {
                reach,
                parry,
                block,
            } => {
                out.simple_tag_not_empty("reach", reach);
                out.simple_tag_not_empty("parry", parry);
                out.simple_tag_not_empty("block", block);
            }
            WeaponKind::Ranged {
                accuracy,
                range,
                rate_of_fire,
            } => {
                out.simple_tag_not_empty("accuracy", accuracy);
                out.simple_tag_not_empty("range", range);
                out.simple_tag_not_empty("rate_of_fire", rate_of_fire);
            }
        }
        for def in &self.defaults {
            def.save(out);
        }
        out.end_tag(tag);
    }
}

fn set_if_changed(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    *field = value.to_string();
    true
}

/// Mutable access to one weapon of a row. Changes are announced on behalf of the
/// owning row, and only while that row is attached to a document.
pub struct WeaponEditor<'a> {
    weapon: &'a mut WeaponStats,
    emitter: Emitter<'a>,
}

impl<'a> WeaponEditor<'a> {
    pub(crate) fn new(weapon: &'a mut WeaponStats, emitter: Emitter<'a>) -> Self {
        Self { weapon, emitter }
    }

    pub fn weapon(&self) -> &WeaponStats {
        self.weapon
    }

    pub fn set_damage(&mut self, damage: &str) -> bool {
        self.changed(|w| w.set_damage(damage), statics::WEAPON_ID_DAMAGE)
    }

    pub fn set_strength(&mut self, strength: &str) -> bool {
        self.changed(|w| w.set_strength(strength), statics::WEAPON_ID_STRENGTH)
    }

    pub fn set_usage(&mut self, usage: &str) -> bool {
        self.changed(|w| w.set_usage(usage), statics::WEAPON_ID_USAGE)
    }

    pub fn set_defaults(&mut self, defaults: Vec<SkillDefault>) -> bool {
        self.changed(|w| w.set_defaults(defaults), statics::WEAPON_ID_DEFAULTS)
    }

    pub fn set_parry(&mut self, parry: &str) -> bool {
        self.changed(|w| w.set_parry(parry), statics::WEAPON_ID_PARRY)
    }

    fn changed(&mut self, f: impl FnOnce(&mut WeaponStats) -> bool, id: &str) -> bool {
        let changed = f(self.weapon);
        if changed {
            self.emitter.emit(id);
        }
        changed
    }
}
