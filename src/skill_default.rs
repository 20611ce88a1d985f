use crate::statics;
use crate::xml::{CodecError, Tag, XmlReader, XmlWriter, parse_i32};
use std::fmt;

/// The primary attributes a character sheet tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    St,
    Dx,
    Iq,
    Ht,
    Will,
    Per,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::St,
        Attribute::Dx,
        Attribute::Iq,
        Attribute::Ht,
        Attribute::Will,
        Attribute::Per,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Attribute::St => "st",
            Attribute::Dx => "dx",
            Attribute::Iq => "iq",
            Attribute::Ht => "ht",
            Attribute::Will => "will",
            Attribute::Per => "per",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::St => "ST",
            Attribute::Dx => "DX",
            Attribute::Iq => "IQ",
            Attribute::Ht => "HT",
            Attribute::Will => "Will",
            Attribute::Per => "Per",
        })
    }
}

/// What a default derives from: a base attribute, or another skill-like row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillDefaultType {
    Attribute(Attribute),
    Skill,
}

impl SkillDefaultType {
    pub fn key(self) -> &'static str {
        match self {
            SkillDefaultType::Attribute(attr) => attr.key(),
            SkillDefaultType::Skill => "skill",
        }
    }

    /// Unknown tokens fall back to DX, the most common default in rules content.
    pub fn from_key(key: &str) -> Self {
        if key.trim().eq_ignore_ascii_case("skill") {
            return SkillDefaultType::Skill;
        }
        match Attribute::from_key(key) {
            Some(attr) => SkillDefaultType::Attribute(attr),
            None => {
                log::trace!("unknown default type {key:?}; using DX");
                SkillDefaultType::Attribute(Attribute::Dx)
            }
        }
    }
}

/// "My level is derived from X's level, plus a modifier."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDefault {
    pub kind: SkillDefaultType,
    /// Skill name; empty for attribute defaults.
    pub name: String,
    pub specialization: String,
    pub modifier: i32,
}

impl SkillDefault {
    pub fn attribute(attr: Attribute, modifier: i32) -> Self {
        Self {
            kind: SkillDefaultType::Attribute(attr),
            name: String::new(),
            specialization: String::new(),
            modifier,
        }
    }

    pub fn skill(name: &str, specialization: &str, modifier: i32) -> Self {
        Self {
            kind: SkillDefaultType::Skill,
            name: name.to_string(),
            specialization: specialization.to_string(),
            modifier,
        }
    }

    pub(crate) fn load(reader: &mut XmlReader<'_>, tag: &Tag) -> Result<Self, CodecError> {
        let mut def = SkillDefault::attribute(Attribute::Dx, 0);
        if tag.empty {
            return Ok(def);
        }
        while let Some(child) = reader.next_child(&tag.name)? {
            match child.name.as_str() {
                "type" => def.kind = SkillDefaultType::from_key(&reader.read_text(&child)?),
                "name" => def.name = reader.read_text(&child)?,
                "specialization" => def.specialization = reader.read_text(&child)?,
                "modifier" => {
                    def.modifier = parse_i32(&reader.read_text(&child)?, 0, i32::MIN, i32::MAX);
                }
                _ => reader.skip(&child)?,
            }
        }
        Ok(def)
    }

    pub(crate) fn save(&self, out: &mut XmlWriter) {
        out.start_tag(statics::TAG_DEFAULT, &[]);
        out.simple_tag("type", self.kind.key());
        out.simple_tag_not_empty("name", &self.name);
        out.simple_tag_not_empty("specialization", &self.specialization);
        out.simple_tag_not_zero("modifier", self.modifier);
        out.end_tag(statics::TAG_DEFAULT);
    }
}

impl fmt::Display for SkillDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SkillDefaultType::Attribute(attr) => write!(f, "{attr}")?,
            SkillDefaultType::Skill => {
                f.write_str(&self.name)?;
                if !self.specialization.is_empty() {
                    write!(f, " ({})", self.specialization)?;
                }
            }
        }
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Attribute, SkillDefault, SkillDefaultType};
    use crate::statics;
    use crate::xml::{XmlReader, XmlWriter};

    #[test]
    fn unknown_type_token_falls_back_to_dx() {
        assert_eq!(
            SkillDefaultType::from_key("wisdom"),
            SkillDefaultType::Attribute(Attribute::Dx)
        );
        assert_eq!(SkillDefaultType::from_key("Skill"), SkillDefaultType::Skill);
        assert_eq!(
            SkillDefaultType::from_key("WILL"),
            SkillDefaultType::Attribute(Attribute::Will)
        );
    }

    #[test]
    fn saved_default_loads_back() {
        let def = SkillDefault::skill("Broadsword", "", -2);
        let mut w = XmlWriter::new(statics::NL_LF);
        def.save(&mut w);
        let text = w.finish();

        let mut r = XmlReader::new(text.as_bytes());
        let tag = r.root().unwrap();
        assert_eq!(SkillDefault::load(&mut r, &tag).unwrap(), def);
    }

    #[test]
    fn display_shows_specialization_and_modifier() {
        let def = SkillDefault::skill("Guns", "Pistol", -4);
        assert_eq!(def.to_string(), "Guns (Pistol)-4");
        assert_eq!(SkillDefault::attribute(Attribute::St, 0).to_string(), "ST");
    }
}
