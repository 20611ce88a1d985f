//! Derived skill levels.
//!
//! Skill defaults form a reference graph ("Broadsword defaults to Shortsword-2",
//! "Shortsword defaults to Broadsword-2") that may loop. Resolution keeps the row
//! defaults currently in progress in a visited set, so a loop yields no candidate
//! instead of recursing forever.

use crate::kinds::{Difficulty, RowKind};
use crate::row::{Row, RowId, skills_named};
use crate::skill_default::{Attribute, SkillDefault, SkillDefaultType};
use crate::weapon::WeaponStats;
use std::collections::HashSet;

/// Character values the resolver reads.
pub trait AttributeSource {
    fn attribute(&self, attr: Attribute) -> i32;
    /// Bonus added to ST when checking a weapon's minimum strength.
    fn striking_strength_bonus(&self) -> i32;
    /// Zero or negative.
    fn encumbrance_penalty(&self) -> i32;
}

/// The attribute block stored in a character sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterAttributes {
    pub st: i32,
    pub dx: i32,
    pub iq: i32,
    pub ht: i32,
    pub will: i32,
    pub per: i32,
    pub striking_st_bonus: i32,
    /// 0 (none) through 4 (extra-heavy).
    pub encumbrance_level: i32,
}

pub const DEFAULT_ATTRIBUTE: i32 = 10;
pub const MAX_ENCUMBRANCE_LEVEL: i32 = 4;

impl Default for CharacterAttributes {
    fn default() -> Self {
        Self {
            st: DEFAULT_ATTRIBUTE,
            dx: DEFAULT_ATTRIBUTE,
            iq: DEFAULT_ATTRIBUTE,
            ht: DEFAULT_ATTRIBUTE,
            will: DEFAULT_ATTRIBUTE,
            per: DEFAULT_ATTRIBUTE,
            striking_st_bonus: 0,
            encumbrance_level: 0,
        }
    }
}

impl CharacterAttributes {
    pub fn get(&self, attr: Attribute) -> i32 {
        match attr {
            Attribute::St => self.st,
            Attribute::Dx => self.dx,
            Attribute::Iq => self.iq,
            Attribute::Ht => self.ht,
            Attribute::Will => self.will,
            Attribute::Per => self.per,
        }
    }

    pub fn get_mut(&mut self, attr: Attribute) -> &mut i32 {
        match attr {
            Attribute::St => &mut self.st,
            Attribute::Dx => &mut self.dx,
            Attribute::Iq => &mut self.iq,
            Attribute::Ht => &mut self.ht,
            Attribute::Will => &mut self.will,
            Attribute::Per => &mut self.per,
        }
    }
}

impl AttributeSource for CharacterAttributes {
    fn attribute(&self, attr: Attribute) -> i32 {
        self.get(attr)
    }

    fn striking_strength_bonus(&self) -> i32 {
        self.striking_st_bonus
    }

    fn encumbrance_penalty(&self) -> i32 {
        -self.encumbrance_level.clamp(0, MAX_ENCUMBRANCE_LEVEL)
    }
}

/// Level bonus bought by `points` over a skill's base level.
fn point_step(points: i32) -> i32 {
    match points {
        i32::MIN..=1 => 0,
        2 | 3 => 1,
        _ => 1 + points / 4,
    }
}

type Visited = HashSet<(RowId, usize)>;

/// Read-only level computation over a set of rows.
pub struct Resolver<'a, A: AttributeSource + ?Sized> {
    rows: &'a [Row],
    attributes: &'a A,
}

impl<'a, A: AttributeSource + ?Sized> Resolver<'a, A> {
    pub fn new(rows: &'a [Row], attributes: &'a A) -> Self {
        Self { rows, attributes }
    }

    pub fn attributes(&self) -> &A {
        self.attributes
    }

    /// The effective skill level for attacking with `weapon`. Never negative.
    pub fn weapon_skill_level(&self, weapon: &WeaponStats) -> i32 {
        let mut visited = Visited::new();
        let mut level = weapon
            .defaults()
            .iter()
            .filter_map(|def| self.default_level(def, &mut visited))
            .max()
            .unwrap_or(0);

        if let Some(required) = weapon.min_strength_value() {
            let strength = self
                .attributes
                .attribute(Attribute::St)
                .saturating_add(self.attributes.striking_strength_bonus());
            if required > strength {
                level = level.saturating_sub(required.saturating_sub(strength));
            }
        }

        if weapon.parry().is_some_and(|parry| parry.contains('F')) {
            level = level.saturating_add(self.attributes.encumbrance_penalty());
        }

        level.max(0)
    }

    /// Level of a skill or technique row; `None` for rows that have none.
    pub fn level(&self, row: &Row) -> Option<i32> {
        self.row_level(row, &mut Visited::new())
    }

    /// Best level among skill-like rows matching `name` (and `specialization`, if given).
    pub fn best_level_named(&self, name: &str, specialization: &str) -> Option<i32> {
        self.best_named(name, specialization, &mut Visited::new())
    }

    fn best_named(&self, name: &str, specialization: &str, visited: &mut Visited) -> Option<i32> {
        skills_named(self.rows, name, specialization)
            .into_iter()
            .filter_map(|row| self.row_level(row, visited))
            .max()
    }

    fn default_level(&self, def: &SkillDefault, visited: &mut Visited) -> Option<i32> {
        let base = match def.kind {
            SkillDefaultType::Attribute(attr) => Some(self.attributes.attribute(attr)),
            SkillDefaultType::Skill => self.best_named(&def.name, &def.specialization, visited),
        };
        base.map(|level| level.saturating_add(def.modifier))
    }

    /// A default that belongs to a row. Only these can close a loop.
    fn row_default_level(
        &self,
        row: RowId,
        index: usize,
        def: &SkillDefault,
        visited: &mut Visited,
    ) -> Option<i32> {
        if !visited.insert((row, index)) {
            return None;
        }
        let level = self.default_level(def, visited);
        visited.remove(&(row, index));
        level
    }

    fn row_level(&self, row: &Row, visited: &mut Visited) -> Option<i32> {
        if row.is_container() {
            return None;
        }
        match row.kind() {
            RowKind::Skill(skill) => {
                let from_points = (skill.points > 0).then(|| {
                    self.attributes
                        .attribute(skill.attribute)
                        .saturating_add(skill.difficulty.base_relative_level())
                        .saturating_add(point_step(skill.points))
                });
                let from_defaults = skill
                    .defaults
                    .iter()
                    .enumerate()
                    .filter_map(|(i, def)| self.row_default_level(row.id(), i, def, visited))
                    .max();
                let level = from_points.max(from_defaults)?;
                Some(level.saturating_add(
                    skill
                        .encumbrance_penalty_multiplier
                        .saturating_mul(self.attributes.encumbrance_penalty()),
                ))
            }
            RowKind::Technique(tech) => {
                let base = self.row_default_level(row.id(), 0, &tech.default, visited)?;
                let bonus = match tech.difficulty {
                    Difficulty::Hard if tech.points > 0 => tech.points - 1,
                    Difficulty::Hard => 0,
                    _ => tech.points,
                };
                let level = base.saturating_add(bonus);
                Some(match tech.limit {
                    Some(limit) => level.min(base.saturating_add(limit)),
                    None => level,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CharacterAttributes, Resolver, point_step};
    use crate::kinds::{Difficulty, RowKind, SkillData, TechniqueData};
    use crate::row::Row;
    use crate::skill_default::{Attribute, SkillDefault};

    fn skill(name: &str, points: i32, defaults: Vec<SkillDefault>) -> Row {
        Row::item(RowKind::Skill(SkillData {
            name: name.to_string(),
            points,
            defaults,
            ..Default::default()
        }))
    }

    #[test]
    fn point_steps() {
        let steps: Vec<i32> = [0, 1, 2, 3, 4, 8, 12].into_iter().map(point_step).collect();
        assert_eq!(steps, vec![0, 0, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn points_and_defaults_take_the_best() {
        let attrs = CharacterAttributes {
            dx: 12,
            ..Default::default()
        };
        // DX/A with 4 points: 12 - 1 + 2.
        let rows = vec![skill("Broadsword", 4, vec![SkillDefault::attribute(Attribute::Dx, -5)])];
        let resolver = Resolver::new(&rows, &attrs);
        assert_eq!(resolver.level(&rows[0]), Some(13));

        // No points: only the default counts.
        let rows = vec![skill("Broadsword", 0, vec![SkillDefault::attribute(Attribute::Dx, -5)])];
        let resolver = Resolver::new(&rows, &attrs);
        assert_eq!(resolver.level(&rows[0]), Some(7));

        let rows = vec![skill("Broadsword", 0, vec![])];
        let resolver = Resolver::new(&rows, &attrs);
        assert_eq!(resolver.level(&rows[0]), None);
    }

    #[test]
    fn encumbrance_multiplier_applies_to_skills() {
        let attrs = CharacterAttributes {
            encumbrance_level: 2,
            ..Default::default()
        };
        let rows = vec![Row::item(RowKind::Skill(SkillData {
            name: "Climbing".to_string(),
            difficulty: Difficulty::Easy,
            points: 1,
            encumbrance_penalty_multiplier: 1,
            ..Default::default()
        }))];
        let resolver = Resolver::new(&rows, &attrs);
        assert_eq!(resolver.level(&rows[0]), Some(8));
    }

    #[test]
    fn technique_bonus_is_capped_by_limit() {
        let attrs = CharacterAttributes::default();
        let karate = Row::item(RowKind::Skill(SkillData {
            name: "Karate".to_string(),
            difficulty: Difficulty::Hard,
            points: 4,
            ..Default::default()
        }));
        let kick = Row::item(RowKind::Technique(TechniqueData {
            name: "Kicking".to_string(),
            default: SkillDefault::skill("Karate", "", -2),
            limit: Some(2),
            difficulty: Difficulty::Hard,
            points: 5,
            ..Default::default()
        }));
        let rows = vec![karate, kick];
        let resolver = Resolver::new(&rows, &attrs);
        // Karate: 10 - 2 + 2 = 10. Kicking: 10 - 2 = 8, +4 capped at +2.
        assert_eq!(resolver.level(&rows[0]), Some(10));
        assert_eq!(resolver.level(&rows[1]), Some(10));
        assert_eq!(resolver.best_level_named("kicking", ""), Some(10));
    }
}
