use charsheet::kinds::{EquipmentData, NoteData, SkillData};
use charsheet::skill_default::SkillDefault;
use charsheet::weapon::WeaponStats;
use charsheet::{CaseSensitivity, Document, Row, RowKind};
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap};

fn keys(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|k| k.to_string()).collect()
}

#[test]
fn nameables_are_collected_per_row_and_applied() {
    let mut doc = Document::new();
    let mut hobby = Row::item(RowKind::Skill(SkillData {
        name: "Hobby Skill (@Subject@)".to_string(),
        defaults: vec![SkillDefault::skill("Connoisseur", "@Subject@", 0)],
        ..Default::default()
    }));
    hobby.set_notes("Ask @Mentor@");
    let mut weapon = WeaponStats::melee();
    weapon.set_usage("@Style@ swing");
    hobby.add_weapon(weapon);

    let mut group = Row::container(RowKind::Note(NoteData::default()));
    group.add_child(Row::item(RowKind::Note(NoteData {
        text: "No placeholders here".to_string(),
    })));

    let hobby_id = doc.add_row(hobby);
    let group_id = doc.add_row(group);

    let found = doc.nameables(&[hobby_id, group_id]);
    assert_eq!(found, vec![(hobby_id, keys(&["Mentor", "Style", "Subject"]))]);

    let values = HashMap::from([
        ("Subject".to_string(), "Wine".to_string()),
        ("Style".to_string(), "Broad".to_string()),
    ]);
    assert!(doc.apply_nameables(hobby_id, &values));
    let row = doc.find(hobby_id).expect("row");
    assert_eq!(row.name(), "Hobby Skill (Wine)");
    assert_eq!(row.weapons()[0].usage(), "Broad swing");
    // Keys without a value stay as typed.
    assert_eq!(row.notes(), "Ask @Mentor@");
    assert!(!doc.apply_nameables(hobby_id, &values));
}

#[test]
fn search_walks_the_tree_in_order() {
    let mut doc = Document::new();
    let group = doc.add_row(Row::container(RowKind::Equipment(EquipmentData {
        description: "Backpack".to_string(),
        ..Default::default()
    })));
    let rope = doc
        .add_child_row(
            group,
            Row::item(RowKind::Equipment(EquipmentData {
                description: "Rope, 10 yards".to_string(),
                ..Default::default()
            })),
        )
        .expect("child");
    let mut skill = Row::item(RowKind::Skill(SkillData {
        name: "Knot-Tying".to_string(),
        ..Default::default()
    }));
    skill.set_categories(["Rope work"]);
    let skill_id = doc.add_row(skill);

    assert_eq!(
        doc.search("rope", CaseSensitivity::Insensitive),
        vec![rope, skill_id]
    );
    assert_eq!(doc.search("rope", CaseSensitivity::Sensitive), Vec::new());
    assert_eq!(
        doc.search("Rope,", CaseSensitivity::Sensitive),
        vec![rope]
    );
}
