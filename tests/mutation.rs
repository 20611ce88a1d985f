use charsheet::kinds::{EquipmentData, SkillData};
use charsheet::weapon::WeaponStats;
use charsheet::{Document, NotifierTarget, Row, RowId, RowKind, statics};
use pretty_assertions::assert_eq;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<(Option<RowId>, String)>>,
}

impl NotifierTarget for Recorder {
    fn handle_notification(&self, producer: Option<RowId>, name: &str, _data: Option<&dyn Any>) {
        self.seen.borrow_mut().push((producer, name.to_string()));
    }
}

impl Recorder {
    fn names(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|(_, n)| n.clone()).collect()
    }
}

fn skill(name: &str) -> Row {
    Row::item(RowKind::Skill(SkillData {
        name: name.to_string(),
        ..Default::default()
    }))
}

#[test]
fn detached_rows_change_silently() {
    let doc = Document::new();
    let recorder = Rc::new(Recorder::default());
    doc.notifier().add(&recorder, &[statics::CHARACTER_PREFIX]);

    let mut row = skill("Climbing");
    assert!(row.set_points(4));
    assert!(row.set_name("Climbing!"));
    assert_eq!(row.name(), "Climbing!");
    assert!(recorder.names().is_empty());
    assert!(!doc.is_modified());
}

#[test]
fn attached_changes_reach_listeners_with_their_row() {
    let mut doc = Document::new();
    let id = doc.add_row(skill("Stealth"));
    doc.set_modified(false);

    let recorder = Rc::new(Recorder::default());
    doc.notifier()
        .add(&recorder, &[statics::SKILL_ID_POINTS, statics::skill::IDS.notes]);

    let row = doc.find_mut(id).expect("row");
    assert!(row.set_points(8));
    assert!(!row.set_points(8));
    assert!(row.set_notes("quietly"));
    assert!(row.set_name("Sneaking"));

    assert_eq!(
        *recorder.seen.borrow(),
        vec![
            (Some(id), statics::SKILL_ID_POINTS.to_string()),
            (Some(id), statics::skill::IDS.notes.to_string()),
        ]
    );
    assert!(doc.is_modified());
}

#[test]
fn prefix_listeners_see_the_whole_family() {
    let mut doc = Document::new();
    let recorder = Rc::new(Recorder::default());
    doc.notifier().add(&recorder, &[statics::equipment::IDS.prefix]);

    let gear = doc.add_row(Row::item(RowKind::Equipment(EquipmentData {
        description: "Rope".to_string(),
        ..Default::default()
    })));
    let skill_id = doc.add_row(skill("Knots"));
    let row = doc.find_mut(gear).expect("gear");
    row.set_quantity(3);
    row.set_equipped(false);
    doc.find_mut(skill_id).expect("skill").set_points(2);

    assert_eq!(
        recorder.names(),
        vec![
            statics::equipment::IDS.list_changed.to_string(),
            statics::EQUIPMENT_ID_QUANTITY.to_string(),
            statics::EQUIPMENT_ID_EQUIPPED.to_string(),
        ]
    );
}

#[test]
fn weapon_edits_are_announced_for_the_owning_row() {
    let mut doc = Document::new();
    let recorder = Rc::new(Recorder::default());
    doc.notifier().add(&recorder, &["gcs.character.weapon."]);

    let id = doc.add_row(skill("Broadsword"));
    let row = doc.find_mut(id).expect("row");
    assert!(row.add_weapon(WeaponStats::melee()));
    assert_eq!(row.weapons()[0].owner(), Some(id));
    {
        let mut editor = row.weapon_mut(0).expect("weapon");
        assert!(editor.set_damage("sw+1 cut"));
        assert!(!editor.set_damage("sw+1 cut"));
        assert!(editor.set_parry("0F"));
    }
    assert_eq!(row.weapons()[0].damage(), "sw+1 cut");

    let producers: Vec<Option<RowId>> = recorder.seen.borrow().iter().map(|(p, _)| *p).collect();
    assert_eq!(producers, vec![Some(id); 3]);
    assert_eq!(
        recorder.names(),
        vec![
            statics::WEAPON_ID_LIST_CHANGED.to_string(),
            statics::WEAPON_ID_DAMAGE.to_string(),
            statics::WEAPON_ID_PARRY.to_string(),
        ]
    );
}

#[test]
fn removed_rows_stop_talking() {
    let mut doc = Document::new();
    let id = doc.add_row(skill("Riding"));
    let recorder = Rc::new(Recorder::default());
    doc.notifier().add(&recorder, &[statics::skill::IDS.prefix]);

    let mut row = doc.remove_row(id).expect("removed");
    assert_eq!(recorder.names(), vec![statics::skill::IDS.list_changed.to_string()]);
    row.set_points(12);
    assert_eq!(recorder.seen.borrow().len(), 1);
}

#[test]
fn dropped_listeners_are_pruned() {
    let mut doc = Document::new();
    let recorder = Rc::new(Recorder::default());
    doc.notifier().add(&recorder, &[statics::CHARACTER_PREFIX]);
    assert_eq!(doc.notifier().listener_count(), 1);
    drop(recorder);

    doc.add_row(skill("Swimming"));
    assert_eq!(doc.notifier().listener_count(), 0);
}
