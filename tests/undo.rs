use charsheet::kinds::{SkillData, TraitData};
use charsheet::{Document, LoadState, Row, RowKind, codec, statics};
use pretty_assertions::assert_eq;

fn skill(name: &str) -> Row {
    Row::item(RowKind::Skill(SkillData {
        name: name.to_string(),
        ..Default::default()
    }))
}

#[test]
fn undo_load_keeps_children_in_place() {
    let mut group = Row::container(RowKind::Trait(TraitData {
        name: "Advantages".to_string(),
        ..Default::default()
    }));
    group.add_child(Row::item(RowKind::Trait(TraitData {
        name: "Luck".to_string(),
        base_points: 15,
        ..Default::default()
    })));
    let child_id = group.children()[0].id();

    // A full write carries the child; an undo load must ignore it.
    let full = codec::write_row(&group, false, statics::NL_LF);
    group.set_notes("changed");
    codec::load_row_into(&mut group, full.as_bytes(), LoadState::for_undo()).expect("reload");

    assert_eq!(group.notes(), "");
    assert_eq!(group.children().len(), 1);
    assert_eq!(group.children()[0].id(), child_id);
}

#[test]
fn snapshots_for_undo_leave_out_children() {
    let mut group = Row::container(RowKind::Skill(SkillData::default()));
    group.add_child(skill("Hidden"));
    let snapshot = codec::write_row(&group, true, statics::NL_LF);
    assert!(!snapshot.contains("Hidden"));
}

#[test]
fn undo_and_redo_restore_values() {
    let mut doc = Document::new();
    let id = doc.add_row(skill("Fast-Draw"));
    doc.mark_saved();

    doc.begin_edit("Edit Skill", &[id]);
    let row = doc.find_mut(id).expect("row");
    row.set_points(8);
    row.set_notes("sword");
    assert!(doc.end_edit());
    assert!(doc.is_modified());
    assert_eq!(doc.history().undo_name(), Some("Edit Skill"));

    assert!(doc.undo());
    let row = doc.find(id).expect("row");
    let RowKind::Skill(data) = row.kind() else {
        panic!("not a skill");
    };
    assert_eq!(data.points, 1);
    assert_eq!(row.notes(), "");
    assert!(!doc.is_modified());

    assert!(doc.redo());
    let row = doc.find(id).expect("row");
    let RowKind::Skill(data) = row.kind() else {
        panic!("not a skill");
    };
    assert_eq!(data.points, 8);
    assert_eq!(row.notes(), "sword");
    assert!(doc.is_modified());
    assert!(!doc.redo());
}

#[test]
fn undo_of_a_parent_edit_keeps_later_children() {
    let mut doc = Document::new();
    let group = doc.add_row(Row::container(RowKind::Skill(SkillData::default())));

    doc.begin_edit("Rename", &[group]);
    doc.find_mut(group).expect("group").set_notes("combat");
    doc.end_edit();

    let child = doc.add_child_row(group, skill("Spear")).expect("child");
    assert!(doc.undo());

    let restored = doc.find(group).expect("group");
    assert_eq!(restored.notes(), "");
    assert_eq!(restored.children().len(), 1);
    assert_eq!(restored.children()[0].id(), child);
}

#[test]
fn no_op_edits_leave_no_history() {
    let mut doc = Document::new();
    let id = doc.add_row(skill("Hiking"));
    doc.begin_edit("Nothing", &[id]);
    doc.find_mut(id).expect("row").set_points(1);
    assert!(!doc.end_edit());
    assert!(!doc.history().can_undo());
}

#[test]
fn discard_all_forgets_history() {
    let mut doc = Document::new();
    let id = doc.add_row(skill("Hiking"));
    doc.begin_edit("Points", &[id]);
    doc.find_mut(id).expect("row").set_points(4);
    doc.end_edit();
    doc.discard_all_edits();
    assert!(!doc.history().can_undo());
    assert!(!doc.undo());
}
