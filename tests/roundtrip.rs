use charsheet::kinds::{
    Difficulty, EquipmentData, NoteData, SkillData, SpellData, TechniqueData, TraitData,
};
use charsheet::skill_default::{Attribute, SkillDefault};
use charsheet::weapon::{WeaponKind, WeaponStats};
use charsheet::{Document, LoadState, LoadedSheet, Row, RowKind, SheetFormat, codec, statics};
use pretty_assertions::assert_eq;
use std::io::Write;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const SHEET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<character version="2">
	<attributes st="12" dx="13" iq="10" ht="11" will="10" per="10" striking_st_bonus="0" encumbrance_level="1"/>
	<rows>
		<skill_container version="1" id="5b4f0c2e-3a8e-4a51-9d3f-1c2b3a4d5e6f" open="no">
			<notes>Combat skills</notes>
			<name>Combat</name>
			<difficulty>dx/a</difficulty>
			<points>1</points>
			<skill version="1" id="0d6c8a11-7e4b-4c1f-8b2a-9a8b7c6d5e4f">
				<name>Broadsword</name>
				<difficulty>dx/a</difficulty>
				<points>4</points>
			</skill>
		</skill_container>
		<equipment version="2" id="a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d">
			<description>Rope &amp; hook</description>
			<quantity>1</quantity>
			<value>0</value>
			<weight>3.5</weight>
		</equipment>
	</rows>
</character>
"#;

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

#[test]
fn roundtrip_unmodified_xml_bytes_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("hero.gcs");
    // Non-canonical spacing: only the original bytes can reproduce it.
    let input = SHEET.replace("<rows>", "<rows  >");
    std::fs::write(&path, input.as_bytes())?;

    let sheet = LoadedSheet::load_path(&path)?;
    assert_eq!(sheet.format, SheetFormat::Xml);
    assert!(!sheet.is_modified());
    let out = sheet.save_bytes_for_format(SheetFormat::Xml)?;
    assert_eq!(out, input.as_bytes());
    Ok(())
}

#[test]
fn roundtrip_unmodified_gz_bytes_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("hero.gcs.gz");
    let gz = gzip(SHEET.as_bytes())?;
    std::fs::write(&path, &gz)?;

    let sheet = LoadedSheet::load_path(&path)?;
    assert_eq!(sheet.format, SheetFormat::GzipXml);
    let out = sheet.save_bytes_for_format(SheetFormat::GzipXml)?;
    assert_eq!(out, gz);
    Ok(())
}

#[test]
fn canonical_sheet_regenerates_identically() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("hero.gcs");
    std::fs::write(&path, SHEET.as_bytes())?;

    let sheet = LoadedSheet::load_path(&path)?;
    let regenerated = sheet.generate_bytes_for_format(SheetFormat::Xml)?;
    assert_eq!(String::from_utf8(regenerated)?, SHEET);

    let doc = &sheet.document;
    assert_eq!(doc.attributes().encumbrance_level, 1);
    let group = &doc.rows()[0];
    assert!(group.is_container());
    assert!(!group.is_open());
    assert_eq!(group.children()[0].name(), "Broadsword");
    assert_eq!(group.children()[0].parent(), Some(group.id()));
    assert_eq!(doc.rows()[1].name(), "Rope & hook");
    Ok(())
}

#[test]
fn save_as_gz_then_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let plain = dir.path().join("hero.gcs");
    std::fs::write(&plain, SHEET.as_bytes())?;

    let mut sheet = LoadedSheet::load_path(&plain)?;
    let gz_path = dir.path().join("hero.gcs.gz");
    sheet.save_to_path(&gz_path)?;
    assert_eq!(sheet.format, SheetFormat::GzipXml);
    assert!(!sheet.is_modified());

    let reloaded = LoadedSheet::load_path(&gz_path)?;
    let before: Vec<&Row> = sheet.document.iter().collect();
    let after: Vec<&Row> = reloaded.document.iter().collect();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert!(a.is_equivalent_to(b), "{} differs after reload", a.name());
        assert_eq!(a.id(), b.id());
    }
    Ok(())
}

#[test]
fn version_one_sheet_loads_and_upgrades() -> Result<()> {
    let input = br#"<?xml version="1.0"?>
<character st="14" dx="11">
	<equipment id="a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d">
		<description>Pack</description>
		<weight>12 lb</weight>
	</equipment>
</character>
"#;
    let doc = codec::read_document(input)?;
    assert_eq!(doc.attributes().st, 14);
    assert_eq!(doc.attributes().dx, 11);
    let RowKind::Equipment(pack) = doc.rows()[0].kind() else {
        panic!("expected equipment");
    };
    assert_eq!(pack.weight, 12.0);

    let text = codec::write_document(&doc, statics::NL_LF);
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<character version=\"2\">"));
    assert!(text.contains("<weight>12</weight>"));
    Ok(())
}

#[test]
fn every_kind_survives_a_row_roundtrip() -> Result<()> {
    let mut skill = Row::item(RowKind::Skill(SkillData {
        name: "Shortsword".to_string(),
        points: 8,
        defaults: vec![SkillDefault::skill("Broadsword", "", -2)],
        ..Default::default()
    }));
    skill.set_categories(["Melee", "Combat"]);
    skill.set_notes("line one\nline two");
    let mut weapon = WeaponStats::melee();
    weapon.set_damage("sw+1 cut");
    weapon.set_strength("10");
    weapon.set_parry("0F");
    skill.add_weapon(weapon);

    let mut notes = Row::container(RowKind::Note(NoteData::default()));
    notes.set_open(false);
    notes.add_child(Row::item(RowKind::Note(NoteData {
        text: "Remember the <dragon> & the \"lair\"".to_string(),
    })));

    let gear = Row::item(RowKind::Equipment(EquipmentData {
        description: "Lantern".to_string(),
        quantity: 2,
        weight: 1.25,
        ..Default::default()
    }));

    let mut leveled = Row::item(RowKind::Trait(TraitData {
        name: "Striking ST".to_string(),
        levels: Some(12_000),
        base_points: -3,
        points_per_level: 5,
        ..Default::default()
    }));
    leveled.add_weapon(WeaponStats::new(WeaponKind::Ranged {
        accuracy: "3".to_string(),
        range: "10/100".to_string(),
        rate_of_fire: "1".to_string(),
    }));

    let technique = Row::item(RowKind::Technique(TechniqueData {
        name: "Disarming".to_string(),
        default: SkillDefault::skill("Broadsword", "", -1_500),
        limit: Some(150),
        difficulty: Difficulty::Hard,
        points: 3,
        ..Default::default()
    }));

    let spell = Row::item(RowKind::Spell(SpellData {
        name: "Fireball".to_string(),
        college: "Fire".to_string(),
        spell_class: "Missile".to_string(),
        casting_cost: "1 to 3".to_string(),
        duration: "Instant".to_string(),
        attribute: Attribute::Iq,
        difficulty: Difficulty::Hard,
        points: 120_000,
        ..Default::default()
    }));

    for row in [skill, notes, gear, leveled, technique, spell] {
        let text = codec::write_row(&row, false, statics::NL_LF);
        let back = codec::read_row(text.as_bytes(), LoadState::default())?;
        assert!(row.is_equivalent_to(&back), "{text}");
        assert_eq!(codec::write_row(&back, false, statics::NL_LF), text);
    }
    Ok(())
}

#[test]
fn empty_document_writes_minimal_sheet() {
    let doc = Document::new();
    let text = codec::write_document(&doc, statics::NL_LF);
    assert_eq!(
        text,
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <character version=\"2\">\n\
         \t<attributes st=\"10\" dx=\"10\" iq=\"10\" ht=\"10\" will=\"10\" per=\"10\" striking_st_bonus=\"0\" encumbrance_level=\"0\"/>\n\
         \t<rows>\n\
         \t</rows>\n\
         </character>\n"
    );
}
