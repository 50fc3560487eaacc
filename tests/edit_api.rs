//! Edit API behavior against a realistic document

mod common;

use common::{key, sample, SAMPLE};
use mxliff::analysis::{dialogue_order, note_fields, Stats};
use mxliff::{
    serialize, EditError, InlineTag, Run, Segment, SegmentRole, TagForm, UnitKey, UnitState,
};

fn text(document: &mxliff::Document) -> String {
    String::from_utf8(serialize(document)).unwrap()
}

fn bold_target(word: &str) -> Segment {
    Segment::new([
        Run::Text("Drück ".into()),
        Run::Tag(InlineTag::start("g", "1").with_attribute("ctype", "x-bold")),
        Run::Text(word.into()),
        Run::Tag(InlineTag::end("g", "1")),
        Run::Text(" Knopf nicht!".into()),
    ])
}

#[test]
fn read_accessors() {
    let doc = sample();
    assert_eq!(doc.file_count(), 1);
    let info = doc.file_info(0).unwrap();
    assert_eq!(info.target_language.as_deref(), Some("de"));
    assert_eq!(info.unit_count, 5);

    let states: Vec<_> = doc.list_units(0).into_iter().map(|u| (u.key.id, u.state)).collect();
    assert_eq!(
        states,
        vec![
            ("u1".to_string(), UnitState::Confirmed),
            ("u2".to_string(), UnitState::New),
            ("u3".to_string(), UnitState::Reviewed),
            ("u4".to_string(), UnitState::Locked),
            ("u5".to_string(), UnitState::New),
        ]
    );

    let pair = doc.get_segments(&key("u2")).unwrap();
    assert_eq!(pair.source.plain_text(), "Fish & chips > salad");
    assert!(pair.target.unwrap().is_empty());

    let u3 = doc.get_segments(&key("u3")).unwrap();
    let tags: Vec<_> = u3.source.tags().collect();
    assert_eq!(tags[0].form, TagForm::Native("&lt;i&gt;".into()));
    assert_eq!(u3.source.tag_ids(), vec!["2", "2", "3"]);

    assert_eq!(doc.get_segments(&key("u5")).unwrap().source.plain_text(), "Ship \u{2192} port");

    let meta = doc.unit_metadata(&key("u1")).unwrap();
    assert_eq!(meta.attributes, vec![r#"m:score="0.98""#, r#"m:gross-score="0.98""#]);
    assert_eq!(meta.elements.len(), 1);
    assert!(doc.prolog().ends_with("<!-- exported by a TMS -->\n"));
    assert!(doc.file_header(0).unwrap().contains("m:job-info"));
}

#[test]
fn context_and_notes() {
    let doc = sample();
    let context = doc.context(&key("u2")).unwrap();
    assert_eq!(context.key.as_deref(), Some("DLG.Intro.1"));
    assert_eq!(doc.note(&key("u2")).as_deref(), Some("Comment: menu item"));

    let fields = note_fields(&doc, &key("u1")).unwrap();
    assert_eq!(fields.speaker.as_deref(), Some("Ann"));
    assert_eq!(fields.order, 2);
    assert_eq!(note_fields(&doc, &key("u2")).unwrap().comments, vec!["Comment: menu item"]);

    let order: Vec<_> = dialogue_order(&doc, 0).into_iter().map(|k| k.id).collect();
    assert_eq!(order, vec!["u1", "u2", "u3", "u4", "u5"]);
}

#[test]
fn tag_pairing_preserved() {
    let mut doc = sample();
    let err = doc
        .set_target_segment(&key("u1"), Segment::text("Drück diesen Knopf nicht!"))
        .unwrap_err();
    assert_eq!(
        err,
        EditError::TagMismatch {
            unit_id: "u1".into(),
            missing: vec!["1".into()],
            extra: vec![],
            unpaired: vec![],
        }
    );
    assert_eq!(
        doc.get_segments(&key("u1")).unwrap().target.unwrap().plain_text(),
        "Drück diesen Knopf nicht!"
    );
    assert_eq!(text(&doc), SAMPLE);
}

#[test]
fn extra_and_unpaired_tags_rejected() {
    let mut doc = sample();
    let extra = Segment::new([
        Run::Text("Los jetzt ".into()),
        Run::Tag(InlineTag::placeholder("x", "3")),
        Run::Tag(InlineTag::placeholder("x", "99")),
    ]);
    match doc.set_target_segment(&key("u3"), extra).unwrap_err() {
        EditError::TagMismatch { missing, extra, .. } => {
            assert_eq!(missing, vec!["2", "2"]);
            assert_eq!(extra, vec!["99"]);
        }
        other => panic!("unexpected {:?}", other),
    }

    // Both halves present but the end comes first
    let reversed = Segment::new([
        Run::Tag(InlineTag::native("ept", mxliff::TagKind::Close, "2", "&lt;/i&gt;")),
        Run::Text("jetzt".into()),
        Run::Tag(InlineTag::native("bpt", mxliff::TagKind::Open, "2", "&lt;i&gt;")),
        Run::Tag(InlineTag::placeholder("x", "3")),
    ]);
    match doc.set_target_segment(&key("u3"), reversed).unwrap_err() {
        EditError::TagMismatch { missing, extra, unpaired, .. } => {
            assert!(missing.is_empty() && extra.is_empty());
            assert!(!unpaired.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(doc.state(&key("u3")), Some(UnitState::Reviewed));
}

#[test]
fn reordered_tags_accepted() {
    let mut doc = sample();
    let reordered = Segment::new([
        Run::Tag(InlineTag::placeholder("x", "3")),
        Run::Text(" Los ".into()),
        Run::Tag(InlineTag::native("bpt", mxliff::TagKind::Open, "2", "&lt;i&gt;")),
        Run::Text("jetzt".into()),
        Run::Tag(InlineTag::native("ept", mxliff::TagKind::Close, "2", "&lt;/i&gt;")),
    ]);
    doc.set_target_segment(&key("u3"), reordered).unwrap();
    assert_eq!(doc.state(&key("u3")), Some(UnitState::Translated));
    assert!(text(&doc).contains(
        r#"<trans-unit id="u3" state="translated">
        <source>Go <bpt id="2">&lt;i&gt;</bpt>now<ept id="2">&lt;/i&gt;</ept> <x id="3"/></source>
        <target><x id="3"/> Los <bpt id="2">&lt;i&gt;</bpt>jetzt<ept id="2">&lt;/i&gt;</ept></target>"#
    ));
}

#[test]
fn demotion_and_locking() {
    let mut doc = sample();
    doc.set_target_segment(&key("u1"), bold_target("den")).unwrap();
    assert_eq!(doc.state(&key("u1")), Some(UnitState::Translated));
    let out = text(&doc);
    assert!(out.contains(r#"<trans-unit id="u1" m:confirmed="0" m:locked="false" m:score="0.98" m:gross-score="0.98">"#));
    assert!(out.contains(r#"<target>Drück <g id="1" ctype="x-bold">den</g> Knopf nicht!</target>"#));
    assert!(out.contains("<!-- reviewer: ok -->"));

    let err = doc.set_target_segment(&key("u4"), Segment::text("Abbruch")).unwrap_err();
    assert_eq!(err, EditError::LockedUnit { unit_id: "u4".into() });
    assert_eq!(doc.state(&key("u4")), Some(UnitState::Locked));
}

#[test]
fn full_workflow_with_hints() {
    let mut doc = sample();
    let k = key("u2");
    doc.set_target_segment(&k, Segment::text("Fisch & Pommes > Salat")).unwrap();
    doc.set_state(&k, UnitState::Reviewed).unwrap();
    doc.set_state(&k, UnitState::Confirmed).unwrap();
    doc.set_state(&k, UnitState::Locked).unwrap();
    assert!(doc.set_state(&k, UnitState::Translated).is_err());

    let out = text(&doc);
    // The locked hint alone expresses the state
    assert!(out.contains("<trans-unit id='u2' m:confirmed='0' m:locked='true'>"));
    assert!(out.contains("<target>Fisch &amp; Pommes &gt; Salat</target>"));

    doc.unlock(&k, UnitState::Reviewed).unwrap();
    let out = text(&doc);
    assert!(out.contains("<trans-unit id='u2' m:confirmed='0' m:locked='false' state='reviewed'>"));
}

#[test]
fn source_is_read_only() {
    let mut doc = sample();
    let err = doc
        .set_segment(&key("u1"), SegmentRole::Source, Segment::text("x"))
        .unwrap_err();
    assert_eq!(err, EditError::ReadOnlyViolation { unit_id: "u1".into() });
}

#[test]
fn unknown_units() {
    let mut doc = sample();
    assert!(doc.get_segments(&key("nope")).is_none());
    assert!(matches!(
        doc.set_state(&UnitKey::new(0, "nope"), UnitState::Translated),
        Err(EditError::UnknownUnit { .. })
    ));
}

#[test]
fn marker_text_edit() {
    let mut doc = sample();
    let source = doc.get_segments(&key("u1")).unwrap().source;
    let target = Segment::from_markers("Drück {1>das<1} nicht!", &source);
    assert_eq!(target.tag_ids(), vec!["1"]);
    doc.set_target_segment(&key("u1"), target).unwrap();
    assert!(text(&doc).contains(r#"<target>Drück <g id="1" ctype="x-bold">das</g> nicht!</target>"#));
}

#[test]
fn history_and_dirty_tracking() {
    let mut doc = sample();
    assert!(!doc.is_dirty());
    doc.set_state(&key("u3"), UnitState::Confirmed).unwrap();
    doc.set_target_segment(&key("u5"), Segment::new([
        Run::Text("Schiff".into()),
        Run::Tag(InlineTag::native("ph", mxliff::TagKind::Placeholder, "4", "{0}")),
    ]))
    .unwrap();
    assert_eq!(doc.dirty_units(), vec![key("u3"), key("u5")]);
    assert_eq!(doc.previous_revision(&key("u3")).unwrap().state, UnitState::Reviewed);
    assert!(doc.previous_revision(&key("u1")).is_none());

    let stats = Stats::collect(&doc);
    assert_eq!(stats.states.get(&UnitState::Confirmed), Some(&2));
}
