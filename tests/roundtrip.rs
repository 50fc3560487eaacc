//! Round-trip fidelity of the serializer

mod common;

use common::{key, numbered, sample, SAMPLE};
use mxliff::{serialize, validate_round_trip, validate_with, Document, EngineConfig, RoundTripError, Segment};
use proptest::prelude::*;

fn text(document: &Document) -> String {
    String::from_utf8(serialize(document)).unwrap()
}

#[test]
fn sample_round_trips() {
    assert!(validate_round_trip(SAMPLE.as_bytes()).is_ok());
    assert_eq!(text(&sample()), SAMPLE);
}

#[test]
fn crlf_and_bom_round_trip() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(SAMPLE.replace('\n', "\r\n").as_bytes());
    assert!(validate_round_trip(&bytes).is_ok());
}

#[test]
fn utf16_big_endian_round_trips() {
    let decl = SAMPLE.replacen("encoding=\"UTF-8\"", "encoding=\"UTF-16\"", 1);
    let mut bytes = vec![0xFE, 0xFF];
    for unit in decl.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    assert!(validate_round_trip(&bytes).is_ok());

    let mut doc = Document::load(&bytes).unwrap();
    doc.set_target_segment(&key("u4"), Segment::text("Abbruch")).unwrap_err();
    doc.set_target_segment(&key("u5"), Segment::new([
        mxliff::Run::Text("Schiff → Hafen".into()),
        mxliff::Run::Tag(mxliff::InlineTag::native("ph", mxliff::TagKind::Placeholder, "4", "{0}")),
    ]))
    .unwrap();
    let out = serialize(&doc);
    assert_eq!(&out[..2], &[0xFE, 0xFF]);
    let reloaded = Document::load(&out).unwrap();
    assert_eq!(
        reloaded.get_segments(&key("u5")).unwrap().target.unwrap().plain_text(),
        "Schiff → Hafen"
    );
}

#[test]
fn malformed_input_is_reported_as_parse_error() {
    let truncated = &SAMPLE.as_bytes()[..SAMPLE.len() / 2];
    assert!(matches!(validate_round_trip(truncated), Err(RoundTripError::Parse(_))));
}

#[test]
fn partial_dirty_serialization() {
    let input = numbered(100);
    let mut doc = Document::load(input.as_bytes()).unwrap();
    let target = Segment::new([
        mxliff::Run::Text("Neue Zeile ".into()),
        mxliff::Run::Tag(mxliff::InlineTag::placeholder("x", "42")),
    ]);
    doc.set_target_segment(&key("u42"), target).unwrap();

    let out = text(&doc);
    let edited = "      <trans-unit id=\"u42\">\n        <source>Line 42 <x id=\"42\"/></source>\n        <target>Neue Zeile <x id=\"42\"/></target>\n      </trans-unit>\n";
    let original = "      <trans-unit id=\"u42\">\n        <source>Line 42 <x id=\"42\"/></source>\n      </trans-unit>\n";
    assert_eq!(out, input.replacen(original, edited, 1));
}

#[test]
fn serialization_after_revert_is_identity() {
    let mut doc = sample();
    doc.set_target_segment(&key("u2"), Segment::text("Fisch & Pommes > Salat"))
        .unwrap();
    assert_ne!(text(&doc), SAMPLE);
    doc.revert(&key("u2")).unwrap();
    assert_eq!(text(&doc), SAMPLE);
}

#[test]
fn diff_limit_is_configurable() {
    let config = EngineConfig {
        max_diffs: 1,
        ..EngineConfig::default()
    };
    assert!(validate_with(SAMPLE.as_bytes(), &config).is_ok());
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z0-9 ]{1,8}",
            Just("&amp;".to_string()),
            Just("&lt;".to_string()),
            Just("&apos;".to_string()),
            Just("'".to_string()),
            Just("&#233;".to_string()),
            Just("<![CDATA[a<b]]>".to_string()),
            Just("<!-- c -->".to_string()),
            Just("<g id=\"7\">x</g>".to_string()),
            Just("<x id='8'/>".to_string()),
        ],
        0..6,
    )
    .prop_map(|parts| parts.concat())
}

fn arb_whitespace() -> impl Strategy<Value = String> {
    "[ \t\n]{0,4}"
}

proptest! {
    /// Any generated document serializes back to its exact bytes
    #[test]
    fn prop_unedited_round_trip(
        units in prop::collection::vec((arb_text(), prop::option::of(arb_text()), arb_whitespace()), 0..8),
        quote in prop_oneof![Just('"'), Just('\'')],
    ) {
        let mut body = String::new();
        for (i, (source, target, ws)) in units.iter().enumerate() {
            body.push_str(&format!("{ws}<trans-unit id={q}{i}{q}{ws}>{ws}<source>{source}</source>", q = quote));
            if let Some(target) = target {
                body.push_str(&format!("{ws}<target>{target}</target>"));
            }
            body.push_str(&format!("{ws}</trans-unit>"));
        }
        let input = format!(
            "<?xml version=\"1.0\"?>\n<xliff xmlns=\"urn:oasis:names:tc:xliff:document:1.2\"><file source-language=\"en\"><body>{}</body></file></xliff>",
            body
        );
        prop_assert!(validate_round_trip(input.as_bytes()).is_ok());
    }
}
