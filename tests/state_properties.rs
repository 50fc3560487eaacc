//! Property tests for the unit state graph

mod common;

use common::key;
use mxliff::dom::state::{after_target_edit, check_unlock, is_allowed};
use mxliff::{Document, EditError, Segment, UnitState};
use proptest::prelude::*;
use proptest::sample::select;

/// A single untranslated unit
const ONE_UNIT: &str = r#"<xliff xmlns="urn:oasis:names:tc:xliff:document:1.2"><file source-language="en"><body><trans-unit id="u1"><source>Hello</source></trans-unit></body></file></xliff>"#;

fn any_state() -> impl Strategy<Value = UnitState> {
    select(UnitState::ALL.to_vec())
}

/// Drive the unit into `state` along valid edges
fn unit_in(state: UnitState) -> Document {
    let mut doc = Document::load(ONE_UNIT.as_bytes()).unwrap();
    let k = key("u1");
    let path: &[UnitState] = match state {
        UnitState::New => &[],
        UnitState::Translated => &[],
        UnitState::Reviewed => &[UnitState::Reviewed],
        UnitState::Confirmed => &[UnitState::Reviewed, UnitState::Confirmed],
        UnitState::Locked => &[UnitState::Reviewed, UnitState::Confirmed, UnitState::Locked],
    };
    if state != UnitState::New {
        doc.set_target_segment(&k, Segment::text("Hallo")).unwrap();
    }
    for step in path {
        doc.set_state(&k, *step).unwrap();
    }
    assert_eq!(doc.state(&k), Some(state));
    doc
}

proptest! {
    /// Refused transitions leave the unit untouched
    #[test]
    fn prop_set_state_follows_graph(from in any_state(), to in any_state()) {
        let mut doc = unit_in(from);
        let k = key("u1");
        let result = doc.set_state(&k, to);
        if is_allowed(from, to) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(doc.state(&k), Some(to));
        } else {
            let is_invalid_transition = matches!(result, Err(EditError::InvalidTransition { .. }));
            prop_assert!(is_invalid_transition);
            prop_assert_eq!(doc.state(&k), Some(from));
        }
    }

    #[test]
    fn prop_locked_has_no_outgoing_edges(to in any_state()) {
        prop_assert!(!is_allowed(UnitState::Locked, to));
    }

    #[test]
    fn prop_target_edit_demotes(state in any_state(), empty in any::<bool>()) {
        let next = after_target_edit(state, empty);
        match state {
            UnitState::Locked => prop_assert_eq!(next, None),
            UnitState::Reviewed | UnitState::Confirmed => prop_assert_eq!(next, Some(UnitState::Translated)),
            _ => prop_assert!(matches!(next, Some(UnitState::New | UnitState::Translated))),
        }
    }

    #[test]
    fn prop_unlock_targets(current in any_state(), prior in any_state()) {
        let expected = current == UnitState::Locked
            && matches!(prior, UnitState::Translated | UnitState::Reviewed | UnitState::Confirmed);
        prop_assert_eq!(check_unlock(current, prior), expected);
    }

    #[test]
    fn prop_unlock_through_document(prior in any_state()) {
        let mut doc = unit_in(UnitState::Locked);
        let k = key("u1");
        let result = doc.unlock(&k, prior);
        if prior.is_unlock_target() {
            prop_assert!(result.is_ok());
            prop_assert_eq!(doc.state(&k), Some(prior));
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(doc.state(&k), Some(UnitState::Locked));
        }
    }
}
