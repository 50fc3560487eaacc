//! Markup for rebuilt units
//!
//! A dirty unit is rebuilt from its layout records: the start tag is patched
//! in place, untouched children are copied by span, and only a changed
//! target is written from its runs.

use crate::core::attributes::split_name;
use crate::core::entities::{escape_attribute, escape_text, EscapeStyle};
use crate::core::span::Span;
use crate::dom::segment::{Run, Segment, TagForm};
use crate::dom::state::format_flag;
use crate::dom::unit::{ElementRecord, TranslationUnit, UnitPart};

/// Write a whole `trans-unit` element
pub(crate) fn write_unit(out: &mut String, input: &str, unit: &TranslationUnit, style: &EscapeStyle) {
    write_start_tag(out, input, unit);

    for part in &unit.parts {
        match part {
            UnitPart::Verbatim(span) => out.push_str(span.slice(input)),
            UnitPart::Source => out.push_str(unit.source_element.span.slice(input)),
            UnitPart::Target => write_target(out, input, unit, style),
        }
    }

    out.push_str(unit.end_tag.slice(input));
}

/// The unit's start tag with its state attributes brought up to date
fn write_start_tag(out: &mut String, input: &str, unit: &TranslationUnit) {
    let hints = unit.hints().expressing(unit.state);
    let mut patches: Vec<(Span, String)> = Vec::with_capacity(3);

    if let Some(attr) = &unit.state_attr {
        patches.push((attr.value_span, unit.state.as_str().to_string()));
    } else if hints.derive(unit.has_translation()) != unit.state {
        let q = unit.quote;
        let inserted = format!(" state={}{}{}", q, unit.state.as_str(), q);
        patches.push((Span::empty_at(unit.attribute_insert_at as u32), inserted));
    }
    if let (Some(attr), Some(value)) = (&unit.locked_attr, hints.locked) {
        patches.push((attr.value_span, format_flag(&attr.raw, value).to_string()));
    }
    if let (Some(attr), Some(value)) = (&unit.confirmed_attr, hints.confirmed) {
        patches.push((attr.value_span, format_flag(&attr.raw, value).to_string()));
    }
    patches.sort_by_key(|(span, _)| span.start());

    let mut cursor = unit.start_tag.start();
    for (span, text) in patches {
        out.push_str(&input[cursor..span.start()]);
        out.push_str(&text);
        cursor = span.end();
    }
    out.push_str(&input[cursor..unit.start_tag.end()]);
}

fn write_target(out: &mut String, input: &str, unit: &TranslationUnit, style: &EscapeStyle) {
    if !unit.target_changed() {
        if let Some(element) = &unit.target_element {
            out.push_str(element.span.slice(input));
        }
        return;
    }

    let Some(target) = unit.target.as_deref() else {
        return;
    };
    let unpaired = target.check_pairing();
    assert!(
        unpaired.is_empty(),
        "trans-unit '{}' reached the serializer with unpaired inline tags: {}",
        unit.id,
        unpaired.join(", ")
    );

    match &unit.target_element {
        Some(element) => write_existing_target(out, input, element, target, style),
        None if target.is_empty() => {}
        None => {
            // The trans-unit's own prefix is in scope here; the source's may
            // have been declared on the source element itself.
            let (prefix, _) = split_name(unit_qname(input, unit));
            let qname = match prefix {
                Some(prefix) => format!("{}:target", prefix),
                None => "target".to_string(),
            };
            out.push_str(unit.indent.slice(input));
            out.push('<');
            out.push_str(&qname);
            out.push('>');
            write_runs(out, target, style);
            out.push_str("</");
            out.push_str(&qname);
            out.push('>');
        }
    }
}

fn unit_qname<'a>(input: &'a str, unit: &TranslationUnit) -> &'a str {
    let tag = unit.start_tag.slice(input);
    let name = tag.strip_prefix('<').unwrap_or(tag);
    let end = name
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .unwrap_or(name.len());
    &name[..end]
}

fn write_existing_target(out: &mut String, input: &str, element: &ElementRecord, target: &Segment, style: &EscapeStyle) {
    let start_tag = element.start_tag.slice(input);
    if element.empty {
        if target.is_empty() {
            out.push_str(start_tag);
            return;
        }
        // `<target/>` becomes `<target>`
        let open = start_tag.strip_suffix("/>").unwrap_or(start_tag);
        out.push_str(open);
        out.push('>');
    } else {
        out.push_str(start_tag);
    }

    write_runs(out, target, style);
    out.push_str("</");
    out.push_str(&element.qname);
    out.push('>');
}

/// Segment content as XML
pub(crate) fn write_runs(out: &mut String, segment: &Segment, style: &EscapeStyle) {
    for run in segment.runs() {
        match run {
            Run::Text(text) => out.push_str(&escape_text(text, style)),
            Run::Tag(tag) => match &tag.form {
                TagForm::End => {
                    out.push_str("</");
                    out.push_str(&tag.name);
                    out.push('>');
                }
                TagForm::Start => {
                    write_open(out, &tag.name, &tag.attributes);
                    out.push('>');
                }
                TagForm::Empty => {
                    write_open(out, &tag.name, &tag.attributes);
                    out.push_str("/>");
                }
                TagForm::Native(raw) => {
                    write_open(out, &tag.name, &tag.attributes);
                    out.push('>');
                    out.push_str(raw);
                    out.push_str("</");
                    out.push_str(&tag.name);
                    out.push('>');
                }
            },
        }
    }
}

fn write_open(out: &mut String, name: &str, attributes: &[(String, String)]) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value, '"'));
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entities::Apostrophe;
    use crate::dom::segment::InlineTag;

    fn render(segment: &Segment, style: &EscapeStyle) -> String {
        let mut out = String::new();
        write_runs(&mut out, segment, style);
        out
    }

    #[test]
    fn test_runs_with_tags() {
        let segment = Segment::new([
            Run::Text("a < b ".into()),
            Run::Tag(InlineTag::start("g", "1").with_attribute("ctype", "x-\"q\"")),
            Run::Text("c".into()),
            Run::Tag(InlineTag::end("g", "1")),
            Run::Tag(InlineTag::placeholder("x", "2")),
        ]);
        assert_eq!(
            render(&segment, &EscapeStyle::default()),
            r#"a &lt; b <g id="1" ctype="x-&quot;q&quot;">c</g><x id="2"/>"#
        );
    }

    #[test]
    fn test_native_content_verbatim() {
        let segment = Segment::new([Run::Tag(InlineTag::native(
            "ph",
            crate::dom::segment::TagKind::Placeholder,
            "1",
            "&lt;br/&gt;",
        ))]);
        assert_eq!(render(&segment, &EscapeStyle::default()), r#"<ph id="1">&lt;br/&gt;</ph>"#);
    }

    #[test]
    fn test_escape_style_applied() {
        let style = EscapeStyle {
            escape_gt: true,
            escape_quot: false,
            apostrophe: Apostrophe::Named,
        };
        assert_eq!(render(&Segment::text("it's > \"x\""), &style), "it&apos;s &gt; \"x\"");
    }
}
