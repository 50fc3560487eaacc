//! Shared fixtures for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use mxliff::{Document, UnitKey};

/// A Memsource export with vendor metadata, comments, mixed indentation and
/// every kind of inline tag
pub const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!-- exported by a TMS -->
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:m="http://www.memsource.com/mxlf/2.0" m:version="2.0">
  <file original="dialogue.json" source-language="en" target-language="de" datatype="x-undefined" m:file-format="JSON" >
    <header>
      <m:job-info task-id="A1" m:workflow-level="1"/>
      <m:extra><![CDATA[raw <stuff>]]></m:extra>
    </header>
    <body>
	<group id="g1">
	  <context-group name="keys"><context context-type="x-key">DLG.Intro.1</context><context context-type="x-key-note">Speaker: Ann
Order: 2</context></context-group>
      <trans-unit id="u1" m:confirmed="1" m:locked="false" m:score="0.98" m:gross-score="0.98">
        <source>Don't press <g id="1" ctype="x-bold">this</g> button!</source>
        <target>Drück <g id="1" ctype="x-bold">diesen</g> Knopf nicht!</target>
        <!-- reviewer: ok -->
        <m:tunit-metadata><m:mark id="9"><m:content>x</m:content></m:mark></m:tunit-metadata>
      </trans-unit>
      <trans-unit id='u2' m:confirmed='0' m:locked='false'>
        <source>Fish &amp; chips &gt; salad</source>
        <target/>
        <note>Comment: menu item</note>
      </trans-unit>
	</group>
      <trans-unit id="u3" state="reviewed">
        <source>Go <bpt id="2">&lt;i&gt;</bpt>now<ept id="2">&lt;/i&gt;</ept> <x id="3"/></source>
        <target>Los <bpt id="2">&lt;i&gt;</bpt>jetzt<ept id="2">&lt;/i&gt;</ept> <x id="3"/></target>
      </trans-unit>
      <trans-unit id="u4" m:locked="true">
        <source>Cancel</source>
        <target>Abbrechen</target>
      </trans-unit>
      <trans-unit id="u5">
        <source>Ship &#x2192; port<ph id="4">{0}</ph></source>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;

pub fn sample() -> Document {
    Document::load(SAMPLE.as_bytes()).expect("sample loads")
}

pub fn key(id: &str) -> UnitKey {
    UnitKey::new(0, id)
}

/// A document with `count` units `u0..u{count-1}`, the odd ones translated
pub fn numbered(count: usize) -> String {
    let mut units = String::new();
    for i in 0..count {
        units.push_str(&format!("      <trans-unit id=\"u{}\">\n        <source>Line {} <x id=\"{}\"/></source>\n", i, i, i));
        if i % 2 == 1 {
            units.push_str(&format!("        <target>Zeile {} <x id=\"{}\"/></target>\n", i, i));
        }
        units.push_str("      </trans-unit>\n");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<xliff version=\"1.2\" xmlns=\"urn:oasis:names:tc:xliff:document:1.2\">\n  <file source-language=\"en\" target-language=\"de\">\n    <body>\n{}    </body>\n  </file>\n</xliff>\n",
        units
    )
}
