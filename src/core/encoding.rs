//! XML Encoding Detection and Conversion
//!
//! Handles detection of UTF-16 and UTF-8 based on BOM and byte patterns.
//! Input is decoded to UTF-8 for parsing and re-encoded the same way on
//! output, so the encoding itself round-trips.

use crate::error::MalformedXml;

/// Detected text encoding of the raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return XmlEncoding::Utf8;
        }

        match (input[0], input[1]) {
            // UTF-16 LE BOM: 0xFF 0xFE
            (0xFF, 0xFE) => XmlEncoding::Utf16Le,
            // UTF-16 BE BOM: 0xFE 0xFF
            (0xFE, 0xFF) => XmlEncoding::Utf16Be,
            // No BOM - check for UTF-16 pattern (< followed by null or null followed by <)
            (0x00, b'<') => XmlEncoding::Utf16Be,
            (b'<', 0x00) => XmlEncoding::Utf16Le,
            _ => XmlEncoding::Utf8,
        }
    }

    fn bom(self) -> &'static [u8] {
        match self {
            XmlEncoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            XmlEncoding::Utf16Le => &[0xFF, 0xFE],
            XmlEncoding::Utf16Be => &[0xFE, 0xFF],
        }
    }

    fn is_utf16(self) -> bool {
        matches!(self, XmlEncoding::Utf16Le | XmlEncoding::Utf16Be)
    }
}

/// Encoding of a loaded document, including whether it carried a BOM
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SourceEncoding {
    pub encoding: XmlEncoding,
    pub bom: bool,
}

impl SourceEncoding {
    /// Detect encoding and BOM presence
    pub fn detect(input: &[u8]) -> Self {
        let encoding = XmlEncoding::detect(input);
        SourceEncoding {
            encoding,
            bom: input.starts_with(encoding.bom()),
        }
    }

    /// Check an `encoding="..."` label from the XML declaration against the
    /// detected encoding. `ascii_only` tells whether the decoded text is pure
    /// ASCII, which makes ASCII-compatible single-byte labels acceptable.
    pub fn check_label(&self, label: &str, ascii_only: bool) -> Result<(), String> {
        let label = label.trim().to_ascii_lowercase();
        let compatible = match label.as_str() {
            "utf-8" | "utf8" => self.encoding == XmlEncoding::Utf8,
            "utf-16" | "utf16" | "ucs-2" => self.encoding.is_utf16(),
            "utf-16le" => self.encoding == XmlEncoding::Utf16Le,
            "utf-16be" => self.encoding == XmlEncoding::Utf16Be,
            "us-ascii" | "ascii" | "iso-8859-1" | "latin1" | "latin-1" | "windows-1252"
            | "cp1252" => self.encoding == XmlEncoding::Utf8 && ascii_only,
            _ => return Err(format!("unsupported encoding '{}'", label)),
        };

        if compatible {
            Ok(())
        } else {
            Err(format!(
                "encoding declaration '{}' does not match the detected {:?} content",
                label, self.encoding
            ))
        }
    }
}

/// Decode raw input to UTF-8 text, stripping any BOM.
pub fn decode(input: &[u8]) -> Result<(String, SourceEncoding), MalformedXml> {
    let source = SourceEncoding::detect(input);
    let start = if source.bom { source.encoding.bom().len() } else { 0 };
    let bytes = &input[start..];

    let text = match source.encoding {
        XmlEncoding::Utf8 => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(e) => {
                return Err(MalformedXml::at(
                    input,
                    start + e.valid_up_to(),
                    "invalid UTF-8 byte sequence",
                ))
            }
        },
        XmlEncoding::Utf16Le => decode_utf16(input, start, u16::from_le_bytes)?,
        XmlEncoding::Utf16Be => decode_utf16(input, start, u16::from_be_bytes)?,
    };

    Ok((text, source))
}

fn decode_utf16(
    input: &[u8],
    start: usize,
    unit: fn([u8; 2]) -> u16,
) -> Result<String, MalformedXml> {
    let bytes = &input[start..];

    // Ensure even number of bytes
    if bytes.len() % 2 != 0 {
        return Err(MalformedXml::at(
            input,
            input.len().saturating_sub(1),
            "invalid UTF-16: odd number of bytes",
        ));
    }

    let code_units = bytes.chunks_exact(2).map(|chunk| unit([chunk[0], chunk[1]]));

    let mut text = String::with_capacity(bytes.len() / 2);
    for (index, decoded) in char::decode_utf16(code_units).enumerate() {
        match decoded {
            Ok(c) => text.push(c),
            Err(_) => {
                return Err(MalformedXml::at(
                    input,
                    start + index * 2,
                    "invalid UTF-16: unpaired surrogate",
                ))
            }
        }
    }
    Ok(text)
}

/// Encode text back into the document's original encoding
pub fn encode(text: &str, source: SourceEncoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 3);
    if source.bom {
        out.extend_from_slice(source.encoding.bom());
    }

    match source.encoding {
        XmlEncoding::Utf8 => out.extend_from_slice(text.as_bytes()),
        XmlEncoding::Utf16Le => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        XmlEncoding::Utf16Be => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }
    out
}
