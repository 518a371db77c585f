//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a [u8],
    /// Attribute value (whitespace normalized, entities decoded)
    pub value: Cow<'a, [u8]>,
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'.
/// Every attribute must be `name="value"` or `name='value'`.
pub fn parse_attributes(input: &[u8]) -> Result<Vec<Attribute<'_>>, &'static str> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() {
            break;
        }

        let name_start = pos;
        if !is_name_start_char(input[pos]) {
            return Err("attribute name must start with letter, underscore, or colon");
        }
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] != b'=' {
            return Err("attribute value required");
        }
        pos += 1;

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err("attribute value must be quoted"),
        };
        pos += 1;

        let Some(len) = memchr(quote, &input[pos..]) else {
            return Err("attribute value has mismatched quotes");
        };
        let raw = &input[pos..pos + len];
        if memchr(b'<', raw).is_some() {
            return Err("attribute value cannot contain '<'");
        }
        let value = match normalize_value_whitespace(raw) {
            Cow::Borrowed(raw) => decode_text(raw),
            Cow::Owned(spaced) => Cow::Owned(decode_text(&spaced).into_owned()),
        };
        attrs.push(Attribute { name, value });
        pos += len + 1;

        // Attributes must be separated by whitespace
        if pos < input.len() && !is_whitespace(input[pos]) {
            return Err("missing whitespace between attributes");
        }
    }

    Ok(attrs)
}

/// Replace literal line breaks and tabs in a raw value with spaces
///
/// A `\r\n` pair is one line break and becomes a single space. Applied
/// before entity decoding, so `&#10;` and `&#9;` keep their character.
fn normalize_value_whitespace(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.iter().any(|&b| matches!(b, b'\r' | b'\n' | b'\t')) {
        return Cow::Borrowed(raw);
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'\r' => {
                out.push(b' ');
                if raw.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' | b'\t' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    Cow::Owned(out)
}
