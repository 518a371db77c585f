//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Normalize line endings in raw character data
///
/// `\r\n` and a lone `\r` both become `\n`. Must run on the raw bytes,
/// before entity decoding, so a `&#13;` reference still yields `\r`.
pub fn normalize_line_endings(input: &[u8]) -> Cow<'_, [u8]> {
    let Some(first) = memchr(b'\r', input) else {
        return Cow::Borrowed(input);
    };

    let mut result = Vec::with_capacity(input.len());
    result.extend_from_slice(&input[..first]);
    let mut pos = first;
    while let Some(offset) = memchr(b'\r', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + offset]);
        result.push(b'\n');
        pos += offset + 1;
        if input.get(pos) == Some(&b'\n') {
            pos += 1;
        }
    }
    result.extend_from_slice(&input[pos..]);
    Cow::Owned(result)
}

/// Decode all entity references in the input
pub fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(amp_pos) = memchr(b'&', &input[pos..]) else {
            result.extend_from_slice(&input[pos..]);
            break;
        };

        result.extend_from_slice(&input[pos..pos + amp_pos]);
        pos += amp_pos;

        match memchr(b';', &input[pos..]) {
            Some(semi_offset) => {
                let entity = &input[pos + 1..pos + semi_offset];
                let mut utf8 = [0u8; 4];
                match decode_entity(entity) {
                    Some(c) => {
                        result.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                        pos += semi_offset + 1;
                    }
                    None => {
                        // Unknown entity, keep as-is
                        result.push(b'&');
                        pos += 1;
                    }
                }
            }
            None => {
                result.push(b'&');
                pos += 1;
            }
        }
    }

    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &[u8]) -> Option<char> {
    match entity {
        [] => None,
        [b'#', rest @ ..] => decode_numeric_entity(rest),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        _ => None,
    }
}

/// Decode a numeric character reference
fn decode_numeric_entity(entity: &[u8]) -> Option<char> {
    let codepoint = match entity {
        [] => return None,
        [b'x' | b'X', hex @ ..] => u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?,
        dec => std::str::from_utf8(dec).ok()?.parse::<u32>().ok()?,
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let input = b"Hello, World!";
        let result = decode_text(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let input = b"&lt;hello&gt; &amp; &quot;world&quot;";
        let result = decode_text(input);
        assert_eq!(result.as_ref(), b"<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_decimal_and_hex() {
        assert_eq!(decode_text(b"&#65;&#66;&#67;").as_ref(), b"ABC");
        assert_eq!(decode_text(b"&#x41;&#X42;&#x43;").as_ref(), b"ABC");
    }

    #[test]
    fn test_unicode_entity() {
        let result = decode_text(b"&#x3B2;-thalassemia");
        assert_eq!(std::str::from_utf8(result.as_ref()).unwrap(), "\u{3B2}-thalassemia");
    }

    #[test]
    fn test_unknown_and_unterminated() {
        assert_eq!(decode_text(b"&unknown;").as_ref(), b"&unknown;");
        assert_eq!(decode_text(b"A & B").as_ref(), b"A & B");
        assert_eq!(decode_text(b"&#0;").as_ref(), b"&#0;");
    }

    #[test]
    fn test_line_endings() {
        assert!(matches!(normalize_line_endings(b"a\nb"), Cow::Borrowed(_)));
        assert_eq!(normalize_line_endings(b"a\r\nb").as_ref(), b"a\nb");
        assert_eq!(normalize_line_endings(b"a\rb\r").as_ref(), b"a\nb\n");
        assert_eq!(normalize_line_endings(b"\r\r\n\n").as_ref(), b"\n\n\n");
    }

    #[test]
    fn test_carriage_return_reference_survives_normalization() {
        let normalized = normalize_line_endings(b"a&#13;\r\nb");
        assert_eq!(decode_text(&normalized).as_ref(), b"a\r\nb");
    }
}
