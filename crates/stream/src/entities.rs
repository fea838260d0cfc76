//! Decode a minimal, explicitly limited subset of HTML entities.
//!
//! Contract:
//! - Named entities decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric entities decoded only when well-formed and semicolon-terminated:
//!   `&#123;` (decimal) and `&#x1F4A9;` (hex). Invalid scalars pass through.
//! - Anything else is left unchanged.
//!
//! Intentionally not HTML5-spec-complete; keep the behavior narrow and stable.

use memchr::memchr;

// Longest decodable entity is `&#x10FFFF;` / `&#1114111;` (10 bytes).
pub(crate) const MAX_ENTITY_LEN: usize = 10;

pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return s.to_string();
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;
    while i < bytes.len() {
        if bytes[i] != b'&' {
            let next = memchr(b'&', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            out.push_str(&s[i..next]);
            i = next;
            continue;
        }
        match decode_one(&s[i..]) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                i += consumed;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
    }
    out
}

/// Decode a single entity at the start of `s` (which begins with `&`).
/// Returns the decoded char and the number of bytes consumed.
fn decode_one(s: &str) -> Option<(char, usize)> {
    let end = memchr(b';', &s.as_bytes()[..s.len().min(MAX_ENTITY_LEN)])?;
    let body = &s[1..end];
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{A0}',
        _ => {
            let digits = body.strip_prefix('#')?;
            let value = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                (!hex.is_empty()).then_some(hex)?;
                u32::from_str_radix(hex, 16).ok()?
            } else {
                (!digits.is_empty()).then_some(digits)?;
                digits.parse::<u32>().ok()?
            };
            char::from_u32(value)?
        }
    };
    Some((decoded, end + 1))
}

/// Position of a trailing `&...` run that could still become an entity once
/// more bytes arrive. Used by the tokenizer to hold such a suffix back so an
/// entity split across chunk boundaries decodes whole.
pub(crate) fn entity_tail_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let window = bytes.len().saturating_sub(MAX_ENTITY_LEN);
    for i in (window..bytes.len()).rev() {
        match bytes[i] {
            b'&' => {
                let tail_is_entity_like = bytes[i + 1..]
                    .iter()
                    .all(|&b| b.is_ascii_alphanumeric() || b == b'#');
                return tail_is_entity_like.then_some(i);
            }
            b';' => return None,
            b if b.is_ascii_whitespace() => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;ok&gt;"), "a & b <ok>");
        assert_eq!(decode_entities("&quot;x&apos;&nbsp;"), "\"x'\u{A0}");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x41;&#x1F600;"), "AA😀");
    }

    #[test]
    fn leaves_malformed_entities_alone() {
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_entities("&#;"), "&#;");
        assert_eq!(decode_entities("&#x;"), "&#x;");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&amp"), "&amp");
    }

    #[test]
    fn entity_tail_is_detected_only_when_plausible() {
        assert_eq!(entity_tail_start("hello &am"), Some(6));
        assert_eq!(entity_tail_start("hello &#x1F60"), Some(6));
        assert_eq!(entity_tail_start("hello &"), Some(6));
        assert_eq!(entity_tail_start("hello &amp;"), None);
        assert_eq!(entity_tail_start("hello & there"), None);
        assert_eq!(entity_tail_start("hello"), None);
        // Too long to still be an entity.
        assert_eq!(entity_tail_start("x &aaaaaaaaaaaaaaa"), None);
    }
}
