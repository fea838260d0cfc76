//! Chunk-resumable HTML tokenizer with a constrained, practical tag-name
//! character set (ASCII `[A-Za-z0-9:_-]`, same for attribute names).
//!
//! Input arrives in arbitrary slices; constructs that are not yet complete
//! (a partial tag, a comment without its terminator, a possible entity tail,
//! a rawtext close-tag prefix) are carried in the internal buffer and
//! consumed once later chunks complete them. `finish` flushes the carry with
//! lenient end-of-stream fallbacks, so no input is silently dropped.
//!
//! This is not a full HTML5 state machine; the constraint keeps tokenization
//! fast and allocation-light, and parse-error recovery is out of scope for
//! this layer.

use crate::entities::{decode_entities, entity_tail_start};
use memchr::{memchr, memrchr};

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";
const DOCTYPE_START: &[u8] = b"<!doctype";

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Data,
    RawText(RawTag),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RawTag {
    Script,
    Style,
}

impl RawTag {
    fn name(self) -> &'static str {
        match self {
            RawTag::Script => "script",
            RawTag::Style => "style",
        }
    }

    fn close_tag(self) -> &'static [u8] {
        match self {
            RawTag::Script => b"</script",
            RawTag::Style => b"</style",
        }
    }

    fn for_name(name: &str) -> Option<Self> {
        match name {
            "script" => Some(RawTag::Script),
            "style" => Some(RawTag::Style),
            _ => None,
        }
    }
}

pub struct Tokenizer {
    buf: String,
    state: State,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            state: State::Data,
        }
    }

    /// Feed a decoded chunk and append every token it completes to `out`.
    pub fn push(&mut self, text: &str, out: &mut Vec<Token>) {
        if text.is_empty() {
            return;
        }
        self.buf.push_str(text);
        self.drain(out, false);
    }

    /// Signal end of input and flush whatever is still buffered.
    pub fn finish(&mut self, out: &mut Vec<Token>) {
        self.drain(out, true);
        if let State::RawText(tag) = self.state {
            // Rawtext whose content was already flushed still owes its
            // implicit end tag.
            out.push(Token::EndTag(tag.name().to_string()));
        }
        self.buf.clear();
        self.state = State::Data;
    }

    fn drain(&mut self, out: &mut Vec<Token>, eof: bool) {
        let buf = std::mem::take(&mut self.buf);
        let bytes = buf.as_bytes();
        let len = bytes.len();
        let mut state = self.state;
        let mut i = 0usize;

        while i < len {
            match state {
                State::RawText(tag) => {
                    if let Some((rel_start, rel_end)) =
                        find_rawtext_close_tag(&buf[i..], tag.close_tag())
                    {
                        if rel_start > 0 {
                            out.push(Token::Text(buf[i..i + rel_start].to_string()));
                        }
                        out.push(Token::EndTag(tag.name().to_string()));
                        i += rel_end;
                        state = State::Data;
                        continue;
                    }
                    if eof {
                        // Missing close tag: emit the remainder as rawtext and
                        // an implicit end tag.
                        if i < len {
                            out.push(Token::Text(buf[i..].to_string()));
                        }
                        out.push(Token::EndTag(tag.name().to_string()));
                        i = len;
                        state = State::Data;
                        break;
                    }
                    // Everything before the last `<` can no longer start the
                    // close tag; hold the rest for the next chunk.
                    let hold = memrchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
                    if hold > i {
                        out.push(Token::Text(buf[i..hold].to_string()));
                    }
                    i = hold;
                    break;
                }
                State::Data => {
                    let Some(rel) = memchr(b'<', &bytes[i..]) else {
                        // Pure text tail. Hold back a possible split entity.
                        let hold = if eof {
                            len
                        } else {
                            entity_tail_start(&buf[i..]).map_or(len, |rel| i + rel)
                        };
                        push_text(out, &buf[i..hold]);
                        i = hold;
                        break;
                    };
                    let lt = i + rel;
                    if lt > i {
                        push_text(out, &buf[i..lt]);
                        i = lt;
                    }

                    let rest = &bytes[i..];
                    if !eof && is_partial_markup_prefix(rest) {
                        break;
                    }

                    if buf[i..].starts_with(HTML_COMMENT_START) {
                        let body_start = i + HTML_COMMENT_START.len();
                        match buf[body_start..].find(HTML_COMMENT_END) {
                            Some(end) => {
                                out.push(Token::Comment(
                                    buf[body_start..body_start + end].to_string(),
                                ));
                                i = body_start + end + HTML_COMMENT_END.len();
                            }
                            None if eof => {
                                out.push(Token::Comment(buf[body_start..].to_string()));
                                i = len;
                            }
                            None => break,
                        }
                        continue;
                    }

                    if starts_with_ignore_ascii_case(rest, DOCTYPE_START) {
                        match memchr(b'>', rest) {
                            Some(end) => {
                                // Token carries the raw declaration body,
                                // trimmed ("DOCTYPE html").
                                out.push(Token::Doctype(buf[i + 2..i + end].trim().to_string()));
                                i += end + 1;
                            }
                            None if eof => {
                                i = len;
                            }
                            None => break,
                        }
                        continue;
                    }

                    if rest.len() >= 2 && rest[1] == b'/' {
                        let name_start = i + 2;
                        let mut j = name_start;
                        while j < len && is_name_byte(bytes[j]) {
                            j += 1;
                        }
                        match memchr(b'>', &bytes[j..]) {
                            Some(end) => {
                                out.push(Token::EndTag(buf[name_start..j].to_ascii_lowercase()));
                                i = j + end + 1;
                            }
                            None if eof => {
                                out.push(Token::EndTag(buf[name_start..j].to_ascii_lowercase()));
                                i = len;
                            }
                            None => break,
                        }
                        continue;
                    }

                    if rest.len() >= 2 && rest[1].is_ascii_alphabetic() {
                        let tag_end = find_tag_end(&bytes[i + 1..]);
                        let (slice_end, next) = match tag_end {
                            Some(gt) => (i + 1 + gt, i + 1 + gt + 1),
                            None if eof => (len, len),
                            None => break,
                        };
                        let (name, attributes, self_closing) =
                            parse_start_tag(&buf[i + 1..slice_end]);
                        let raw = (!self_closing)
                            .then(|| RawTag::for_name(&name))
                            .flatten();
                        out.push(Token::StartTag {
                            name,
                            attributes,
                            self_closing,
                        });
                        i = next;
                        if let Some(tag) = raw {
                            state = State::RawText(tag);
                        }
                        continue;
                    }

                    if rest.len() >= 2 && (rest[1] == b'!' || rest[1] == b'?') {
                        // Bogus markup declaration: consume to `>` and drop.
                        match memchr(b'>', rest) {
                            Some(end) => i += end + 1,
                            None if eof => i = len,
                            None => break,
                        }
                        continue;
                    }

                    // `<` that opens nothing tag-like is literal text.
                    push_text(out, "<");
                    i += 1;
                }
            }
        }

        let mut buf = buf;
        self.buf = buf.split_off(i);
        self.state = state;
    }
}

/// Does `rest` (starting at `<`) still need more bytes before it can be
/// classified or terminated cheaply? Covers a lone `<`, prefixes of `<!--`
/// and `<!doctype`, and `</`.
fn is_partial_markup_prefix(rest: &[u8]) -> bool {
    debug_assert!(!rest.is_empty() && rest[0] == b'<');
    if rest.len() == 1 {
        return true;
    }
    if rest[1] == b'!' {
        let comment = HTML_COMMENT_START.as_bytes();
        if rest.len() < comment.len() && comment.starts_with(rest) {
            return true;
        }
        if rest.len() < DOCTYPE_START.len()
            && DOCTYPE_START[..rest.len()].eq_ignore_ascii_case(rest)
        {
            return true;
        }
    }
    false
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

/// Index of the `>` terminating a start tag, quote-aware so `>` inside a
/// quoted attribute value does not end the tag.
fn find_tag_end(bytes: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(idx),
                _ => {}
            },
        }
    }
    None
}

/// Scan rawtext for `</script`/`</style` followed by optional ASCII
/// whitespace and `>`. Returns (content end, index past `>`).
fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let len = bytes.len();
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= len {
        let rel = memchr(b'<', &bytes[i..])?;
        i += rel;
        if i + n > len {
            return None;
        }
        if bytes[i + 1] == b'/' && starts_with_ignore_ascii_case(&bytes[i..], close_tag) {
            let mut k = i + n;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Parse `name [attrs] [/]` (the inside of a start tag, `<`/`>` stripped).
fn parse_start_tag(tag: &str) -> (String, Vec<(String, Option<String>)>, bool) {
    let bytes = tag.as_bytes();
    let len = bytes.len();

    let mut j = 0;
    while j < len && is_name_byte(bytes[j]) {
        j += 1;
    }
    let name = tag[..j].to_ascii_lowercase();

    let mut attributes: Vec<(String, Option<String>)> = Vec::new();
    let mut self_closing = false;
    let mut k = j;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        if bytes[k] == b'/' {
            if k + 1 == len {
                self_closing = true;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        while k < len && is_name_byte(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let attribute_name = tag[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value: Option<String>;
        if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                while k < len && bytes[k] != quote {
                    k += 1;
                }
                let raw = &tag[vstart..k];
                if k < len {
                    k += 1;
                }
                value = Some(decode_entities(raw));
            } else {
                let vstart = k;
                while k < len
                    && !bytes[k].is_ascii_whitespace()
                    && !(bytes[k] == b'/' && k + 1 == len)
                {
                    k += 1;
                }
                value = Some(tag[vstart..k].to_string());
            }
        } else {
            value = None;
        }
        attributes.push((attribute_name, value));
    }

    if is_void_element(&name) {
        self_closing = true;
    }
    (name, attributes, self_closing)
}

fn push_text(out: &mut Vec<Token>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let decoded = decode_entities(raw);
    if !decoded.is_empty() {
        out.push(Token::Text(decoded));
    }
}
