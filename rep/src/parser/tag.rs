use std::ops::Range;

use crate::parser::error::{ParseError, ParseErrorKind};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const KEYWORD: &str = "rep";

/// A rep comment tag found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    /// Byte span of the whole comment, `<!--` through `-->`.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    /// `<!--rep key=value ...-->`
    Open(Attributes),
    /// `<!--/rep-->`
    Close,
}

/// Attributes of an opening tag, in source order. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Find the next rep tag at or after `from`.
///
/// Ordinary HTML comments, and comments such as `<!--repeat-->` where the
/// keyword runs into more word characters, are left as text.
pub fn find_tag(source: &str, from: usize, file_id: usize) -> Result<Option<Tag>, ParseError> {
    let mut search = from;

    while let Some(rel) = source[search..].find(COMMENT_OPEN) {
        let start = search + rel;
        let after_open = start + COMMENT_OPEN.len();
        let rest = &source[after_open..];

        let (closing, keyword_end) = if rest.starts_with('/') && rest[1..].starts_with(KEYWORD) {
            (true, after_open + 1 + KEYWORD.len())
        } else if rest.starts_with(KEYWORD) {
            (false, after_open + KEYWORD.len())
        } else {
            search = start + 1;
            continue;
        };

        if source[keyword_end..].chars().next().is_some_and(is_word) {
            search = start + 1;
            continue;
        }

        let Some(rel_end) = source[keyword_end..].find(COMMENT_CLOSE) else {
            return Err(ParseError::new(
                ParseErrorKind::UnterminatedTag,
                start..source.len(),
                file_id,
            ));
        };
        let inner_end = keyword_end + rel_end;
        let span = start..inner_end + COMMENT_CLOSE.len();

        let kind = if closing {
            TagKind::Close
        } else {
            let attributes = parse_attributes(&source[keyword_end..inner_end])
                .map_err(|kind| ParseError::new(kind, span.clone(), file_id))?;
            TagKind::Open(attributes)
        };
        return Ok(Some(Tag { kind, span }));
    }

    Ok(None)
}

/// Parse the text between `rep` and `-->`. All of it must be consumed by
/// `key=value` pairs separated by whitespace.
pub fn parse_attributes(text: &str) -> Result<Attributes, ParseErrorKind> {
    let mut rest = text.trim_end_matches(is_space);
    let mut attributes = Attributes::default();

    while let Some((key, value, consumed)) = match_attribute(rest) {
        if attributes.get(key).is_some() {
            return Err(ParseErrorKind::RepeatedAttribute(key.to_string()));
        }
        attributes.pairs.push((key.to_string(), value.to_string()));
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        return Err(ParseErrorKind::InvalidAttributeFormat);
    }
    Ok(attributes)
}

/// Match one `key=value` pair at the start of `text`, after optional
/// whitespace. Returns the key, the unquoted value and the bytes consumed.
fn match_attribute(text: &str) -> Option<(&str, &str, usize)> {
    let body = text.trim_start_matches(is_space);
    let leading = text.len() - body.len();

    if !body.chars().next().is_some_and(is_word) {
        return None;
    }
    let key_end = body
        .find(|c: char| !(is_word(c) || c == '-'))
        .unwrap_or(body.len());
    let after_eq = body[key_end..].strip_prefix('=')?;

    let (value, value_len) = match after_eq.chars().next() {
        Some(quote @ ('"' | '\'')) => match after_eq[1..].find(quote) {
            Some(close) => (&after_eq[1..1 + close], close + 2),
            // An unterminated quote leaves an empty unquoted value behind.
            None => ("", 0),
        },
        _ => {
            let end = after_eq
                .find(|c: char| c == '"' || c == '\'' || is_space(c))
                .unwrap_or(after_eq.len());
            (&after_eq[..end], end)
        }
    };

    Some((&body[..key_end], value, leading + key_end + 1 + value_len))
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}
