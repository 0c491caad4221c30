use std::ops::Range;

use crate::variable::VariableTable;

/// A chunk of literal template text, optionally followed by a variable.
///
/// When `variable` is set, rendering writes `text` and then the current
/// value of that variable (an index into the owning block's table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub variable: Option<usize>,
}

/// Append-only storage for the segments of every block in a template.
///
/// Each block owns one contiguous range of the store. Blocks append their
/// segments when they finish parsing, so children precede their parents.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        SegmentStore {
            segments: Vec::new(),
        }
    }

    /// Append a block's segments and return the range they occupy.
    pub fn append(&mut self, segments: Vec<Segment>) -> Range<usize> {
        let start = self.segments.len();
        self.segments.extend(segments);
        start..self.segments.len()
    }

    pub fn get(&self, range: Range<usize>) -> &[Segment] {
        &self.segments[range]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Split `text` into segments at every occurrence of a declared placeholder.
///
/// The earliest placeholder occurrence is consumed first. When several
/// placeholders start at the same offset the longest one wins, and between
/// equal placeholders the one declared first.
/// Always pushes a final untagged segment and returns how many were pushed.
pub fn decompose(text: &str, variables: &VariableTable, out: &mut Vec<Segment>) -> usize {
    let mut rest = text;
    let mut pushed = 0;

    loop {
        let mut next: Option<(usize, usize, usize)> = None;
        for (index, var) in variables.iter().enumerate() {
            if let Some(pos) = rest.find(var.placeholder.as_str()) {
                let len = var.placeholder.len();
                let better = next.is_none_or(|(best, _, best_len)| {
                    pos < best || (pos == best && len > best_len)
                });
                if better {
                    next = Some((pos, index, len));
                }
            }
        }

        pushed += 1;
        match next {
            Some((pos, index, len)) => {
                out.push(Segment {
                    text: rest[..pos].to_string(),
                    variable: Some(index),
                });
                rest = &rest[pos + len..];
            }
            None => {
                out.push(Segment {
                    text: rest.to_string(),
                    variable: None,
                });
                return pushed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(decls: &[(&str, &str)]) -> VariableTable {
        let mut vars = VariableTable::new();
        for (name, place) in decls {
            vars.declare(name, place, 0..0);
        }
        vars
    }

    #[test]
    fn text_without_placeholders_is_one_segment() {
        let mut out = Vec::new();
        assert_eq!(decompose("plain", &table(&[("a", "X")]), &mut out), 1);
        assert_eq!(out, vec![Segment { text: "plain".into(), variable: None }]);
    }

    #[test]
    fn earliest_placeholder_is_taken_first() {
        let vars = table(&[("late", "B"), ("early", "A")]);
        let mut out = Vec::new();
        assert_eq!(decompose("xAyBz", &vars, &mut out), 3);
        assert_eq!(out[0], Segment { text: "x".into(), variable: Some(1) });
        assert_eq!(out[1], Segment { text: "y".into(), variable: Some(0) });
        assert_eq!(out[2], Segment { text: "z".into(), variable: None });
    }

    #[test]
    fn same_offset_prefers_longest() {
        for vars in [
            table(&[("short", "A"), ("long", "AB")]),
            table(&[("long", "AB"), ("short", "A")]),
        ] {
            let mut out = Vec::new();
            decompose("-AB-A", &vars, &mut out);
            let long = vars.index_of("long");
            let short = vars.index_of("short");
            assert_eq!(out[0], Segment { text: "-".into(), variable: long });
            assert_eq!(out[1], Segment { text: "-".into(), variable: short });
            assert_eq!(out[2], Segment { text: "".into(), variable: None });
        }
    }

    #[test]
    fn identical_placeholders_prefer_first_declared() {
        let vars = table(&[("first", "X"), ("second", "X")]);
        let mut out = Vec::new();
        decompose("XX", &vars, &mut out);
        assert!(out.iter().all(|s| s.variable != Some(1)));
    }

    #[test]
    fn store_ranges_are_contiguous() {
        let mut store = SegmentStore::new();
        let first = store.append(vec![Segment { text: "a".into(), variable: None }]);
        let second = store.append(vec![
            Segment { text: "b".into(), variable: None },
            Segment { text: "c".into(), variable: None },
        ]);
        assert_eq!(first, 0..1);
        assert_eq!(second, 1..3);
        assert_eq!(store.get(second)[1].text, "c");
    }
}
