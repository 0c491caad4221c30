use std::ops::Range;

use crate::block::Block;
use crate::block::state::State;
use crate::parser::error::{ParseError, ParseErrorKind};
use crate::parser::tag::{Attributes, TagKind, find_tag};
use crate::segment::{Segment, SegmentStore, decompose};
use crate::variable::VariableTable;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a whole template into its root block and the shared segment store.
pub fn parse_template(source: &str, file_id: usize) -> Result<(Block, SegmentStore), ParseError> {
    let mut state = ParseState {
        source,
        file_id,
        store: SegmentStore::new(),
    };
    let (root, _) = state.parse_block(None, 0..source.len(), 0)?;
    Ok((root, state.store))
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    source: &'a str,
    file_id: usize,
    store: SegmentStore,
}

/// What an opening tag declares.
enum Declaration<'t> {
    Block(&'t str),
    Variable { name: &'t str, place: Option<&'t str> },
}

impl<'a> ParseState<'a> {
    /// Parse the content of a block starting at byte `pos`, up to its
    /// closing tag (or the end of input for the root). Returns the block and
    /// the position just past its closing tag.
    fn parse_block(
        &mut self,
        name: Option<String>,
        open_span: Range<usize>,
        mut pos: usize,
    ) -> Result<(Block, usize), ParseError> {
        let mut children: Vec<Block> = Vec::new();
        let mut variables = VariableTable::new();
        let mut segments: Vec<Segment> = Vec::new();
        let mut gaps = Vec::new();
        let mut gap_end = 0;
        let mut closed = false;

        while let Some(tag) = find_tag(self.source, pos, self.file_id)? {
            gap_end += decompose(&self.source[pos..tag.span.start], &variables, &mut segments);
            pos = tag.span.end;

            let attributes = match tag.kind {
                TagKind::Close if name.is_none() => {
                    return Err(self.error(ParseErrorKind::UnmatchedCloseTag, tag.span));
                }
                TagKind::Close => {
                    closed = true;
                    break;
                }
                TagKind::Open(attributes) => attributes,
            };

            match classify(&attributes).map_err(|kind| self.error(kind, tag.span.clone()))? {
                Declaration::Block(child_name) => {
                    if children.iter().any(|c| c.name() == Some(child_name)) {
                        return Err(self.error(
                            ParseErrorKind::DuplicateBlockName(child_name.to_string()),
                            tag.span,
                        ));
                    }
                    let (child, next) =
                        self.parse_block(Some(child_name.to_string()), tag.span, pos)?;
                    children.push(child);
                    gaps.push(gap_end);
                    pos = next;
                }
                Declaration::Variable { name: var_name, place } => {
                    if variables.index_of(var_name).is_some() {
                        return Err(self.error(
                            ParseErrorKind::DuplicateVariableName(var_name.to_string()),
                            tag.span,
                        ));
                    }
                    let Some(place) = place.filter(|p| !p.is_empty()) else {
                        return Err(self.error(ParseErrorKind::MissingPlaceholder, tag.span));
                    };
                    variables.declare(var_name, place, tag.span);
                }
            }
        }

        match &name {
            None => {
                gap_end += decompose(&self.source[pos..], &variables, &mut segments);
                pos = self.source.len();
            }
            Some(block_name) if !closed => {
                return Err(self.error(
                    ParseErrorKind::UnclosedBlock(block_name.clone()),
                    open_span,
                ));
            }
            Some(_) => {}
        }
        gaps.push(gap_end);

        self.check_placeholders(&variables, &segments)?;

        let range = self.store.append(segments);
        tracing::trace!(
            block = name.as_deref().unwrap_or("<root>"),
            children = children.len(),
            variables = variables.len(),
            segments = range.len(),
            "parsed block"
        );

        let block = Block {
            name,
            children,
            variables,
            segments: range,
            gaps,
            span: open_span.start..pos,
            state: State::Out,
        };
        Ok((block, pos))
    }

    /// Every declared variable must have been matched at least once.
    fn check_placeholders(
        &self,
        variables: &VariableTable,
        segments: &[Segment],
    ) -> Result<(), ParseError> {
        let mut missing: Vec<(&str, Range<usize>)> = variables
            .iter()
            .enumerate()
            .filter(|(index, _)| !segments.iter().any(|s| s.variable == Some(*index)))
            .map(|(_, var)| (var.name.as_str(), var.span.clone()))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_by(|a, b| a.0.cmp(b.0));
        let span = missing[0].1.clone();
        let names = missing.into_iter().map(|(n, _)| n.to_string()).collect();
        Err(self.error(ParseErrorKind::PlaceholderNotFound(names), span))
    }

    fn error(&self, kind: ParseErrorKind, span: Range<usize>) -> ParseError {
        ParseError::new(kind, span, self.file_id)
    }
}

/// Decide what an opening tag declares.
fn classify(attributes: &Attributes) -> Result<Declaration<'_>, ParseErrorKind> {
    match (attributes.get("blk"), attributes.get("var")) {
        (Some(""), _) => Err(ParseErrorKind::EmptyBlockName),
        (Some(_), Some(_)) => Err(ParseErrorKind::BothBlockAndVar),
        (None, None) => Err(ParseErrorKind::MissingAttribute),
        (Some(name), None) => Ok(Declaration::Block(name)),
        (None, Some("")) => Err(ParseErrorKind::EmptyVariableName),
        (None, Some(name)) => Ok(Declaration::Variable {
            name,
            place: attributes.get("place"),
        }),
    }
}
