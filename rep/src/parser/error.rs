use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// The structural problems that make a template unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("empty blk attribute in rep tag")]
    EmptyBlockName,
    #[error("empty var attribute in rep tag")]
    EmptyVariableName,
    #[error("missing blk or var attribute in rep tag")]
    MissingAttribute,
    #[error("found blk and var attributes in rep tag")]
    BothBlockAndVar,
    #[error("missing or empty place attribute in rep tag")]
    MissingPlaceholder,
    #[error("one or more variables not found in block: {}", .0.join(", "))]
    PlaceholderNotFound(Vec<String>),
    #[error("found rep tag closing a block not opened")]
    UnmatchedCloseTag,
    #[error("block has not been closed: {0}")]
    UnclosedBlock(String),
    #[error("repeated block name: {0}")]
    DuplicateBlockName(String),
    #[error("repeated variable name: {0}")]
    DuplicateVariableName(String),
    #[error("repeated attribute in rep tag: {0}")]
    RepeatedAttribute(String),
    #[error("invalid attribute format in rep tag")]
    InvalidAttributeFormat,
    #[error("end of comment not found")]
    UnterminatedTag,
}

/// A parse error with source location information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            kind,
            span,
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let label = match &self.kind {
            ParseErrorKind::UnclosedBlock(_) => "block opened here",
            ParseErrorKind::PlaceholderNotFound(_) => "declared here",
            ParseErrorKind::DuplicateBlockName(_) | ParseErrorKind::DuplicateVariableName(_) => {
                "declared again here"
            }
            _ => "in this tag",
        };
        let notes = match &self.kind {
            ParseErrorKind::PlaceholderNotFound(_) => vec![
                "a placeholder must appear in the block's own text after its declaration"
                    .to_string(),
            ],
            ParseErrorKind::InvalidAttributeFormat => {
                vec!["attributes are written key=value, key='value' or key=\"value\"".to_string()]
            }
            _ => Vec::new(),
        };
        Diagnostic::error()
            .with_message(self.kind.to_string())
            .with_labels(vec![
                Label::primary(self.file_id, self.span.clone()).with_message(label),
            ])
            .with_notes(notes)
    }
}
