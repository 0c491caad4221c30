pub mod error;
pub mod tag;
mod structural;

pub use error::{ParseError, ParseErrorKind};

use crate::Template;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: impl Into<String>, file_id: usize) -> Self {
        Parser {
            source: source.into(),
            file_id,
        }
    }

    /// Parse the whole template into a block tree ready to be rendered.
    /// No tree is produced unless the entire template is valid.
    pub fn parse<W>(&self) -> Result<Template<W>, ParseError> {
        let (root, segments) = structural::parse_template(&self.source, self.file_id)?;
        tracing::debug!(
            file_id = self.file_id,
            blocks = root.children().len(),
            segments = segments.len(),
            "parsed template"
        );
        Ok(Template {
            root,
            segments,
            sink: None,
        })
    }
}
