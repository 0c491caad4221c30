use std::fmt;

use rep::RenderError;

/// A render call made by the driver failed, usually because the sink did.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("cannot render block {block}: {source}")]
    Render {
        block: String,
        #[source]
        source: RenderError,
    },
}

impl DriveError {
    pub(crate) fn render(block: &str, source: RenderError) -> Self {
        DriveError::Render {
            block: block.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The key is neither a variable nor a child block.
    UnknownField,
    /// A text or number was given for a child block; the block is skipped.
    ScalarForBlock,
    /// A table was given for a variable; the variable is left alone.
    TableForVariable,
}

/// Data that did not fit the template. Rendering goes on regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Dotted path of the block the data was meant for, `root` at the top.
    pub block: String,
    pub field: String,
    pub kind: WarningKind,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::UnknownField => write!(
                f,
                "{}: '{}' is neither a variable nor a block",
                self.block, self.field
            ),
            WarningKind::ScalarForBlock => write!(
                f,
                "{}: '{}' is a block but was given a value, skipping it",
                self.block, self.field
            ),
            WarningKind::TableForVariable => write!(
                f,
                "{}: '{}' is a variable but was given a table",
                self.block, self.field
            ),
        }
    }
}
