//! Rep: HTML templates with repeatable blocks.
//!
//! A template is ordinary HTML with comment tags marking blocks and
//! variables:
//!
//! ```text
//! <ul>
//! <!--rep blk=item--><!--rep var=name place=NAME--><li>NAME</li>
//! <!--/rep--></ul>
//! ```
//!
//! The template is parsed once into a tree of [`Block`]s. Output is then
//! produced progressively: each block is started (possibly several times)
//! or skipped, in document order, and every parent writes the text between
//! its children with `next`.

pub mod block;
pub mod parser;
pub mod render;
pub mod segment;
pub mod variable;

use std::io::{self, Read, Write};
use std::path::Path;

pub use crate::block::Block;
pub use crate::block::state::State;
pub use crate::parser::{ParseError, ParseErrorKind, Parser};
pub use crate::render::{BlockMut, RenderError};

use crate::segment::SegmentStore;

/// A parsed template: the root block, the text it is made of, and the sink
/// it writes to once started.
#[derive(Debug)]
pub struct Template<W> {
    pub(crate) root: Block,
    pub(crate) segments: SegmentStore,
    pub(crate) sink: Option<W>,
}

/// Failure to read or parse a template source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read template: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl<W> Template<W> {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Parser::new(source, 0).parse()
    }

    /// Read the whole template from `reader` and parse it.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, LoadError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Ok(Self::parse(&source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source)?)
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    /// Find a block by the names leading to it from the root.
    /// An empty path is the root itself.
    pub fn blk(&self, path: &[&str]) -> Option<&Block> {
        path.iter().try_fold(&self.root, |block, name| block.blk(name))
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    /// The sink bound by the last `start`, if any.
    pub fn sink(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    pub fn sink_mut(&mut self) -> Option<&mut W> {
        self.sink.as_mut()
    }

    pub fn into_sink(self) -> Option<W> {
        self.sink
    }
}

impl<W: Write> Template<W> {
    pub fn root_mut(&mut self) -> BlockMut<'_, W> {
        BlockMut::new(&mut self.root, &self.segments, &mut self.sink)
    }

    /// Mutable handle on the block at `path` (see [`Template::blk`]).
    pub fn block_mut(&mut self, path: &[&str]) -> Option<BlockMut<'_, W>> {
        path.iter()
            .try_fold(self.root_mut(), |handle, name| handle.blk(name))
    }

    /// Start (or restart) a rendering pass writing to `sink`.
    pub fn start(&mut self, sink: W) -> Result<(), RenderError> {
        self.root_mut().start_with(sink)
    }

    /// Write the text after the root's current child.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(), RenderError> {
        self.root_mut().next()
    }

    /// Check that the current pass has been written completely.
    pub fn end(&mut self) -> Result<(), RenderError> {
        self.root_mut().end()
    }

    /// Set a variable declared at the top level of the template.
    pub fn set_var(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<&mut Self, RenderError> {
        self.root_mut().set_var(name, value)?;
        Ok(self)
    }
}
