pub mod error;

pub use error::RenderError;

use std::io::{self, Write};

use crate::block::Block;
use crate::block::state::State;
use crate::segment::SegmentStore;

/// Mutable handle on one block of a template, used to drive rendering.
///
/// The legal call order for a block with children `c0..cn` is
/// `start`, then for each child some number of `start` (or one `skip`)
/// followed by `next` on this block. Every call made out of order fails
/// with a [`RenderError`] and changes nothing.
pub struct BlockMut<'t, W> {
    block: &'t mut Block,
    segments: &'t SegmentStore,
    sink: &'t mut Option<W>,
}

impl<'t, W: Write> BlockMut<'t, W> {
    pub(crate) fn new(
        block: &'t mut Block,
        segments: &'t SegmentStore,
        sink: &'t mut Option<W>,
    ) -> Self {
        BlockMut {
            block,
            segments,
            sink,
        }
    }

    pub fn block(&self) -> &Block {
        self.block
    }

    pub fn name(&self) -> Option<&str> {
        self.block.name()
    }

    pub fn state(&self) -> State {
        self.block.state
    }

    /// Descend into a direct child, consuming this handle.
    pub fn blk(self, name: &str) -> Option<BlockMut<'t, W>> {
        let BlockMut {
            block,
            segments,
            sink,
        } = self;
        let child = block.blk_mut(name)?;
        Some(BlockMut::new(child, segments, sink))
    }

    /// Borrow a handle on a direct child.
    pub fn child(&mut self, name: &str) -> Option<BlockMut<'_, W>> {
        let child = self.block.blk_mut(name)?;
        Some(BlockMut::new(child, self.segments, &mut *self.sink))
    }

    /// Begin a rendering pass on the root block, writing to `sink`.
    ///
    /// A pass still in progress is abandoned: every block goes back to `Out`.
    /// Variable values are kept. If the first write fails, the previous sink
    /// and every state are left as they were.
    pub fn start_with(&mut self, sink: W) -> Result<(), RenderError> {
        if !self.block.is_root() {
            return Err(RenderError::WrongMethodForBlock);
        }
        let previous = self.sink.replace(sink);
        if let Err(e) = self.write_gap(0) {
            *self.sink = previous;
            return Err(e);
        }
        if self.block.state.is_active() {
            tracing::debug!(state = %self.block.state, "restarting root block");
            self.block.reset();
        }
        self.advance(0);
        Ok(())
    }

    /// Write this nested block (again), up to its first child.
    pub fn start(&mut self) -> Result<(), RenderError> {
        if self.block.is_root() {
            return Err(RenderError::WrongMethodForBlock);
        }
        if !matches!(self.block.state, State::Ready | State::Used) {
            return Err(self.invalid_state());
        }
        self.write_gap(0)?;
        self.advance(0);
        Ok(())
    }

    /// Leave this nested block out of the current repetition of its parent.
    pub fn skip(&mut self) -> Result<(), RenderError> {
        if self.block.is_root() {
            return Err(RenderError::WrongMethodForBlock);
        }
        if self.block.state != State::Ready {
            return Err(self.invalid_state());
        }
        self.transition(State::Closed);
        Ok(())
    }

    /// Close the current child and write the text that follows it.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(), RenderError> {
        let State::Active(k) = self.block.state else {
            return Err(self.invalid_state());
        };
        let child = &self.block.children[k];
        if !matches!(child.state, State::Used | State::Closed) {
            return Err(RenderError::ChildNotFinished {
                child: child.name().unwrap_or_default().to_string(),
                state: child.state,
            });
        }
        self.write_gap(k + 1)?;
        self.block.children[k].state = State::Out;
        self.advance(k + 1);
        Ok(())
    }

    /// Check that the root block has been completely written.
    pub fn end(&self) -> Result<(), RenderError> {
        if !self.block.is_root() {
            return Err(RenderError::WrongMethodForBlock);
        }
        if self.block.state != State::Used {
            return Err(RenderError::NotFinalized {
                state: self.block.state,
            });
        }
        Ok(())
    }

    /// Set a variable of this block for the next time its text is written.
    /// Unknown names are ignored. Not allowed while the block is in progress.
    pub fn set_var(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<&mut Self, RenderError> {
        if self.block.state.is_active() {
            return Err(self.invalid_state());
        }
        if !self.block.variables.assign(name, value) {
            tracing::trace!(block = self.label(), variable = name, "ignoring unknown variable");
        }
        Ok(self)
    }

    /// Write text gap `pos` with every variable replaced by its value.
    /// The root flushes the sink once its last gap is written.
    fn write_gap(&mut self, pos: usize) -> Result<(), RenderError> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no sink bound"))?;

        for segment in self.segments.get(self.block.gap(pos)) {
            sink.write_all(segment.text.as_bytes())?;
            if let Some(index) = segment.variable {
                sink.write_all(self.block.variables.value(index).as_bytes())?;
            }
        }

        if pos == self.block.children.len() && self.block.is_root() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Move on after gap `pos` has been written: make child `pos` ready, or
    /// finish the block when there is no such child.
    fn advance(&mut self, pos: usize) {
        match self.block.children.get_mut(pos) {
            Some(child) => {
                child.state = State::Ready;
                self.transition(State::Active(pos));
            }
            None => self.transition(State::Used),
        }
    }

    fn transition(&mut self, to: State) {
        tracing::debug!(block = self.label(), from = %self.block.state, %to, "transition");
        self.block.state = to;
    }

    fn invalid_state(&self) -> RenderError {
        RenderError::InvalidState {
            state: self.block.state,
        }
    }

    fn label(&self) -> &str {
        self.block.name().unwrap_or("<root>")
    }
}
