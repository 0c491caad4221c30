pub mod state;

use std::ops::Range;

use crate::block::state::State;
use crate::variable::VariableTable;

/// A block of the template, delimited by `<!--rep blk=NAME-->` and `<!--/rep-->`.
/// The root block spans the whole template and has no name.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) name: Option<String>,
    /// Nested blocks in document order. Names are unique among siblings.
    pub(crate) children: Vec<Block>,
    pub(crate) variables: VariableTable,
    /// This block's own segments in the template's segment store.
    pub(crate) segments: Range<usize>,
    /// End of each text gap around the children, relative to `segments.start`.
    /// Gap `k` precedes child `k`; the last gap follows the last child.
    pub(crate) gaps: Vec<usize>,
    /// Byte span in source (the whole template for the root).
    pub(crate) span: Range<usize>,
    pub(crate) state: State,
}

impl Block {
    /// The block name, or `None` for the root block.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.name.is_none()
    }

    /// Look up a direct child by name.
    pub fn blk(&self, name: &str) -> Option<&Block> {
        self.children.iter().find(|c| c.name() == Some(name))
    }

    pub(crate) fn blk_mut(&mut self, name: &str) -> Option<&mut Block> {
        self.children.iter_mut().find(|c| c.name() == Some(name))
    }

    /// Names of the direct children, in document order.
    pub fn block_names(&self) -> Vec<&str> {
        self.children.iter().filter_map(|c| c.name()).collect()
    }

    /// Names of the variables declared in this block, in declaration order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.names()
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn span(&self) -> &Range<usize> {
        &self.span
    }

    pub fn segments(&self) -> &Range<usize> {
        &self.segments
    }

    /// Absolute store range of text gap `k` (`0..=children.len()`).
    pub fn gap(&self, k: usize) -> Range<usize> {
        let start = if k == 0 { 0 } else { self.gaps[k - 1] };
        (self.segments.start + start)..(self.segments.start + self.gaps[k])
    }

    /// Return this block and its in-progress descendants to `Out`.
    ///
    /// Only the active child can be anything but `Out` at this point:
    /// earlier children were reset by `next` and later ones were never reached.
    pub(crate) fn reset(&mut self) {
        if let State::Active(k) = self.state {
            if let Some(child) = self.children.get_mut(k) {
                child.reset();
            }
        }
        self.state = State::Out;
    }
}
