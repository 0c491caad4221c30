use std::io;

use crate::block::state::State;

/// A call that the render protocol does not allow right now.
///
/// The tree is left exactly as it was, so the caller can continue with a
/// call that is legal in the current state.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A root-only method called on a nested block, or the reverse.
    #[error("this method cannot be used on this block")]
    WrongMethodForBlock,
    #[error("operation not allowed on a block in state {state}")]
    InvalidState { state: State },
    /// `next` called while the current child is still ready or in progress.
    #[error("next not allowed: child '{child}' is in state {state}")]
    ChildNotFinished { child: String, state: State },
    /// `end` called before the root was completely written.
    #[error("the page has not been written completely (state {state})")]
    NotFinalized { state: State },
    #[error("cannot write to sink: {0}")]
    Io(#[from] io::Error),
}
