use std::fmt;

/// Render-time state of a block.
///
/// ```text
///            OUT
///             | parent start / parent next
///           READY ------------.
///             | start         | skip
///        ACTIVE(0) <--.       |
///             | next  |       |
///        ACTIVE(k)    | start |
///             | next  |       |
///           USED -----'     CLOSED
///             |               |
///             '---------------'-- parent next --> OUT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Not yet reached by the parent in the current pass.
    #[default]
    Out,
    /// The parent is waiting for this block to be started or skipped.
    Ready,
    /// Partially written; the child at this index is the current one.
    Active(usize),
    /// Completely written at least once; may be started again.
    Used,
    /// Skipped for the current repetition of the parent.
    Closed,
}

impl State {
    pub fn is_active(self) -> bool {
        matches!(self, State::Active(_))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Out => write!(f, "OUT"),
            State::Ready => write!(f, "READY"),
            State::Active(k) => write!(f, "ACTIVE({})", k),
            State::Used => write!(f, "USED"),
            State::Closed => write!(f, "CLOSED"),
        }
    }
}
