//! Render a template from a tree of data instead of driving every block by hand.
//!
//! Each table maps names to values: scalars fill the variables of the
//! current block, nested tables and arrays of tables fill child blocks.

pub mod data;
pub mod error;
pub mod executor;

pub use data::{Entry, Fields};
pub use error::{DriveError, Warning, WarningKind};
pub use executor::render;
