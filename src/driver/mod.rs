//! The device driver state machine.
//!
//! One [`CliDriver`] per live session: it validates and performs state
//! transitions, sequences multi-step configuration operations, and turns
//! prompt-delimited device output into operation completions.

mod base;
mod extract;
mod state;

pub use base::{CliDriver, OperationCallback};
pub use extract::extract_output;
pub use state::{is_valid_transition, DriverState};
