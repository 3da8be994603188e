//! Concrete interpreter over sea-of-nodes graphs.
//!
//! Control edges are traversed dynamically starting at `Start`; data
//! subgraphs are evaluated on demand with memoization when a control node
//! needs a value (If conditions, range checks, the Return value). Loops are
//! executed by re-entering their header Region and advancing all data Phis
//! simultaneously.

pub mod evaluator;
mod error;
mod heap;
mod interpreter;
mod outcome;
mod value;

pub use error::{EvalError, EvalResult, Trap};
pub use heap::Heap;
pub use interpreter::{Interpreter, Limits};
pub use outcome::{Outcome, OutcomeKind};
pub use value::{RefId, Value};
