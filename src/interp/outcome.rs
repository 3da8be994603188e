use std::fmt;

use super::error::Trap;
use super::heap::Heap;
use super::value::Value;

/// Result of executing a graph: a normal return or a signalled exception,
/// together with the post-execution heap snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub heap: Heap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeKind {
    Return(Option<Value>),
    Throw(Trap),
}

impl Outcome {
    pub fn returned(value: Option<Value>, heap: Heap) -> Self {
        Self {
            kind: OutcomeKind::Return(value),
            heap,
        }
    }

    pub fn thrown(trap: Trap, heap: Heap) -> Self {
        Self {
            kind: OutcomeKind::Throw(trap),
            heap,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, OutcomeKind::Return(_))
    }

    pub fn is_throw(&self) -> bool {
        matches!(self.kind, OutcomeKind::Throw(_))
    }

    pub fn return_value(&self) -> Option<Value> {
        match &self.kind {
            OutcomeKind::Return(value) => *value,
            OutcomeKind::Throw(_) => None,
        }
    }

    pub fn trap(&self) -> Option<&Trap> {
        match &self.kind {
            OutcomeKind::Throw(trap) => Some(trap),
            OutcomeKind::Return(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OutcomeKind::Return(Some(value)) => write!(f, "Return({value})"),
            OutcomeKind::Return(None) => write!(f, "Return(void)"),
            OutcomeKind::Throw(trap) => write!(f, "Throw({trap})"),
        }
    }
}
