use serde::{Deserialize, Serialize};
use std::fmt;

/// Java-visible exceptional outcomes. Traps become [`Outcome`]
/// `Throw` at the execute boundary; they never indicate an interpreter
/// defect.
///
/// [`Outcome`]: super::Outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trap {
    DivisionByZero,
    ModuloByZero,
    NegativeArrayLength,
    IndexOutOfBounds,
    InvalidArrayRef,
    LoadBaseNotRef,
    StoreBaseNotRef,
}

impl Trap {
    /// The stable human-readable kind string used in outcome serialization.
    pub fn kind(&self) -> &'static str {
        match self {
            Trap::DivisionByZero => "Division by zero",
            Trap::ModuloByZero => "Modulo by zero",
            Trap::NegativeArrayLength => "Negative array length",
            Trap::IndexOutOfBounds => "Array index out of bounds",
            Trap::InvalidArrayRef => "Invalid array reference",
            Trap::LoadBaseNotRef => "Load base must be a reference",
            Trap::StoreBaseNotRef => "Store base must be a reference",
        }
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl std::error::Error for Trap {}

/// Internal error channel of the evaluator and interpreter.
///
/// `Trap` carries a Java-level exception toward the execute boundary;
/// `Fatal` is an interpreter bug or malformed graph and unwinds the whole
/// `execute` call as `Err`.
#[derive(Debug)]
pub enum EvalError {
    Trap(Trap),
    Fatal(anyhow::Error),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl From<Trap> for EvalError {
    fn from(trap: Trap) -> Self {
        EvalError::Trap(trap)
    }
}

impl From<anyhow::Error> for EvalError {
    fn from(err: anyhow::Error) -> Self {
        EvalError::Fatal(err)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Trap(trap) => write!(f, "trap: {trap}"),
            EvalError::Fatal(err) => write!(f, "fatal: {err}"),
        }
    }
}
