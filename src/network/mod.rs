//! Boolean control networks and their optimal time control.

mod enumerate;
mod large;
mod partition;
mod small;

pub use large::*;
pub use small::*;

use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{eval::EvalError, lexer::LexError, vector::VectorError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    Lex(LexError),
    Eval(EvalError),
    Vector(VectorError),
    /// A state description with the wrong length, a non-bit entry, or a
    /// position outside the state space.
    InvalidInitialState(String),
    /// No control sequence of at most `t_max` steps connects the states.
    Unreachable {
        init: usize,
        dest: usize,
        t_max: usize,
    },
    /// The block decomposition violates its own ordering invariant.
    InconsistentPartition(String),
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Lex(error) => error.fmt(f),
            NetworkError::Eval(error) => error.fmt(f),
            NetworkError::Vector(error) => error.fmt(f),
            NetworkError::InvalidInitialState(message) => {
                f.write_fmt(format_args!("invalid state: {message}"))
            }
            NetworkError::Unreachable { init, dest, t_max } => f.write_fmt(format_args!(
                "no control sequence of at most {t_max} steps drives state {init} to state {dest}"
            )),
            NetworkError::InconsistentPartition(message) => {
                f.write_fmt(format_args!("inconsistent block partition: {message}"))
            }
        }
    }
}

impl Error for NetworkError {}

impl From<LexError> for NetworkError {
    fn from(error: LexError) -> Self {
        NetworkError::Lex(error)
    }
}

impl From<EvalError> for NetworkError {
    fn from(error: EvalError) -> Self {
        NetworkError::Eval(error)
    }
}

impl From<VectorError> for NetworkError {
    fn from(error: VectorError) -> Self {
        NetworkError::Vector(error)
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;
