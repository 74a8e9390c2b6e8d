//! # bcn
//!
//! Optimal time control for Boolean control networks. A network is given as
//! an ordered mapping from state variables to boolean update expressions
//! over state and input variables; the crate tokenizes and evaluates the
//! expressions, tabulates the algebraic state-space representation, and
//! searches for the shortest control sequence between two states, either
//! over the full state space ([`network::SmallBcn`]) or blockwise over the
//! strongly connected components of the variable dependency graph
//! ([`network::LargeBcn`]).

pub mod eval;
pub mod lexer;
pub mod network;
pub mod vector;
