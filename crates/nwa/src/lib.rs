//!
//! This crate implements nested word automata: finite automata that read
//! nested words, sequences of symbols in which call and return positions are
//! matched. Next to the automaton itself it offers the closure operations
//! (union, intersection, complement, concatenation, star and reverse),
//! determinization, membership tests and language decision procedures.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod client_info;
mod construct;
mod error;
mod nested_word;
mod nwa;
mod prune;
mod query;
mod random_nwa;
mod simulation;
mod state_set;
mod symbol_set;
mod transition_set;
mod weight_gen;

pub use client_info::*;
pub use error::*;
pub use nested_word::*;
pub use nwa::*;
pub use query::*;
pub use random_nwa::*;
pub use state_set::*;
pub use symbol_set::*;
pub use transition_set::*;
pub use weight_gen::*;
