//!
//! This crate defines the identifiers that are shared between automata.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod interner;

pub use interner::*;
