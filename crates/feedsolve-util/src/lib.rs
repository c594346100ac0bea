//! Shared utilities for feedsolve.
//!
//! This crate provides the cross-cutting concerns used by the other feedsolve
//! crates: the unified error type and a builder for spawning external
//! processes (used by the out-of-process solver).

pub mod errors;
pub mod process;
