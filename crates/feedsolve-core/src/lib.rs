//! Core data types for the feedsolve dependency solver.
//!
//! This crate defines the documents a solver consumes and produces:
//! versions and version ranges, architectures, feeds and their
//! implementations, requirements, user preferences, selections,
//! and the solver configuration.
//!
//! This crate is free of network I/O; feeds are handed to it already parsed.

pub mod architecture;
pub mod config;
pub mod feed;
pub mod preferences;
pub mod requirements;
pub mod selection;
pub mod version;
