//! CLI module for storage-sweep
//!
//! This module contains the command-line front end: argument parsing and
//! the session that drives the deletion coordinator.

pub mod commands;

pub use commands::*;
