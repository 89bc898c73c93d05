//! ui
//!
//! User-facing terminal output.
//!
//! # Design
//!
//! Results go to stdout and respect `--quiet`; errors always go to stderr.
//! Diagnostic logging is separate and goes through `tracing`.

pub mod output;
