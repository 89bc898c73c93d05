//! core
//!
//! Connection descriptors, configuration and run provenance.
//!
//! # Modules
//!
//! - [`connection`] - Connection descriptors and credential resolution
//! - [`config`] - Config file loading and the connection registry
//! - [`provenance`] - Orchestrator run metadata and commit links
//!
//! Nothing here performs network I/O; the [`crate::store`] layer does.

pub mod config;
pub mod connection;
pub mod provenance;
