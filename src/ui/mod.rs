//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! User-facing text goes through this module; diagnostics go through
//! `tracing` to stderr. Quiet mode suppresses everything except errors.

pub mod output;
