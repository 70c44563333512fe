//! Sorting Operator - an operator client for an item-storage automation server
//!
//! `sso` lets an operator browse available stock, reserve it, and trigger
//! physical movement (delivery to a drop-off point, pickup from a chest)
//! against a server that owns the inventory and every concurrency decision.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Catalog merge, hold filters, hold ledger, orchestration
//! - [`api`] - Transport seam to the automation server (HTTP and mock)
//! - [`core`] - Domain types and configuration
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every hold granted during an operation is released exactly once
//! 2. A delivery references at most 27 source slots
//! 3. A pickup always requests exactly 27 empty slots
//! 4. Nothing is retried; the server is the system of record

pub mod api;
pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
