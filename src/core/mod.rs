//! core
//!
//! Domain types and configuration.
//!
//! # Modules
//!
//! - [`types`] - Items, inventory, site nodes, holds, and stats
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Types mirror the server's wire schema exactly
//! - Schemas are strict and self-describing

pub mod config;
pub mod types;
