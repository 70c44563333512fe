//! api
//!
//! Client side of the automation server's HTTP API.
//!
//! # Architecture
//!
//! The `AutomationApi` trait defines every request the operator makes.
//! The engine depends only on the trait; commands construct an
//! [`HttpClient`] from configuration and hand it down as `&dyn AutomationApi`.
//!
//! The server is the system of record for inventory and holds:
//! - Every call is a single request with no retry
//! - Hold allocation is atomic per filter and decided by the server
//! - Transport failures propagate to the caller unchanged
//!
//! # Modules
//!
//! - `traits`: `AutomationApi` trait and `ApiError`
//! - `wire`: Hold filters, batch outcomes, and physical operations
//! - [`http`]: reqwest implementation
//! - [`mock`]: Mock implementation for deterministic testing

pub mod http;
pub mod mock;
mod traits;
mod wire;

pub use http::HttpClient;
pub use traits::*;
pub use wire::*;
