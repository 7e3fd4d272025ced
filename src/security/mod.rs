//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed target:
//!     → filter.rs (host presence, blacklist, scheme allow-list)
//! Inbound request:
//!     → limits.rs (declared length, streamed byte counting)
//!     → headers.rs (strip hop-by-hop / ingress headers, rewrite host)
//!     → Pass to forwarder
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure, before the target is contacted
//! - No trust in client input
//! - Size caps bound worst-case memory per request

pub mod filter;
pub mod headers;
pub mod limits;

pub use filter::TargetFilter;
pub use headers::HeaderRules;
