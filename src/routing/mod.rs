//! Routing subsystem: the request parser stage.
//!
//! # Data Flow
//! ```text
//! Inbound path-and-query
//!     → matcher.rs (strip hosting prefix, apply fetch pattern)
//!     → target.rs (decode, parse into ProxyTarget)
//!     → router.rs (glue, error mapping)
//!     → Return: ProxyTarget or InvalidUrl / RelativeUrl
//!
//! Pattern Compilation (at startup):
//!     RoutingConfig
//!     → Compile prefix and fetch regexes
//!     → Freeze as immutable PathMatcher
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - Deterministic: same path always yields the same target
//! - Parsing is pure; filtering happens in `security`

pub mod matcher;
pub mod router;
pub mod target;

pub use matcher::{PathMatch, PathMatcher};
pub use router::resolve_target;
pub use target::ProxyTarget;
