//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to target:
//!     → timeouts.rs (one deadline over connect, send and response read)
//!     → On failure: terminal error, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every outbound call has a deadline
//! - No retries: targets are arbitrary third parties and requests may not be idempotent

pub mod timeouts;

pub use timeouts::with_deadline;
