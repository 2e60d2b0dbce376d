//! Core Module
//!
//! Shared building blocks:
//! - Error taxonomy and `Result` alias
//! - Timestamps and content hashes
//! - Injected clock abstraction

pub mod clock;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use types::{now, ContentHash, Timestamp};
