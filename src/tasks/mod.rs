//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside request handling.
//!
//! # Tasks
//! - Expiry sweep: Removes stale cache entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
