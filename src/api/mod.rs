//! API Module
//!
//! HTTP handlers and routing for the demo server.
//!
//! # Endpoints
//! - `GET /page` - Render the demo page through the cache
//! - `GET /stats` - Get cache statistics
//! - `DELETE /cache` - Clear the cache
//! - `DELETE /cache/*key` - Remove one cache entry
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod page;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
