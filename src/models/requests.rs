//! Request DTOs for the demo server
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Maximum accepted length of the `user` query parameter
pub const MAX_USER_LENGTH: usize = 64;

/// Query string for the demo page (GET /page)
///
/// # Fields
/// - `user`: Optional visitor name, rendered into the per-request greeting
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Visitor name
    #[serde(default)]
    pub user: Option<String>,
}

impl PageQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.user {
            Some(user) if user.len() > MAX_USER_LENGTH => Some(format!(
                "User exceeds maximum length of {} characters",
                MAX_USER_LENGTH
            )),
            _ => None,
        }
    }

    /// Visitor name, falling back to a generic greeting target.
    pub fn display_name(&self) -> &str {
        match self.user.as_deref() {
            Some(user) if !user.trim().is_empty() => user,
            _ => "guest",
        }
    }
}
