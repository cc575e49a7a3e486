//! The blog's operations, independent of HTTP.
//!
//! Each function takes the repository and, where an action needs an actor, an
//! explicit `CurrentUser` or `AdminUser`. Handlers translate requests into these
//! calls and their results into pages or redirects.

pub mod accounts;
pub mod posts;

use crate::error::{AppError, Result};

/// Trims `value` and rejects it if nothing is left.
pub(crate) fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required.")));
    }
    Ok(trimmed.to_string())
}
