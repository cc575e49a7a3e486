//! Router Module Index
//!
//! Routes are grouped by who may reach them. Access control is applied per group:
//! the authenticated group sits behind the login middleware, the admin group's
//! handlers all take the `AdminUser` extractor.

/// Routes open to every visitor.
pub mod public;

/// Routes that require a logged-in user; anonymous visitors are sent to `/login`.
pub mod authenticated;

/// Routes restricted to administrators; everybody else gets 403.
pub mod admin;
