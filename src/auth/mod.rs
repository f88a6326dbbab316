//! Cookie-based authentication: private cookie handling and the guard
//! middleware that protects logged-in routes.

pub mod cookie;
pub mod middleware;

pub use middleware::{auth_guard, auth_guard_hx};
