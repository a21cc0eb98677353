//! Router modules, split by who may reach them.
//!
//! Access control is attached per module when the routers are merged in `create_router`,
//! so a handler cannot end up public by accident.

/// Anonymous read-only routes. Listings apply the visibility filter in the repository.
pub mod public;

/// Routes behind the `AuthUser` layer. Ownership is checked inside the handlers.
pub mod authenticated;

/// Routes restricted to the "admin" role, nested under `/admin`.
pub mod admin;
