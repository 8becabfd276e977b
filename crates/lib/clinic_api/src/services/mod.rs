//! Business flows called by the handlers.

pub mod auth;
pub mod cookies;
