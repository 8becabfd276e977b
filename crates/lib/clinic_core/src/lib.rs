//! # clinic_core
//!
//! Domain logic for the clinic backend: models, sessions, access rules and
//! storage.

pub mod access;
pub mod auth;
pub mod ids;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
