//! Access control: the per-request gate and role-scoped data filtering.

pub mod gate;
pub mod scope;
