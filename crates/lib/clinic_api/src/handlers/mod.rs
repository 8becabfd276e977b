//! HTTP request handlers.

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod pages;
pub mod seed;
pub mod treatments;
pub mod users;

use chrono::{NaiveDate, Utc};

/// Server-side calendar date (UTC).
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
