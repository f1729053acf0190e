//! Shared helpers for the sales client crates.

pub mod rest_api_helper;
pub mod utils;

pub use rest_api_helper::{cancel_subscription, Subscription};
