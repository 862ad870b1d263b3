//! HTTP client module with response classification and error handling.

mod client;
mod status;

pub use client::HttpClient;
pub use status::{check_status, error_message};
