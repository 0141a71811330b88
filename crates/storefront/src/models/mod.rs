//! Types stored in the visitor session and returned by the JSON API.

pub mod session;

pub use session::{ApiResponse, keys as session_keys};
