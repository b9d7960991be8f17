//! # USOF Shared
//!
//! Request and response types of the forum's HTTP API.
//! Kept free of server dependencies so a client can reuse them.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
