//! Credentials and access tokens
//!
//! Pure functions only. HTTP extraction and the per-route access policy live
//! in the service crate.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};
