//! # Authentication Library
//!
//! Password hashing, JWT token management, and identity types.

pub mod identity;
pub mod pwd;
pub mod token;

// Re-export commonly used types
pub use identity::{CurrentUser, Role};
pub use pwd::{hash_password, verify_password};
pub use token::{decode_jwt, encode_jwt, Claims};
