//! Data Transfer Objects for API communication.

pub mod auth;
pub mod restaurant;

pub use auth::*;
pub use restaurant::*;
