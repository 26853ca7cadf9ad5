//! # Shared Data Transfer Objects Library
//!
//! This library defines the contract between frontend clients and the backend API.
//! All DTOs use JSON serialization via `serde`.
//!
//! ## Structure
//!
//! - **[`dto::auth`]**: Authentication and user management DTOs
//! - **[`dto::restaurant`]**: Catalog, reservation, and dashboard DTOs
//!
//! ## Wire Format
//!
//! - Field names use **snake_case** in Rust, which maps to **snake_case** in JSON
//! - Optional fields are omitted from JSON when `None`
//! - All structs implement both `Serialize` and `Deserialize`

pub mod dto;

// Re-export commonly used types for convenience
pub use dto::*;
