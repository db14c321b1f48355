//! # Quill Core
//!
//! The domain layer of the Quill blog API.
//! This crate contains the access rules and query scoping with zero infrastructure dependencies.

pub mod access;
pub mod domain;
pub mod error;
pub mod ports;
pub mod query;

pub use access::{Actor, Method};
pub use error::DomainError;
