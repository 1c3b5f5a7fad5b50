//! # Quill Core
//!
//! The domain layer of the Quill blogging backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the slug/excerpt derivation rules, the comment thread assembler,
//! pagination math, and the ports infrastructure must implement.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
