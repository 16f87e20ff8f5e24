//! Creditflow Core - Domain entities, services, and traits.
//!
//! This crate contains the core business logic for Creditflow.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod banks;
pub mod clients;
pub mod constants;
pub mod errors;
pub mod monitor;
pub mod proposals;
pub mod webhooks;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
