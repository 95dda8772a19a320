//! Shared types and errors for the BloodBridge backend.

pub mod error;
pub mod protocol;
pub mod types;

pub use error::CoreError;
