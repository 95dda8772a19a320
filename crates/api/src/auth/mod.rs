//! Authentication primitives: JWT configuration and token helpers.
//!
//! Token issuance lives in the account service; this crate only validates
//! Bearer tokens presented on HTTP requests and WebSocket upgrades.

pub mod jwt;
