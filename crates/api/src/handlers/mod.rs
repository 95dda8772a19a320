//! HTTP request handlers, one module per resource.

pub mod blood_request;
pub mod notification;
