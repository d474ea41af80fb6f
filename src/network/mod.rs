//! HTTP networking module
//!
//! Provides HTTP client functionality for calling the external collaborator services.

mod client;
mod request;

pub use client::HttpClient;
pub use request::{HttpMethod, ServiceRequest, ServiceResponse};
