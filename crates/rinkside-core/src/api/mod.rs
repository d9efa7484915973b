//! Client for the hosted backend.
//!
//! `ApiClient` talks to the REST data API, the auth API and object storage
//! of a single project. Requests authenticate with the project's public key
//! plus the signed-in user's access token.

pub mod client;
pub mod error;
pub mod storage;

pub use client::{ApiClient, SignUpOutcome};
pub use error::ApiError;
