//! Core library for rinkside.
//!
//! Shared by the terminal front end and the waiting-list server:
//! - `api`: REST / auth / storage client for the hosted backend
//! - `store`: table access trait with query builder (and an in-memory store for tests)
//! - `models`: rows and insert payloads
//! - `services`: tryout, season, team, player, evaluation, camp, feed and waiting-list workflows
//! - `import`: CSV bulk player import
//! - `auth`, `cache`, `config`: session, offline cache and settings

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod import;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use config::Config;
pub use store::{ObjectStore, Query, Record, Store};
pub use validation::{ValidationError, ValidationErrors};
