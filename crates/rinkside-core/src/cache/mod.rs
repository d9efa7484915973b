//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for storing and retrieving
//! team data locally. Data is cached in JSON format and considered
//! stale after 60 minutes. Files can optionally be encrypted at rest.
//!
//! Cached data types include:
//! - Teams and players
//! - Tryouts and their registrations
//! - Regular seasons and season rosters

pub mod crypto;
pub mod manager;

pub use crypto::CacheCipher;
pub use manager::{CacheAges, CacheManager, CachedData};
