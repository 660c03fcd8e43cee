//! vidlink — video external-link resolver.
//!
//! Resolves per-platform video identifiers into playable CDN URLs via each
//! platform's undocumented API and answers with a 307 redirect. Successful
//! resolutions are cached as compact path+query fragments so repeat requests
//! skip the upstream call entirely.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod platform;
pub mod redirect;
pub mod resolver;
pub mod server;
pub mod service;
