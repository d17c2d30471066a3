//! Data models: configuration and parse results.

pub mod config;
pub mod result;
