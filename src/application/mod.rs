//! Application services: loading content and caching what was loaded.

pub mod error;
pub mod loader;
pub mod service;
