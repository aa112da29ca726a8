//! Content core for markdown-driven sites.
//!
//! Two pieces do the real work:
//!
//! - [`cache::BoundedCache`] is a least-recently-used map with a hard
//!   capacity and optional time-to-live, plus [`cache::Memo`] for values that
//!   must be recomputed when their dependency key changes.
//! - [`application::loader::ContentLoader`] discovers markdown/MDX files,
//!   parses their front-matter and headings, and aggregates tags, categories
//!   and monthly archives.
//!
//! [`application::service::ContentService`] puts the caches in front of the
//! loader.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
