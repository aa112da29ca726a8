//! Domain layer types and invariants.

pub mod content;
pub mod error;
pub mod front_matter;
pub mod headings;
pub mod nav;
pub mod slug;
pub mod taxonomy;
pub mod toc;
