//! URL handling module for Site-Recce
//!
//! This module provides address normalization, origin extraction and
//! comparison, and query stripping used by the API-call view.

mod normalize;
mod origin;

// Re-export main functions
pub use normalize::normalize_url;
pub use origin::{origin_of, same_origin, strip_query};
