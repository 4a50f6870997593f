//! Sitemap module
//!
//! Builds a path-segment tree from a crawl's discovered addresses and renders
//! it as a classic directory listing, either as plain text or with each label
//! linked to its reconstructed address.

mod render;
mod tree;

pub use render::{TreeLine, TreeLines};
pub use tree::{build_tree, SitemapNode};
