use crate::sitemap::render::TreeLines;
use crate::url::origin_of;
use serde::Serialize;
use std::fmt;
use url::Url;

/// One path segment in the sitemap tree
///
/// Child names are unique under a given parent: two addresses sharing a leading
/// segment share the node for it and everything the node already owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapNode {
    name: String,
    full_url: Option<String>,
    children: Vec<SitemapNode>,
}

impl SitemapNode {
    /// Creates the synthetic root, which carries no address
    pub fn root() -> Self {
        Self {
            name: "root".to_string(),
            full_url: None,
            children: Vec::new(),
        }
    }

    fn segment(name: &str, full_url: String) -> Self {
        Self {
            name: name.to_string(),
            full_url: Some(full_url),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address reconstructed up to and including this segment (None for root)
    pub fn full_url(&self) -> Option<&str> {
        self.full_url.as_deref()
    }

    pub fn children(&self) -> &[SitemapNode] {
        &self.children
    }

    /// Finds a direct child by exact segment name
    pub fn child(&self, name: &str) -> Option<&SitemapNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes below this one
    #[cfg(test)]
    fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    /// Lazily walks the non-root nodes in display order
    pub fn lines(&self) -> TreeLines<'_> {
        TreeLines::new(self)
    }

    /// Plain listing, one line per non-root node
    pub fn render(&self) -> Vec<String> {
        self.lines().map(|line| line.to_plain()).collect()
    }

    /// Listing whose labels are Markdown links to each node's address
    pub fn render_links(&self) -> Vec<String> {
        self.lines().map(|line| line.to_markdown_link()).collect()
    }

    /// Reuses the child named `name` or appends a new one
    fn child_or_insert(&mut self, name: &str, full_url: impl FnOnce() -> String) -> &mut Self {
        // Linear scan; fine for crawls bounded to tens of pages
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Self::segment(name, full_url()));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

impl fmt::Display for SitemapNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line.to_plain())?;
        }
        Ok(())
    }
}

/// Builds the sitemap tree for a list of addresses
///
/// Each address's path is split into non-empty segments and walked from the
/// root, reusing a child when one with the same name already exists under the
/// current parent. The function is pure and total: addresses that fail to
/// parse contribute nothing, and the root address contributes no segments.
///
/// # Example
///
/// ```
/// use site_recce::sitemap::build_tree;
///
/// let root = build_tree(["https://example.com/", "https://example.com/a", "https://example.com/a/b"]);
/// let a = root.child("a").unwrap();
/// assert_eq!(a.full_url(), Some("https://example.com/a"));
/// assert_eq!(a.child("b").unwrap().full_url(), Some("https://example.com/a/b"));
/// ```
pub fn build_tree<I, S>(addresses: I) -> SitemapNode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = SitemapNode::root();

    for address in addresses {
        let Ok(url) = Url::parse(address.as_ref()) else {
            tracing::debug!("Sitemap skipping unparseable address {}", address.as_ref());
            continue;
        };

        let origin = origin_of(&url);
        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

        let mut current = &mut root;
        for (depth, segment) in segments.iter().enumerate() {
            current = current.child_or_insert(segment, || {
                format!("{}/{}", origin, segments[..=depth].join("/"))
            });
        }
    }

    root
}
