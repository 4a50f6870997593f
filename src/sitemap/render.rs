//! Directory-tree rendering for the sitemap
//!
//! Each non-root node becomes one line: the branch glyphs of its ancestors,
//! then `├── ` or `└── ` depending on whether it is its parent's last child,
//! then its label.

use crate::sitemap::tree::SitemapNode;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// One rendered line of the tree
#[derive(Debug, Clone)]
pub struct TreeLine<'a> {
    prefix: String,
    node: &'a SitemapNode,
    depth: usize,
}

impl<'a> TreeLine<'a> {
    /// Branch glyphs preceding the label
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn node(&self) -> &'a SitemapNode {
        self.node
    }

    /// Depth below the root (top-level segments are depth 1)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `├── name`
    pub fn to_plain(&self) -> String {
        format!("{}{}", self.prefix, self.node.name())
    }

    /// `├── [name](full_url)`, falling back to the bare name without an address
    pub fn to_markdown_link(&self) -> String {
        match self.node.full_url() {
            Some(url) => format!("{}[{}]({})", self.prefix, self.node.name(), url),
            None => self.to_plain(),
        }
    }
}

/// Lazy pre-order walk over a sitemap, producing one line per non-root node
pub struct TreeLines<'a> {
    // (node, ancestor prefix, is last child, depth)
    stack: Vec<(&'a SitemapNode, String, bool, usize)>,
}

impl<'a> TreeLines<'a> {
    pub(crate) fn new(root: &'a SitemapNode) -> Self {
        let mut lines = Self { stack: Vec::new() };
        lines.push_children(root, String::new(), 1);
        lines
    }

    fn push_children(&mut self, parent: &'a SitemapNode, prefix: String, depth: usize) {
        let count = parent.children().len();
        // Reversed so the first child is popped first
        for (index, child) in parent.children().iter().enumerate().rev() {
            self.stack
                .push((child, prefix.clone(), index + 1 == count, depth));
        }
    }
}

impl<'a> Iterator for TreeLines<'a> {
    type Item = TreeLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, ancestors, is_last, depth) = self.stack.pop()?;

        let (branch, continuation) = if is_last {
            (LAST_BRANCH, SPACE)
        } else {
            (BRANCH, PIPE)
        };

        self.push_children(node, format!("{}{}", ancestors, continuation), depth + 1);

        Some(TreeLine {
            prefix: format!("{}{}", ancestors, branch),
            node,
            depth,
        })
    }
}
