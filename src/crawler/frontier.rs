//! Crawl frontier
//!
//! The frontier is a LIFO stack: the most recently discovered link is visited
//! next, which biases discovery towards depth and surfaces distinct deep page
//! templates quickly within a small page budget.

use url::Url;

/// Pending-to-visit addresses for one crawl
#[derive(Debug, Default)]
pub struct Frontier {
    stack: Vec<Url>,
}

impl Frontier {
    /// Creates a frontier holding only the seed address
    pub fn seeded(seed: Url) -> Self {
        Self { stack: vec![seed] }
    }

    pub fn push(&mut self, url: Url) {
        self.stack.push(url);
    }

    /// Removes and returns the most recently pushed address
    pub fn pop(&mut self) -> Option<Url> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_seeded_pops_seed_first() {
        let mut frontier = Frontier::seeded(url("https://example.com/"));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.pop(), Some(url("https://example.com/")));
        assert!(frontier.is_empty());
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn test_last_in_first_out() {
        let mut frontier = Frontier::default();
        frontier.push(url("https://example.com/a"));
        frontier.push(url("https://example.com/b"));
        frontier.push(url("https://example.com/c"));

        assert_eq!(frontier.pop(), Some(url("https://example.com/c")));
        assert_eq!(frontier.pop(), Some(url("https://example.com/b")));
        assert_eq!(frontier.pop(), Some(url("https://example.com/a")));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut frontier = Frontier::default();
        frontier.push(url("https://example.com/a"));
        frontier.push(url("https://example.com/a"));
        assert_eq!(frontier.len(), 2);
    }
}
