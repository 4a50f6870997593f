//! Deduplicated view of recorded API calls
//!
//! The task keeps every observed request; callers are shown one entry per
//! method and address, ignoring the query string.

use crate::tasks::ApiCallRecord;
use crate::url::strip_query;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// One distinct API endpoint hit while rendering a task's pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiCallSummary {
    /// Upper-cased HTTP method
    pub method: String,
    /// Address without query string or fragment
    pub url: String,
    /// How many raw records collapsed into this entry
    pub count: usize,
}

impl fmt::Display for ApiCallSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Collapses records sharing `(METHOD, url-without-query)`, in first-seen order
pub fn dedupe_api_calls(calls: &[ApiCallRecord]) -> Vec<ApiCallSummary> {
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut summaries: Vec<ApiCallSummary> = Vec::new();

    for call in calls {
        let key = (call.method.to_ascii_uppercase(), strip_query(&call.url));

        match positions.get(&key) {
            Some(&index) => summaries[index].count += 1,
            None => {
                positions.insert(key.clone(), summaries.len());
                summaries.push(ApiCallSummary {
                    method: key.0,
                    url: key.1,
                    count: 1,
                });
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_variants_collapse() {
        let calls = vec![
            ApiCallRecord::new("GET", "https://example.com/api/items?page=1"),
            ApiCallRecord::new("GET", "https://example.com/api/items?page=2"),
        ];

        let deduped = dedupe_api_calls(&calls);
        assert_eq!(
            deduped,
            vec![ApiCallSummary {
                method: "GET".to_string(),
                url: "https://example.com/api/items".to_string(),
                count: 2,
            }]
        );
        assert_eq!(deduped[0].to_string(), "GET https://example.com/api/items");
    }

    #[test]
    fn test_method_distinguishes_entries() {
        let calls = vec![
            ApiCallRecord::new("GET", "https://example.com/api/cart"),
            ApiCallRecord::new("POST", "https://example.com/api/cart"),
            ApiCallRecord::new("get", "https://example.com/api/cart?x=1"),
        ];

        let deduped = dedupe_api_calls(&calls);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].method, "GET");
        assert_eq!(deduped[0].count, 2);
        assert_eq!(deduped[1].method, "POST");
    }

    #[test]
    fn test_first_seen_order() {
        let calls = vec![
            ApiCallRecord::new("GET", "https://example.com/b"),
            ApiCallRecord::new("GET", "https://example.com/a"),
            ApiCallRecord::new("GET", "https://example.com/b#frag"),
        ];

        let urls: Vec<String> = dedupe_api_calls(&calls).into_iter().map(|s| s.url).collect();
        assert_eq!(urls, vec!["https://example.com/b", "https://example.com/a"]);
    }

    #[test]
    fn test_headers_do_not_affect_dedup() {
        let calls = vec![
            ApiCallRecord::new("GET", "https://example.com/api").with_header("x-a", "1"),
            ApiCallRecord::new("GET", "https://example.com/api").with_header("x-a", "2"),
        ];
        assert_eq!(dedupe_api_calls(&calls).len(), 1);
    }

    #[test]
    fn test_empty() {
        assert!(dedupe_api_calls(&[]).is_empty());
    }
}
