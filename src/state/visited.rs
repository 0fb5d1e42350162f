use std::collections::HashSet;
use url::Url;

/// A URL awaiting traversal at a given hop count from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: Url,
    pub depth: u32,
}

impl FrontierItem {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Set of URLs already enqueued or visited in this run
///
/// Keeps insertion order so content extraction walks pages in discovery order.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    seen: HashSet<String>,
    order: Vec<Url>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the URL if absent; returns false if it was already present
    pub fn insert(&mut self, url: &Url) -> bool {
        if !self.seen.insert(url.as_str().to_string()) {
            return false;
        }
        self.order.push(url.clone());
        true
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// URLs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.order.iter()
    }

    /// URL strings sorted lexicographically
    pub fn sorted(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.seen.iter().cloned().collect();
        urls.sort();
        urls
    }
}
