use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Offset paging for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: usize) -> Self {
        Self::new(limit, 0)
    }

    /// The page after this one.
    pub fn next(&self) -> Self {
        Self::new(self.limit, self.offset + self.limit)
    }

    /// Slices an already filtered and ordered collection.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let items = items.into_iter().skip(self.offset).take(self.limit).collect();
        Page { items, total }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_slices_and_counts() {
        let page = PageRequest::new(2, 1).apply(vec![1, 2, 3, 4]);
        assert_eq!(page.items, vec![2, 3]);
        assert_eq!(page.total, 4);

        let past_end = PageRequest::new(2, 10).apply(vec![1, 2]);
        assert!(past_end.is_empty());
        assert_eq!(past_end.total, 2);
    }

    #[test]
    fn next_advances_offset() {
        let next = PageRequest::first(50).next();
        assert_eq!(next.offset, 50);
        assert_eq!(next.limit, 50);
    }
}
