use serde::{Deserialize, Serialize};

use crate::models::Role;

/// The six tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Posts,
    Likes,
    Comments,
    Messages,
    GroupMessages,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Likes => "likes",
            Self::Comments => "comments",
            Self::Messages => "messages",
            Self::GroupMessages => "group_messages",
        }
    }
}

/// Filter for listing accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountQuery {
    pub role: Option<Role>,
    pub newest_first: bool,
}

/// A window into a reverse-chronological listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub offset: u32,
    pub limit: u32,
}

impl PageRange {
    /// Range for a 1-based page number. Page 0 is treated as page 1.
    pub fn page(page: u32, limit: u32) -> Self {
        let page = page.max(1);
        Self {
            offset: (page - 1).saturating_mul(limit),
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A full page implies there may be more rows behind it; a short one
    /// means the listing is exhausted.
    pub fn from_rows(items: Vec<T>, limit: u32) -> Self {
        let has_more = limit > 0 && items.len() == limit as usize;
        Self { items, has_more }
    }

    pub fn empty() -> Self {
        Self { items: Vec::new(), has_more: false }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ranges_are_one_based() {
        assert_eq!(PageRange::page(1, 10), PageRange { offset: 0, limit: 10 });
        assert_eq!(PageRange::page(3, 50), PageRange { offset: 100, limit: 50 });
        assert_eq!(PageRange::page(0, 10), PageRange { offset: 0, limit: 10 });
    }

    #[test]
    fn has_more_only_on_full_page() {
        assert!(Page::from_rows(vec![1, 2, 3], 3).has_more);
        assert!(!Page::from_rows(vec![1, 2], 3).has_more);
        assert!(!Page::<u8>::from_rows(vec![], 3).has_more);
        assert!(!Page::<u8>::from_rows(vec![], 0).has_more);
    }
}
