//! Query descriptors handed to the post store.
//!
//! These describe *what* to fetch; adapters decide how to run it.

use std::str::FromStr;

use crate::domain::{Post, User};

/// How the `published` list filter interprets its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishedFilterMode {
    /// Case-insensitive `"true"` means published; any other value means unpublished.
    #[default]
    Lenient,
    /// Only recognised boolean tokens filter; anything else is ignored.
    Strict,
}

impl PublishedFilterMode {
    /// Interpret a raw `published` value. `None` means "do not filter".
    pub fn interpret(self, raw: &str) -> Option<bool> {
        match self {
            Self::Lenient => Some(raw.eq_ignore_ascii_case("true")),
            Self::Strict => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
        }
    }
}

impl FromStr for PublishedFilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown published filter mode: {}", other)),
        }
    }
}

/// Ordering of post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    NewestFirst,
}

/// Predicate over posts: all posts, narrowed by each present constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostFilter {
    pub published: Option<bool>,
    pub author_username: Option<String>,
    pub order: PostOrder,
}

impl PostFilter {
    /// The unconstrained filter.
    pub fn all() -> Self {
        Self::default()
    }

    /// Evaluate the predicate against a post and its author.
    pub fn matches(&self, post: &Post, author: &User) -> bool {
        if let Some(published) = self.published {
            if post.published != published {
                return false;
            }
        }
        if let Some(username) = &self.author_username {
            if author.username != *username {
                return false;
            }
        }
        true
    }
}

/// Bounds applied to client-supplied page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 100,
        }
    }
}

impl PageLimits {
    /// Both sizes are at least 1 and the default never exceeds the maximum.
    pub fn new(default_size: u64, max_size: u64) -> Self {
        let max_size = max_size.max(1);
        Self {
            default_size: default_size.clamp(1, max_size),
            max_size,
        }
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Build a page request from optional query values, clamped to `limits`.
    pub fn new(page: Option<u64>, page_size: Option<u64>, limits: &PageLimits) -> Self {
        let page_size = match page_size {
            None | Some(0) => limits.default_size,
            Some(size) => size.min(limits.max_size),
        };
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.max(1),
        }
    }

    /// Zero-based page index.
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    pub fn offset(&self) -> u64 {
        self.index().saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, &PageLimits::default())
    }
}

/// One page of results plus the total number of matching items.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: PageRequest,
}

impl<T> Paged<T> {
    /// Cut the requested page out of a fully materialised, already ordered list.
    pub fn from_ordered(all: Vec<T>, page: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.page_size).unwrap_or(usize::MAX))
            .collect();
        Self { items, total, page }
    }

    /// A page past the end of `total` matching items.
    pub fn empty(total: u64, page: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total,
            page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_published_values() {
        let mode = PublishedFilterMode::Lenient;
        assert_eq!(mode.interpret("true"), Some(true));
        assert_eq!(mode.interpret("TRUE"), Some(true));
        assert_eq!(mode.interpret("false"), Some(false));
        assert_eq!(mode.interpret("bogus"), Some(false));
        assert_eq!(mode.interpret("yes"), Some(false));
        assert_eq!(mode.interpret(""), Some(false));
        assert_eq!(mode.interpret(" true"), Some(false));
        assert_eq!(mode.interpret("true "), Some(false));
    }

    #[test]
    fn test_strict_published_values() {
        let mode = PublishedFilterMode::Strict;
        assert_eq!(mode.interpret("True"), Some(true));
        assert_eq!(mode.interpret("1"), Some(true));
        assert_eq!(mode.interpret("off"), Some(false));
        assert_eq!(mode.interpret("bogus"), None);
        assert_eq!(mode.interpret(""), None);
        assert_eq!(mode.interpret(" yes "), Some(true));
    }

    #[test]
    fn test_filter_mode_from_str() {
        assert_eq!("Strict".parse::<PublishedFilterMode>(), Ok(PublishedFilterMode::Strict));
        assert_eq!("lenient".parse::<PublishedFilterMode>(), Ok(PublishedFilterMode::Lenient));
        assert!("loose".parse::<PublishedFilterMode>().is_err());
    }

    #[test]
    fn test_page_request_clamping() {
        let limits = PageLimits::default();

        assert_eq!(
            PageRequest::new(None, None, &limits),
            PageRequest { page: 1, page_size: 20 }
        );
        assert_eq!(
            PageRequest::new(Some(0), Some(500), &limits),
            PageRequest { page: 1, page_size: 100 }
        );
        assert_eq!(PageRequest::new(Some(3), Some(0), &limits).page_size, 20);
        assert_eq!(PageRequest::new(Some(3), Some(10), &limits).offset(), 20);
    }

    #[test]
    fn test_page_limits_keep_default_within_max() {
        let limits = PageLimits::new(500, 100);
        assert_eq!(limits, PageLimits { default_size: 100, max_size: 100 });
        assert_eq!(PageRequest::new(None, None, &limits).page_size, 100);

        assert_eq!(PageLimits::new(0, 0), PageLimits { default_size: 1, max_size: 1 });
        assert_eq!(PageLimits::new(20, 100), PageLimits::default());
    }

    #[test]
    fn test_paged_from_ordered() {
        let page = PageRequest { page: 2, page_size: 2 };
        let paged = Paged::from_ordered(vec![1, 2, 3, 4, 5], page);
        assert_eq!(paged.items, vec![3, 4]);
        assert_eq!(paged.total, 5);

        let past_end = Paged::from_ordered(vec![1, 2, 3], PageRequest { page: 9, page_size: 2 });
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 3);

        let huge = PageRequest::new(Some(u64::MAX / 10), Some(100), &PageLimits::default());
        assert_eq!(huge.offset(), u64::MAX);
        assert!(Paged::from_ordered(vec![1, 2, 3], huge).items.is_empty());
    }
}
