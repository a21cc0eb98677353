//! Page slicing shared by every listing.
//!
//! Both repository implementations resolve a [`PageWindow`] first and only then fetch the
//! rows inside it, so the clamping rules below hold for the database and the in-memory
//! store alike.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Page size of the index, category, profile and admin listings.
pub const POSTS_PER_PAGE: usize = 10;

/// PageQuery
///
/// The `?page=N` query parameter. Anything that is not a positive integer falls back to the
/// first page instead of failing the request. A number too large for `usize` saturates, so
/// it still clamps to the last page.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> usize {
        let Some(raw) = self.page.as_deref().map(str::trim) else {
            return 1;
        };
        match raw.parse::<usize>() {
            Ok(number) => number,
            Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => usize::MAX,
            Err(_) => 1,
        }
    }
}

/// The resolved position of one page inside a sequence of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub page_size: usize,
    pub total: usize,
}

impl PageWindow {
    /// Clamps `requested` into `1..=num_pages`. An empty sequence still has one (empty) page.
    pub fn resolve(total: usize, page_size: usize, requested: usize) -> Self {
        let page_size = page_size.max(1);
        let num_pages = total.div_ceil(page_size).max(1);
        Self {
            number: requested.clamp(1, num_pages),
            num_pages,
            page_size,
            total,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.page_size
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }
}

/// Page
///
/// A bounded slice of an ordered sequence plus the metadata needed to link neighbours.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Wraps rows that were already fetched for `window`.
    pub fn from_window(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            page_size: window.page_size,
            total: window.total,
            has_next: window.number < window.num_pages,
            has_previous: window.number > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            page_size: self.page_size,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Slices an already ordered sequence. Out-of-range page numbers land on the last page.
pub fn paginate<T>(ordered: Vec<T>, page_size: usize, page_number: usize) -> Page<T> {
    let window = PageWindow::resolve(ordered.len(), page_size, page_number);
    let items = ordered
        .into_iter()
        .skip(window.offset())
        .take(window.limit())
        .collect();
    Page::from_window(items, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let seq = vec!["a", "b", "c"];
        let far = paginate(seq.clone(), 10, 999);
        let first = paginate(seq, 10, 1);
        assert_eq!(far, first);
        assert_eq!(far.items, vec!["a", "b", "c"]);
        assert_eq!(far.num_pages, 1);
    }

    #[test]
    fn zero_page_clamps_to_first() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 10, 0);
        assert_eq!(page.number, 1);
        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn last_page_is_partial() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 10, 3);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.num_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn empty_sequence_has_one_empty_page() {
        let page = paginate(Vec::<u8>::new(), 10, 4);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_query_falls_back_to_first_page() {
        let parse = |raw: &str| PageQuery { page: Some(raw.to_string()) }.number();
        assert_eq!(parse("3"), 3);
        assert_eq!(parse("last"), 1);
        assert_eq!(parse("-2"), 1);
        assert_eq!(parse(""), 1);
        assert_eq!(PageQuery::default().number(), 1);
    }

    #[test]
    fn oversized_page_number_clamps_to_last() {
        let number = PageQuery { page: Some("99999999999999999999999".to_string()) }.number();
        assert_eq!(number, usize::MAX);

        let page = paginate((1..=15).collect::<Vec<_>>(), 10, number);
        assert_eq!(page.number, 2);
        assert_eq!(page.items, (11..=15).collect::<Vec<_>>());
    }

    #[test]
    fn window_offsets() {
        let window = PageWindow::resolve(42, 10, 5);
        assert_eq!(window.number, 5);
        assert_eq!(window.offset(), 40);
        assert_eq!(window.limit(), 10);
    }
}
