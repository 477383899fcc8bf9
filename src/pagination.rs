//! Resolving untrusted page requests against an ordered result set.
//!
//! Page parameters arrive from the outside world (query strings, stale
//! bookmarks, hand-edited URLs) and are never trusted: anything that can't
//! be read as a positive integer falls back to the first page, and a number
//! past the end of the listing falls back to the last page, no matter how
//! absurdly large. A reader following an out-of-date link should land on
//! the nearest valid content, not on an error page.

use std::cmp;

/// Parse an untrusted page parameter.
///
/// Absent, unparsable, zero, or negative values all resolve to page 1.
/// Numbers too large to represent saturate, so they still resolve to the
/// last page once [`Paginator::page`] clamps them.
pub fn page_number(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u128>().ok())
        .map(|num| cmp::min(num, u128::from(u32::MAX)) as u32)
        .filter(|&num| num > 0)
        .unwrap_or(1)
}

/// A single resolved page of an ordered result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The items on this page, in the order of the underlying result set.
    pub items: Vec<T>,
    /// The resolved page number, starting at 1.
    pub num: u32,
    /// How many pages there are in total. Always at least 1; an empty
    /// result set has a single empty page.
    pub num_pages: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.num < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.num > 1
    }
}

/// Splits an ordered result set into pages of a fixed width.
///
/// The paginator is generic over the element type and doesn't care how the
/// result set was produced, only that it is already in display order.
#[derive(Debug)]
pub struct Paginator<T> {
    items: Vec<T>,
    width: u32,
}

impl<T> Paginator<T> {
    /// Create a paginator over an ordered result set.
    ///
    /// `width` is how many items fit in a page and must be positive.
    pub fn new(items: Vec<T>, width: u32) -> Paginator<T> {
        assert!(width > 0, "page width must be positive");

        Paginator { items, width }
    }

    /// How many pages there are in total.
    pub fn num_pages(&self) -> u32 {
        let total = self.items.len() as u32;

        cmp::max(1, (total + self.width - 1) / self.width)
    }

    /// Resolve a requested page number and extract that page.
    ///
    /// Requests past the end of the result set resolve to the last page;
    /// requests before the start resolve to the first.
    pub fn page(self, requested: u32) -> Page<T> {
        let num_pages = self.num_pages();
        let num = requested.clamp(1, num_pages);
        let offset = (num - 1) * self.width;

        let items = self
            .items
            .into_iter()
            .skip(offset as usize)
            .take(self.width as usize)
            .collect();

        Page {
            items,
            num,
            num_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: u32) -> Vec<u32> {
        (1..=n).collect()
    }

    #[test]
    fn unparsable_param_falls_back_to_first_page() {
        assert_eq!(page_number(Some("abc")), 1);
        assert_eq!(page_number(Some("")), 1);
        assert_eq!(page_number(Some("-3")), 1);
        assert_eq!(page_number(Some("0")), 1);
        assert_eq!(page_number(None), 1);
    }

    #[test]
    fn parsable_param_is_used() {
        assert_eq!(page_number(Some("2")), 2);
        assert_eq!(page_number(Some(" 7 ")), 7);
    }

    #[test]
    fn oversized_param_saturates_to_last_page() {
        assert_eq!(page_number(Some("99999999999999")), u32::MAX);

        let page =
            Paginator::new(numbers(9), 4).page(page_number(Some("99999999999999")));
        assert_eq!(page.num, 3);
        assert_eq!(page.items, vec![9]);
    }

    #[test]
    fn full_pages() {
        let page = Paginator::new(numbers(8), 4).page(2);

        assert_eq!(page.items, vec![5, 6, 7, 8]);
        assert_eq!(page.num, 2);
        assert_eq!(page.num_pages, 2);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn partial_last_page() {
        let page = Paginator::new(numbers(9), 4).page(3);

        assert_eq!(page.items, vec![9]);
        assert_eq!(page.num_pages, 3);
    }

    #[test]
    fn past_the_end_falls_back_to_last_page() {
        let page = Paginator::new(numbers(7), 4).page(999);

        assert_eq!(page.num, 2);
        assert_eq!(page.items, vec![5, 6, 7]);
        assert!(!page.has_next());
    }

    #[test]
    fn empty_set_is_one_empty_page() {
        let page = Paginator::new(Vec::<u32>::new(), 4).page(1);

        assert!(page.items.is_empty());
        assert_eq!(page.num, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn first_page_has_no_previous() {
        let page = Paginator::new(numbers(8), 4).page(1);

        assert!(page.has_next());
        assert!(!page.has_previous());
    }
}
