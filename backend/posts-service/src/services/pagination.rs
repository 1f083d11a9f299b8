//! Fixed-size pagination over an already ordered sequence.
//!
//! Out-of-range page numbers never fail: anything below 1 lands on the first
//! page and anything past the end lands on the last one.

use serde::Serialize;

/// One page of a paginated sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based number of this page after clamping
    pub number: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_count: self.total_count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    /// `page_size` below 1 is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(len / page_size)`; an empty sequence has zero pages.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Return page `page_number` of `items`, clamped into range.
    pub fn paginate<T>(&self, items: Vec<T>, page_number: i64) -> Page<T> {
        let total_count = items.len();
        let total_pages = self.total_pages(total_count);
        let last = total_pages.max(1);

        let number = if page_number < 1 {
            1
        } else {
            usize::try_from(page_number).unwrap_or(usize::MAX).min(last)
        };

        let start = (number - 1) * self.page_size;
        let items: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();

        let has_next = number < total_pages;
        let has_previous = number > 1;

        Page {
            items,
            number,
            total_pages,
            total_count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then_some(number - 1),
        }
    }

    /// Paginate using the raw `?page=` query value. Missing or non-numeric
    /// values select the first page.
    pub fn paginate_raw<T>(&self, items: Vec<T>, raw_page: Option<&str>) -> Page<T> {
        self.paginate(items, parse_page_number(raw_page))
    }
}

/// Lenient `?page=` parser; anything unparsable is page 1.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(1)
}
