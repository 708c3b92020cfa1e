//! Page slicing and navigation windows over the filtered job sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of page buttons shown in navigation controls.
pub const MAX_PAGE_BUTTONS: u32 = 5;

/// Rows per page. Only the sizes offered by the page-size selector exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    Five,
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Five,
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::Fifty,
    ];

    pub fn get(&self) -> u32 {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| format!("page size must be one of 5, 10, 20, 50 (got {})", value))
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// One page of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub window: Vec<T>,
    pub total_pages: u32,
}

/// `max(1, ceil(len / size))`
pub fn total_pages(len: usize, page_size: PageSize) -> u32 {
    let size = page_size.get() as usize;
    let pages = len.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Keep `page` inside `[1, total_pages]`.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Slice out 1-indexed `page`. Pages outside the valid range yield an empty window;
/// callers clamp first.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: PageSize) -> Page<T> {
    let size = page_size.get() as usize;
    let window = match (page as usize).checked_sub(1) {
        Some(index) => {
            let start = index.saturating_mul(size);
            let end = start.saturating_add(size).min(items.len());
            if start < items.len() {
                items[start..end].to_vec()
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    };

    Page {
        window,
        total_pages: total_pages(items.len(), page_size),
    }
}

/// Page numbers for the navigation buttons: at most five, centered on `current`
/// where possible and never outside `[1, total_pages]`.
pub fn page_buttons(current: u32, total_pages: u32) -> Vec<u32> {
    let total = total_pages.max(1);
    if total <= MAX_PAGE_BUTTONS {
        return (1..=total).collect();
    }

    let current = clamp_page(current, total);
    let start = current
        .saturating_sub(MAX_PAGE_BUTTONS / 2)
        .clamp(1, total - MAX_PAGE_BUTTONS + 1);
    (start..start + MAX_PAGE_BUTTONS).collect()
}

/// The "Showing X to Y of Z" range for a page, 1-indexed and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub first: usize,
    pub last: usize,
    pub total: usize,
}

impl PageRange {
    /// `None` when there is nothing to show.
    pub fn new(page: u32, page_size: PageSize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let size = page_size.get() as usize;
        let offset = (page.max(1) as usize - 1).saturating_mul(size);
        Some(Self {
            first: offset.saturating_add(1).min(total),
            last: offset.saturating_add(size).min(total),
            total,
        })
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {} to {} of {} results",
            self.first, self.last, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_conversion() {
        assert_eq!(PageSize::default(), PageSize::Ten);
        assert_eq!(PageSize::try_from(20).unwrap(), PageSize::Twenty);
        assert!(PageSize::try_from(15).is_err());
        assert_eq!(u32::from(PageSize::Fifty), 50);

        let json = serde_json::to_string(&PageSize::Five).unwrap();
        assert_eq!(json, "5");
        assert!(serde_json::from_str::<PageSize>("7").is_err());
    }

    #[test]
    fn test_twelve_items_page_size_ten() {
        let items: Vec<u32> = (1..=12).collect();
        let first = paginate(&items, 1, PageSize::Ten);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.window.len(), 10);

        let second = paginate(&items, 2, PageSize::Ten);
        assert_eq!(second.window, vec![11, 12]);
    }

    #[test]
    fn test_empty_sequence_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 1, PageSize::Five);
        assert_eq!(page.total_pages, 1);
        assert!(page.window.is_empty());
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let items: Vec<u32> = (1..=7).collect();
        assert!(paginate(&items, 0, PageSize::Five).window.is_empty());
        assert!(paginate(&items, 3, PageSize::Five).window.is_empty());
        assert_eq!(clamp_page(0, 2), 1);
        assert_eq!(clamp_page(9, 2), 2);
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn test_pages_tile_the_sequence() {
        for len in [0usize, 1, 4, 5, 6, 10, 12, 49, 50, 51, 137] {
            let items: Vec<usize> = (0..len).collect();
            for size in PageSize::ALL {
                let pages = total_pages(len, size);
                let expected = std::cmp::max(1, len.div_ceil(size.get() as usize)) as u32;
                assert_eq!(pages, expected);

                let rebuilt: Vec<usize> = (1..=pages)
                    .flat_map(|page| paginate(&items, page, size).window)
                    .collect();
                assert_eq!(rebuilt, items, "len {} size {}", len, size);
            }
        }
    }

    #[test]
    fn test_page_buttons_small_totals_show_everything() {
        assert_eq!(page_buttons(1, 1), vec![1]);
        assert_eq!(page_buttons(3, 4), vec![1, 2, 3, 4]);
        assert_eq!(page_buttons(5, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_buttons(1, 0), vec![1]);
    }

    #[test]
    fn test_page_buttons_center_and_clamp() {
        assert_eq!(page_buttons(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_buttons(3, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_buttons(4, 10), vec![2, 3, 4, 5, 6]);
        assert_eq!(page_buttons(6, 10), vec![4, 5, 6, 7, 8]);
        assert_eq!(page_buttons(9, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_buttons(10, 10), vec![6, 7, 8, 9, 10]);

        for total in 6..30 {
            for current in 1..=total {
                let buttons = page_buttons(current, total);
                assert_eq!(buttons.len(), 5);
                assert!(buttons.contains(&current));
                assert!(buttons.windows(2).all(|w| w[1] == w[0] + 1));
                assert!(buttons[0] >= 1 && buttons[4] <= total);
            }
        }
    }

    #[test]
    fn test_page_range() {
        let range = PageRange::new(2, PageSize::Ten, 12).unwrap();
        assert_eq!((range.first, range.last, range.total), (11, 12, 12));
        assert_eq!(range.to_string(), "Showing 11 to 12 of 12 results");

        assert!(PageRange::new(1, PageSize::Ten, 0).is_none());
    }
}
