use serde::{Deserialize, Serialize};

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_PAGE_BUTTONS: usize = 5;

/// Where the current page sits in the collection. `page_index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub page_index: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl PageWindow {
    /// Build a window with `page_index` clamped to `[1, max(1, total_pages)]`.
    /// A zero page size is treated as 1.
    pub fn new(page_index: usize, page_size: usize, total_items: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        PageWindow {
            page_index: page_index.clamp(1, total_pages.max(1)),
            page_size,
            total_items,
            total_pages,
        }
    }

    /// Zero-based slice bounds of this page.
    pub fn bounds(&self) -> (usize, usize) {
        let start = ((self.page_index - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        (start, end)
    }

    /// 1-based "showing X-Y of N" range; `None` when there is nothing to show.
    pub fn item_range(&self) -> Option<(usize, usize)> {
        let (start, end) = self.bounds();
        (end > start).then_some((start + 1, end))
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }
}

#[derive(Debug, Clone)]
pub struct Page<'a, R> {
    pub items: &'a [R],
    pub window: PageWindow,
}

pub fn paginate<R>(records: &[R], page_index: usize, page_size: usize) -> Page<'_, R> {
    let window = PageWindow::new(page_index, page_size, records.len());
    let (start, end) = window.bounds();
    Page {
        items: &records[start..end],
        window,
    }
}

/// Sliding window of at most `max_buttons` page numbers around the current
/// page, shifted to stay inside `[1, total_pages]`.
pub fn page_buttons(window: &PageWindow, max_buttons: usize) -> Vec<usize> {
    if window.total_pages == 0 || max_buttons == 0 {
        return Vec::new();
    }
    if window.total_pages <= max_buttons {
        return (1..=window.total_pages).collect();
    }
    let half = max_buttons / 2;
    let start = window
        .page_index
        .saturating_sub(half)
        .clamp(1, window.total_pages - max_buttons + 1);
    (start..start + max_buttons).collect()
}

/// Page index and size for one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_index: usize,
    page_size: usize,
    total_items: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Pager::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Pager {
            page_index: 1,
            page_size: page_size.max(1),
            total_items: 0,
        }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page_index, self.page_size, self.total_items)
    }

    pub fn page_index(&self) -> usize {
        self.window().page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
        self.clamp();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page_index.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page_index.saturating_sub(1));
    }

    /// Changing the page size always returns to page 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            log::debug!("Non-standard page size {page_size}");
        }
        self.page_size = page_size.max(1);
        self.page_index = 1;
    }

    /// The collection changed size; pull the page back into range.
    pub fn reconcile(&mut self, total_items: usize) {
        self.total_items = total_items;
        let before = self.page_index;
        self.clamp();
        if before != self.page_index {
            log::debug!("Page {before} out of range for {total_items} items, now {}", self.page_index);
        }
    }

    fn clamp(&mut self) {
        self.page_index = self.window().page_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clamps_page_index() {
        assert_eq!(PageWindow::new(0, 20, 75).page_index, 1);
        assert_eq!(PageWindow::new(9, 20, 75).page_index, 4);
        let empty = PageWindow::new(3, 20, 0);
        assert_eq!(empty.page_index, 1);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.item_range(), None);
    }

    #[test]
    fn zero_page_size_is_one() {
        let w = PageWindow::new(2, 0, 3);
        assert_eq!(w.page_size, 1);
        assert_eq!(w.total_pages, 3);
        assert_eq!(w.bounds(), (1, 2));
    }

    #[test]
    fn pages_cover_every_item_once() {
        let items: Vec<usize> = (0..75).collect();
        for size in [1, 7, 20, 50, 100] {
            let pages = PageWindow::new(1, size, items.len()).total_pages;
            let mut seen = Vec::new();
            for p in 1..=pages {
                seen.extend_from_slice(paginate(&items, p, size).items);
            }
            assert_eq!(seen, items, "page size {size}");
        }
    }

    #[test]
    fn last_page_is_partial() {
        let items: Vec<usize> = (0..75).collect();
        let page = paginate(&items, 4, 20);
        assert_eq!(page.items, &items[60..75]);
        assert_eq!(page.window.item_range(), Some((61, 75)));
        assert!(!page.window.has_next());
        assert!(page.window.has_prev());
    }

    #[test]
    fn page_size_change_resets_to_first_page() {
        let mut pager = Pager::new(20);
        pager.reconcile(75);
        pager.set_page(3);
        assert_eq!(pager.page_index(), 3);

        pager.set_page_size(50);
        assert_eq!(pager.page_index(), 1);
        assert_eq!(pager.window().total_pages, 2);
    }

    #[test]
    fn navigation_stays_in_range() {
        let mut pager = Pager::new(10);
        pager.reconcile(25);
        pager.prev_page();
        assert_eq!(pager.page_index(), 1);
        pager.next_page();
        pager.next_page();
        pager.next_page();
        assert_eq!(pager.page_index(), 3);
    }

    #[test]
    fn shrinking_collection_pulls_page_back() {
        let mut pager = Pager::new(20);
        pager.reconcile(100);
        pager.set_page(5);
        pager.reconcile(41);
        assert_eq!(pager.page_index(), 3);
        pager.reconcile(0);
        assert_eq!(pager.page_index(), 1);
    }

    #[test]
    fn buttons_slide_with_current_page() {
        let at = |page| page_buttons(&PageWindow::new(page, 10, 100), 5);
        assert_eq!(at(1), [1, 2, 3, 4, 5]);
        assert_eq!(at(2), [1, 2, 3, 4, 5]);
        assert_eq!(at(6), [4, 5, 6, 7, 8]);
        assert_eq!(at(10), [6, 7, 8, 9, 10]);
        assert_eq!(page_buttons(&PageWindow::new(1, 10, 25), 5), [1, 2, 3]);
        assert!(page_buttons(&PageWindow::new(1, 10, 0), 5).is_empty());
    }
}
