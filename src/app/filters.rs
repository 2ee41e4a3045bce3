use crate::core::models::Record;

use super::{Message, ScreenModel};

impl<R: Record> ScreenModel<R> {
    pub(super) fn handle_filters(&mut self, message: Message<R>) {
        match message {
            Message::SearchChanged(text) => {
                if text == self.filters.search_text {
                    return;
                }
                self.filters.search_text = text;
                self.filters_changed();
            }
            Message::StatusFilter(filter) => {
                self.filters.status = filter;
                self.filters_changed();
            }
            Message::CategoryFilter(filter) => {
                self.filters.category = filter;
                self.filters_changed();
            }
            Message::SecondaryFilter(filter) => {
                self.filters.secondary_status = filter;
                self.filters_changed();
            }
            Message::ResetFilters => {
                self.filters.reset();
                self.filters_changed();
            }
            Message::SortBy(field) => {
                self.sort.toggle(field);
                // Measurements follow positions, which now hold other records.
                self.virtualizer.clear_measurements();
                log::debug!(
                    "{}: sort by {:?} {:?}",
                    self.screen,
                    self.sort.field,
                    self.sort.direction
                );
            }
            Message::GroupBy(by) => {
                self.group_by = by;
            }
            _ => {}
        }
    }

    /// A new filtered set starts at the top: page 1, scrolled up.
    fn filters_changed(&mut self) {
        self.pager.set_page(1);
        self.virtualizer.clear_measurements();
        self.virtualizer.scroll_to(0.0);
        self.reconcile_layout();
        log::debug!(
            "{}: {} filters active",
            self.screen,
            self.filters.active_filter_count()
        );
    }
}
