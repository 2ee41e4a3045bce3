use crate::core::filter::apply_filters;
use crate::core::models::Record;
use crate::core::selection::SelectionStats;

use super::{Message, ScreenModel};

impl<R: Record> ScreenModel<R> {
    pub(super) fn handle_selection(&mut self, message: Message<R>) {
        match message {
            Message::ToggleSelected(id, selected) => self.selection.toggle(id, selected),
            Message::SelectAllVisible => {
                let visible = self.visible_ids();
                self.selection.select_all_visible(&visible);
            }
            Message::InvertVisible => {
                let visible = self.visible_ids();
                self.selection.invert_visible(&visible);
            }
            Message::ClearSelection => self.selection.clear(),
            Message::SelectByStatus(status) => {
                let candidates = apply_filters(&self.collection, &self.filters);
                let added = self
                    .selection
                    .select_by_predicate(candidates, |r: &R| r.status() == status);
                log::debug!("{}: selected {added} more by {:?}", self.screen, status);
            }
            Message::SelectByCategory(category) => {
                let candidates = apply_filters(&self.collection, &self.filters);
                let added = self
                    .selection
                    .select_by_predicate(candidates, |r: &R| r.category() == category);
                log::debug!("{}: selected {added} more by {:?}", self.screen, category);
            }
            _ => {}
        }
    }

    pub fn selection_stats(&self) -> SelectionStats {
        self.selection.stats(&self.collection)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::account_screen;
    use super::*;
    use crate::core::filter::FieldFilter;
    use crate::core::models::fixtures::accounts;
    use crate::core::models::{AccountStatus, Provider};
    use crate::core::store::MemoryStore;

    #[test]
    fn selection_persists_through_search_and_paging() {
        let store = Arc::new(MemoryStore::new());
        let (mut screen, _rx) = account_screen(store);
        screen.update(Message::CollectionUpdated(accounts(75)));
        screen.update(Message::ToggleSelected("uid-42".into(), true));

        screen.update(Message::SearchChanged("user7".into()));
        assert!(screen.selection().contains(&"uid-42".to_string()));
        screen.update(Message::SetPage(2));
        screen.update(Message::SortBy(crate::core::models::AccountSortField::Email));
        screen.update(Message::SearchChanged(String::new()));

        assert!(screen.selection().contains(&"uid-42".to_string()));
        assert_eq!(screen.selection().len(), 1);
    }

    #[test]
    fn select_all_uses_filtered_set_not_page() {
        let store = Arc::new(MemoryStore::new());
        let (mut screen, _rx) = account_screen(store);
        screen.update(Message::CollectionUpdated(accounts(75)));
        screen.update(Message::SearchChanged("user1".into()));
        screen.update(Message::SelectAllVisible);
        assert_eq!(screen.selection().len(), 11);

        screen.update(Message::InvertVisible);
        assert!(screen.selection().is_empty());
    }

    #[test]
    fn select_by_status_adds_and_stats_follow() {
        let store = Arc::new(MemoryStore::new());
        let (mut screen, _rx) = account_screen(store);
        let mut all = accounts(6);
        all[2].status = AccountStatus::Error;
        all[5].status = AccountStatus::Error;
        all[1].provider = Provider::Outlook;
        screen.update(Message::CollectionUpdated(all));

        screen.update(Message::SelectByStatus(AccountStatus::Error));
        screen.update(Message::SelectByCategory(Provider::Outlook));
        let stats = screen.selection_stats();
        assert_eq!((stats.total, stats.active, stats.error), (3, 1, 2));

        screen.update(Message::ClearSelection);
        assert_eq!(screen.selection_stats().total, 0);
    }

    #[test]
    fn select_by_status_only_picks_filtered_records() {
        let store = Arc::new(MemoryStore::new());
        let (mut screen, _rx) = account_screen(store);
        let mut all = accounts(3);
        all[0].status = AccountStatus::Error;
        all[0].provider = Provider::Outlook;
        all[1].status = AccountStatus::Error;
        screen.update(Message::CollectionUpdated(all));

        screen.update(Message::CategoryFilter(FieldFilter::Only(Provider::Gmail)));
        screen.update(Message::SelectByStatus(AccountStatus::Error));
        let picked: Vec<_> = screen.selection().iter().cloned().collect();
        assert_eq!(picked, ["uid-1"]);
    }
}
