use std::hash::Hash;

use indexmap::IndexSet;
use serde::Serialize;

use crate::core::models::Record;

/// Summary of what is currently selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    pub total: usize,
    pub active: usize,
    pub disabled: usize,
    pub error: usize,
}

/// Selected ids in the order they were picked. Membership does not depend
/// on filtering, sorting or paging.
#[derive(Debug, Clone)]
pub struct SelectionSet<Id> {
    ids: IndexSet<Id>,
}

impl<Id> Default for SelectionSet<Id> {
    fn default() -> Self {
        SelectionSet {
            ids: IndexSet::new(),
        }
    }
}

impl<Id: Clone + Eq + Hash> SelectionSet<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Id> {
        self.ids.iter()
    }

    /// Set membership explicitly; repeating the call changes nothing.
    pub fn toggle(&mut self, id: Id, selected: bool) {
        if selected {
            self.ids.insert(id);
        } else {
            self.ids.shift_remove(&id);
        }
    }

    pub fn select_all_visible<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        self.ids.extend(visible.into_iter().cloned());
    }

    /// Flip membership of the visible ids only.
    pub fn invert_visible<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        for id in visible {
            if !self.ids.shift_remove(id) {
                self.ids.insert(id.clone());
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Add every candidate matching `predicate`. Existing members stay.
    pub fn select_by_predicate<'a, R, I, P>(&mut self, candidates: I, predicate: P) -> usize
    where
        R: Record<Id = Id> + 'a,
        I: IntoIterator<Item = &'a R>,
        P: Fn(&R) -> bool,
    {
        let before = self.ids.len();
        self.ids
            .extend(candidates.into_iter().filter(|r| predicate(r)).map(|r| r.id()));
        self.ids.len() - before
    }

    /// False for an empty visible set.
    pub fn is_all_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        let mut any = false;
        for id in visible {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    /// Some, but not all, visible ids are selected.
    pub fn is_partially_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        let (mut hit, mut miss) = (false, false);
        for id in visible {
            if self.ids.contains(id) {
                hit = true;
            } else {
                miss = true;
            }
            if hit && miss {
                return true;
            }
        }
        false
    }

    /// Drop ids no longer present in the collection. Returns how many went.
    pub fn prune<'a, I>(&mut self, present: I) -> usize
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        let present: IndexSet<&Id> = present.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| present.contains(id));
        before - self.ids.len()
    }

    /// Selected records in collection order.
    pub fn selected_records<'a, R>(&self, collection: &'a [R]) -> Vec<&'a R>
    where
        R: Record<Id = Id>,
    {
        collection
            .iter()
            .filter(|r| self.ids.contains(&r.id()))
            .collect()
    }

    pub fn stats<R>(&self, collection: &[R]) -> SelectionStats
    where
        R: Record<Id = Id>,
    {
        self.selected_records(collection)
            .into_iter()
            .fold(SelectionStats::default(), |mut stats, r| {
                stats.total += 1;
                if r.is_active() {
                    stats.active += 1;
                }
                if r.is_disabled() {
                    stats.disabled += 1;
                }
                if r.is_error() {
                    stats.error += 1;
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{apply_filters, FieldFilter, FilterState};
    use crate::core::models::fixtures::accounts;
    use crate::core::models::{Account, AccountStatus};

    fn ids(all: &[Account]) -> Vec<String> {
        all.iter().map(|a| a.uid.clone()).collect()
    }

    #[test]
    fn toggle_is_idempotent() {
        let mut sel = SelectionSet::new();
        sel.toggle("a".to_string(), true);
        sel.toggle("a".to_string(), true);
        assert_eq!(sel.len(), 1);
        sel.toggle("a".to_string(), false);
        sel.toggle("a".to_string(), false);
        assert!(sel.is_empty());
    }

    #[test]
    fn selection_survives_filter_changes() {
        let mut all = accounts(6);
        all[4].status = AccountStatus::Error;
        let mut sel = SelectionSet::new();
        sel.toggle("uid-4".to_string(), true);

        // Filter it out of view.
        let state = FilterState::<Account> {
            status: FieldFilter::Only(AccountStatus::Active),
            ..Default::default()
        };
        let visible: Vec<String> = apply_filters(&all, &state).iter().map(|a| a.uid.clone()).collect();
        assert!(!visible.contains(&"uid-4".to_string()));
        sel.select_all_visible(&visible);
        assert!(sel.is_all_selected(&visible));

        // Clear the filter: the hidden pick is still there.
        let visible = ids(&all);
        assert!(sel.contains(&"uid-4".to_string()));
        assert!(sel.is_all_selected(&visible));
        assert_eq!(sel.len(), 6);
    }

    #[test]
    fn invert_only_touches_visible() {
        let mut sel = SelectionSet::new();
        sel.toggle("hidden".to_string(), true);
        sel.toggle("a".to_string(), true);

        let visible = vec!["a".to_string(), "b".to_string()];
        sel.invert_visible(&visible);
        assert!(sel.contains(&"hidden".to_string()));
        assert!(!sel.contains(&"a".to_string()));
        assert!(sel.contains(&"b".to_string()));
    }

    #[test]
    fn all_and_partial() {
        let mut sel = SelectionSet::new();
        let visible = vec!["a".to_string(), "b".to_string()];
        let none: Vec<String> = Vec::new();

        assert!(!sel.is_all_selected(&none));
        assert!(!sel.is_partially_selected(&none));
        assert!(!sel.is_partially_selected(&visible));

        sel.toggle("a".to_string(), true);
        assert!(sel.is_partially_selected(&visible));
        assert!(!sel.is_all_selected(&visible));

        sel.toggle("b".to_string(), true);
        assert!(sel.is_all_selected(&visible));
        assert!(!sel.is_partially_selected(&visible));
    }

    #[test]
    fn select_by_predicate_is_additive() {
        let mut all = accounts(5);
        all[1].status = AccountStatus::Error;
        all[3].status = AccountStatus::Error;
        let mut sel = SelectionSet::new();
        sel.toggle("uid-0".to_string(), true);

        let added = sel.select_by_predicate(&all, |a: &Account| a.status == AccountStatus::Error);
        assert_eq!(added, 2);
        let picked: Vec<_> = sel.iter().cloned().collect();
        assert_eq!(picked, ["uid-0", "uid-1", "uid-3"]);
    }

    #[test]
    fn prune_drops_missing_ids() {
        let all = accounts(3);
        let mut sel = SelectionSet::new();
        sel.toggle("uid-1".to_string(), true);
        sel.toggle("gone".to_string(), true);

        let present = ids(&all);
        assert_eq!(sel.prune(&present), 1);
        assert_eq!(sel.iter().collect::<Vec<_>>(), [&"uid-1".to_string()]);
    }

    #[test]
    fn stats_count_active_disabled_and_error() {
        let mut all = accounts(4);
        all[2].status = AccountStatus::Error;
        all[3].status = AccountStatus::Disabled;
        let mut sel = SelectionSet::new();
        sel.select_all_visible(&ids(&all));
        sel.toggle("uid-0".to_string(), false);

        assert_eq!(
            sel.stats(&all),
            SelectionStats {
                total: 3,
                active: 1,
                disabled: 1,
                error: 1
            }
        );
        let records = sel.selected_records(&all);
        assert_eq!(records[0].uid, "uid-1");
    }
}
