use crate::core::heuristic::HeuristicSelector;
use crate::core::models::Record;

use super::{Intent, Message, ScreenModel};

impl<R: Record> ScreenModel<R> {
    pub(super) fn handle_sync(&mut self, message: Message<R>) {
        match message {
            Message::CollectionUpdated(records) => {
                let count = records.len();
                let first = !self.loaded;
                self.collection = records;
                self.loaded = true;

                // Heuristics see the new size before anything else reacts.
                let store = self.store.clone();
                if self.view_mode.collection_size_changed(count, store.as_ref()) {
                    log::info!("{}: view mode now {:?}", self.screen, self.view_mode.value());
                }
                if self.density.collection_size_changed(count, store.as_ref()) {
                    log::info!("{}: density now {:?}", self.screen, self.density.value());
                    self.virtualizer
                        .set_estimate(R::estimated_extent(self.density.value()));
                }

                let present: Vec<R::Id> = self.collection.iter().map(|r| r.id()).collect();
                let dropped = self.selection.prune(&present);
                if dropped > 0 {
                    log::debug!("{}: dropped {dropped} stale selections", self.screen);
                }
                self.busy.retain(|id| present.contains(id));

                self.virtualizer.clear_measurements();
                self.reconcile_layout();
                if first {
                    log::info!("{}: loaded {count} records", self.screen);
                } else {
                    log::debug!("{}: collection refreshed ({count} records)", self.screen);
                }
            }

            Message::BusyChanged(busy) => {
                self.busy = busy;
            }

            Message::PreferenceChanged(change) => {
                let prefix = format!("{}.", self.screen);
                if !change.key.starts_with(&prefix) {
                    return;
                }
                let count = self.collection.len();
                let store = self.store.clone();
                let view_mode =
                    HeuristicSelector::load(self.config.view_mode, store.as_ref(), &self.screen, count);
                let density =
                    HeuristicSelector::load(self.config.density, store.as_ref(), &self.screen, count);

                if view_mode.value() != self.view_mode.value()
                    || view_mode.kind() != self.view_mode.kind()
                {
                    log::debug!("{}: view mode changed elsewhere", self.screen);
                    self.view_mode = view_mode;
                }
                if density.value() != self.density.value() || density.kind() != self.density.kind()
                {
                    log::debug!("{}: density changed elsewhere", self.screen);
                    self.density = density;
                    self.virtualizer
                        .set_estimate(R::estimated_extent(self.density.value()));
                }
            }

            Message::Sync(id) => self.send_intent(Intent::Sync(id)),
            Message::Delete(id) => self.send_intent(Intent::Delete(id)),
            Message::ToggleStatus(id) => self.send_intent(Intent::ToggleStatus(id)),
            Message::ClearError(id) => self.send_intent(Intent::ClearError(id)),

            Message::SyncSelected => {
                for id in self.selection.iter() {
                    self.send_intent(Intent::Sync(id.clone()));
                }
            }
            Message::DeleteSelected => {
                for id in self.selection.iter() {
                    self.send_intent(Intent::Delete(id.clone()));
                }
            }

            _ => {}
        }
    }
}
