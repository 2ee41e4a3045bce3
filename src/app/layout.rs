use crate::core::heuristic::HeuristicSelector;
use crate::core::models::Record;
use crate::core::store;

use super::{Message, ScreenModel, PREF_NAMES};

impl<R: Record> ScreenModel<R> {
    pub(super) fn handle_layout(&mut self, message: Message<R>) {
        let store = self.store.clone();
        match message {
            Message::SelectViewMode(mode) => {
                self.view_mode.select(mode, store.as_ref());
                log::info!("{}: view mode pinned to {:?}", self.screen, mode);
            }
            Message::AutoViewMode => {
                self.view_mode.enable_auto(store.as_ref());
                log::info!("{}: view mode back to auto ({:?})", self.screen, self.view_mode.value());
            }
            Message::SelectDensity(density) => {
                let before = self.density.value();
                self.density.select(density, store.as_ref());
                if before != density {
                    self.virtualizer.set_estimate(R::estimated_extent(density));
                }
            }
            Message::AutoDensity => {
                let before = self.density.value();
                self.density.enable_auto(store.as_ref());
                if before != self.density.value() {
                    self.virtualizer
                        .set_estimate(R::estimated_extent(self.density.value()));
                }
            }

            Message::SetPage(page) => self.pager.set_page(page),
            Message::NextPage => self.pager.next_page(),
            Message::PrevPage => self.pager.prev_page(),
            Message::SetPageSize(size) => {
                self.pager.set_page_size(size);
                self.reconcile_layout();
            }

            Message::Scrolled(offset) => self.virtualizer.scroll_to(offset),
            Message::ViewportResized(height) => self.virtualizer.set_viewport_height(height),
            Message::ItemMeasured { index, extent } => {
                self.virtualizer.measure(index, extent);
            }

            Message::ResetPreferences => {
                store::clear_screen(store.as_ref(), &self.screen, PREF_NAMES);
                let count = self.collection.len();
                self.view_mode =
                    HeuristicSelector::load(self.config.view_mode, store.as_ref(), &self.screen, count);
                self.density =
                    HeuristicSelector::load(self.config.density, store.as_ref(), &self.screen, count);
                self.virtualizer
                    .set_estimate(R::estimated_extent(self.density.value()));
                self.pager.set_page_size(self.config.page_size);
                self.reconcile_layout();
                log::info!("{}: preferences reset", self.screen);
            }
            _ => {}
        }
    }
}
