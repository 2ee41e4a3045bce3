mod filters;
mod layout;
mod plan;
mod selection;
mod sync;
pub mod watch;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ViewConfig;
use crate::core::compare::SortState;
use crate::core::filter::{FieldFilter, FilterState};
use crate::core::grouping::GroupBy;
use crate::core::heuristic::{
    Density, DensityPolicy, HeuristicSelector, ViewMode, ViewModePolicy,
};
use crate::core::models::{Account, AccountSortField, Email, EmailSortField, Record};
use crate::core::pagination::Pager;
use crate::core::selection::SelectionSet;
use crate::core::store::{self, PreferenceChange, PreferenceStore};
use crate::core::virtualize::Virtualizer;

pub use plan::{EmptyReason, GroupPlan, PlanBody, RenderPlan, Row, SelectionSummary};

pub const ACCOUNTS_SCREEN: &str = "accounts";
pub const EMAILS_SCREEN: &str = "emails";

/// Preference names a screen owns, for version resets and explicit resets.
const PREF_NAMES: &[&str] = &["view_mode", "view_mode_auto", "density", "density_auto"];

/// A mutation the user asked for. The screen never applies these itself;
/// the owner performs them and sends back a fresh collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent<Id> {
    Sync(Id),
    Delete(Id),
    ToggleStatus(Id),
    ClearError(Id),
}

#[derive(Debug, Clone)]
pub enum Message<R: Record> {
    // Data from outside
    CollectionUpdated(Vec<R>),
    BusyChanged(HashSet<R::Id>),
    PreferenceChanged(PreferenceChange),

    // Filters / sort / grouping
    SearchChanged(String),
    StatusFilter(FieldFilter<R::Status>),
    CategoryFilter(FieldFilter<R::Category>),
    SecondaryFilter(FieldFilter<R::Secondary>),
    ResetFilters,
    SortBy(R::SortField),
    GroupBy(GroupBy),

    // Mode / density
    SelectViewMode(ViewMode),
    AutoViewMode,
    SelectDensity(Density),
    AutoDensity,

    // Paging and scrolling
    SetPage(usize),
    NextPage,
    PrevPage,
    SetPageSize(usize),
    Scrolled(f64),
    ViewportResized(f64),
    ItemMeasured { index: usize, extent: f64 },

    // Selection
    ToggleSelected(R::Id, bool),
    SelectAllVisible,
    InvertVisible,
    ClearSelection,
    SelectByStatus(R::Status),
    SelectByCategory(R::Category),

    // Mutation intents
    Sync(R::Id),
    Delete(R::Id),
    ToggleStatus(R::Id),
    ClearError(R::Id),
    SyncSelected,
    DeleteSelected,

    ResetPreferences,
}

/// Everything one screen (accounts or emails) knows about its collection.
pub struct ScreenModel<R: Record> {
    pub(super) screen: String,
    pub(super) store: Arc<dyn PreferenceStore>,
    pub(super) config: ViewConfig,
    pub(super) intents: mpsc::UnboundedSender<Intent<R::Id>>,

    pub(super) collection: Vec<R>,
    /// False until the first collection arrives.
    pub(super) loaded: bool,
    /// Ids with an operation in flight.
    pub(super) busy: HashSet<R::Id>,

    pub(super) filters: FilterState<R>,
    pub(super) sort: SortState<R::SortField>,
    pub(super) group_by: GroupBy,
    pub(super) selection: SelectionSet<R::Id>,

    pub(super) view_mode: HeuristicSelector<ViewModePolicy>,
    pub(super) density: HeuristicSelector<DensityPolicy>,
    pub(super) pager: Pager,
    pub(super) virtualizer: Virtualizer,
}

pub type AccountScreen = ScreenModel<Account>;
pub type EmailScreen = ScreenModel<Email>;

impl AccountScreen {
    pub fn accounts(
        store: Arc<dyn PreferenceStore>,
        config: ViewConfig,
        intents: mpsc::UnboundedSender<Intent<String>>,
    ) -> Self {
        ScreenModel::new(ACCOUNTS_SCREEN, store, config, intents, AccountSortField::Email)
    }
}

impl EmailScreen {
    pub fn emails(
        store: Arc<dyn PreferenceStore>,
        config: ViewConfig,
        intents: mpsc::UnboundedSender<Intent<u64>>,
    ) -> Self {
        let mut screen =
            ScreenModel::new(EMAILS_SCREEN, store, config, intents, EmailSortField::SentAt);
        // Newest first.
        screen.sort.toggle(EmailSortField::SentAt);
        screen
    }
}

impl<R: Record> ScreenModel<R> {
    pub fn new(
        screen: &str,
        store: Arc<dyn PreferenceStore>,
        config: ViewConfig,
        intents: mpsc::UnboundedSender<Intent<R::Id>>,
        default_sort: R::SortField,
    ) -> Self {
        if store::ensure_version(store.as_ref(), screen, PREF_NAMES) {
            log::info!("Preferences for {screen} were reset after a format change");
        }

        let view_mode = HeuristicSelector::load(config.view_mode, store.as_ref(), screen, 0);
        let density = HeuristicSelector::load(config.density, store.as_ref(), screen, 0);
        let virtualizer = Virtualizer::new(
            R::estimated_extent(density.value()),
            config.container_height,
            config.overscan,
        );

        ScreenModel {
            screen: screen.to_string(),
            store,
            pager: Pager::new(config.page_size),
            config,
            intents,
            collection: Vec::new(),
            loaded: false,
            busy: HashSet::new(),
            filters: FilterState::default(),
            sort: SortState::new(default_sort),
            group_by: GroupBy::Status,
            selection: SelectionSet::new(),
            view_mode,
            density,
            virtualizer,
        }
    }

    pub fn update(&mut self, message: Message<R>) {
        match message {
            Message::CollectionUpdated(_)
            | Message::BusyChanged(_)
            | Message::PreferenceChanged(_)
            | Message::Sync(_)
            | Message::Delete(_)
            | Message::ToggleStatus(_)
            | Message::ClearError(_)
            | Message::SyncSelected
            | Message::DeleteSelected => self.handle_sync(message),

            Message::SearchChanged(_)
            | Message::StatusFilter(_)
            | Message::CategoryFilter(_)
            | Message::SecondaryFilter(_)
            | Message::ResetFilters
            | Message::SortBy(_)
            | Message::GroupBy(_) => self.handle_filters(message),

            Message::SelectViewMode(_)
            | Message::AutoViewMode
            | Message::SelectDensity(_)
            | Message::AutoDensity
            | Message::SetPage(_)
            | Message::NextPage
            | Message::PrevPage
            | Message::SetPageSize(_)
            | Message::Scrolled(_)
            | Message::ViewportResized(_)
            | Message::ItemMeasured { .. }
            | Message::ResetPreferences => self.handle_layout(message),

            Message::ToggleSelected(..)
            | Message::SelectAllVisible
            | Message::InvertVisible
            | Message::ClearSelection
            | Message::SelectByStatus(_)
            | Message::SelectByCategory(_) => self.handle_selection(message),
        }
    }

    pub fn screen(&self) -> &str {
        &self.screen
    }

    pub fn collection(&self) -> &[R] {
        &self.collection
    }

    pub fn filters(&self) -> &FilterState<R> {
        &self.filters
    }

    pub fn sort(&self) -> SortState<R::SortField> {
        self.sort
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn selection(&self) -> &SelectionSet<R::Id> {
        &self.selection
    }

    pub fn view_mode(&self) -> &HeuristicSelector<ViewModePolicy> {
        &self.view_mode
    }

    pub fn density(&self) -> &HeuristicSelector<DensityPolicy> {
        &self.density
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn virtualizer(&self) -> &Virtualizer {
        &self.virtualizer
    }

    pub fn is_busy(&self, id: &R::Id) -> bool {
        self.busy.contains(id)
    }

    /// Records passing the current filters, in collection order.
    pub(super) fn filtered(&self) -> Vec<&R> {
        crate::core::filter::apply_filters(&self.collection, &self.filters)
    }

    /// Ids of the filtered set; what "visible" means for selection.
    pub(super) fn visible_ids(&self) -> Vec<R::Id> {
        self.filtered().into_iter().map(|r| r.id()).collect()
    }

    /// Bring pager and virtualizer in line with the filtered size.
    pub(super) fn reconcile_layout(&mut self) {
        let n = self.filtered().len();
        self.pager.reconcile(n);
        self.virtualizer.set_count(n);
    }

    pub(super) fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    pub(super) fn send_intent(&self, intent: Intent<R::Id>) {
        log::debug!("{}: intent {:?}", self.screen, intent);
        if self.intents.send(intent).is_err() {
            log::warn!("{}: intent receiver is gone, dropping request", self.screen);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::core::store::MemoryStore;

    pub fn account_screen(
        store: Arc<MemoryStore>,
    ) -> (AccountScreen, mpsc::UnboundedReceiver<Intent<String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AccountScreen::accounts(store, ViewConfig::default(), tx), rx)
    }
}
