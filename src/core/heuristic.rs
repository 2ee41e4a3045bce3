use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::core::store::{scoped_key, PreferenceStore};

/// Largest collection rendered as a plain list.
pub const FLAT_MAX: usize = 15;
/// Largest collection rendered as a virtualized list.
pub const VIRTUALIZED_MAX: usize = 30;
/// Largest collection rendered as groups; anything above gets the table.
pub const GROUPED_MAX: usize = 50;

pub const DETAILED_MAX: usize = 20;
pub const COMPACT_MAX: usize = 50;

/// Overall rendering strategy for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Flat,
    Virtualized,
    Grouped,
    PaginatedTable,
}

/// Visual compactness tier, independent of the view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Detailed,
    Compact,
    Minimal,
}

/// A value one of the selectors can hold and persist.
pub trait Tier: Copy + Eq + Debug {
    fn key(self) -> &'static str;
    fn from_key(key: &str) -> Option<Self>;
}

impl Tier for ViewMode {
    fn key(self) -> &'static str {
        match self {
            ViewMode::Flat => "flat",
            ViewMode::Virtualized => "virtualized",
            ViewMode::Grouped => "grouped",
            ViewMode::PaginatedTable => "paginated_table",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "flat" => Some(ViewMode::Flat),
            "virtualized" => Some(ViewMode::Virtualized),
            "grouped" => Some(ViewMode::Grouped),
            "paginated_table" => Some(ViewMode::PaginatedTable),
            _ => None,
        }
    }
}

impl Tier for Density {
    fn key(self) -> &'static str {
        match self {
            Density::Detailed => "detailed",
            Density::Compact => "compact",
            Density::Minimal => "minimal",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "detailed" => Some(Density::Detailed),
            "compact" => Some(Density::Compact),
            "minimal" => Some(Density::Minimal),
            _ => None,
        }
    }
}

/// Maps a collection size to a recommended value.
pub trait Policy {
    type Value: Tier;
    /// Preference name the selector persists under.
    const NAME: &'static str;

    fn recommend(&self, count: usize) -> Self::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewModePolicy {
    pub flat_max: usize,
    pub virtualized_max: usize,
    pub grouped_max: usize,
}

impl Default for ViewModePolicy {
    fn default() -> Self {
        ViewModePolicy {
            flat_max: FLAT_MAX,
            virtualized_max: VIRTUALIZED_MAX,
            grouped_max: GROUPED_MAX,
        }
    }
}

impl Policy for ViewModePolicy {
    type Value = ViewMode;
    const NAME: &'static str = "view_mode";

    fn recommend(&self, count: usize) -> ViewMode {
        if count <= self.flat_max {
            ViewMode::Flat
        } else if count <= self.virtualized_max {
            ViewMode::Virtualized
        } else if count <= self.grouped_max {
            ViewMode::Grouped
        } else {
            ViewMode::PaginatedTable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityPolicy {
    pub detailed_max: usize,
    pub compact_max: usize,
}

impl Default for DensityPolicy {
    fn default() -> Self {
        DensityPolicy {
            detailed_max: DETAILED_MAX,
            compact_max: COMPACT_MAX,
        }
    }
}

impl Policy for DensityPolicy {
    type Value = Density;
    const NAME: &'static str = "density";

    fn recommend(&self, count: usize) -> Density {
        if count <= self.detailed_max {
            Density::Detailed
        } else if count <= self.compact_max {
            Density::Compact
        } else {
            Density::Minimal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// Value follows the recommendation for the current collection size.
    Auto,
    /// Value frozen at the user's last explicit choice.
    Pinned,
}

/// Auto/pinned state machine for one preference (view mode or density).
///
/// While pinned, collection size changes never touch the value. While auto,
/// the value always equals `policy.recommend(count)` for the last count seen.
#[derive(Debug, Clone)]
pub struct HeuristicSelector<P: Policy> {
    policy: P,
    screen: String,
    kind: SelectionKind,
    value: P::Value,
    count: usize,
}

impl<P: Policy> HeuristicSelector<P> {
    /// Restore from the store: a pinned value is honored, anything else
    /// (missing, auto, unreadable) starts in auto mode.
    pub fn load(policy: P, store: &dyn PreferenceStore, screen: &str, count: usize) -> Self {
        let recommended = policy.recommend(count);
        let auto_flag = store.read(&Self::auto_key(screen));
        let stored = store.read(&Self::value_key(screen));

        let (kind, value) = match auto_flag.as_deref() {
            Some("false") => match stored.as_deref().and_then(P::Value::from_key) {
                Some(value) => (SelectionKind::Pinned, value),
                None => {
                    log::warn!(
                        "Ignoring invalid pinned {} {:?} for {screen}; using {:?}",
                        P::NAME,
                        stored,
                        recommended
                    );
                    (SelectionKind::Auto, recommended)
                }
            },
            Some("true") | None => (SelectionKind::Auto, recommended),
            Some(other) => {
                log::warn!("Unexpected {}_auto flag {other:?} for {screen}", P::NAME);
                (SelectionKind::Auto, recommended)
            }
        };

        log::debug!("{screen}: {} loaded as {:?} {:?}", P::NAME, kind, value);
        HeuristicSelector {
            policy,
            screen: screen.to_string(),
            kind,
            value,
            count,
        }
    }

    pub fn value(&self) -> P::Value {
        self.value
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    pub fn is_auto(&self) -> bool {
        self.kind == SelectionKind::Auto
    }

    pub fn recommended(&self) -> P::Value {
        self.policy.recommend(self.count)
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Explicit user choice: pin it.
    pub fn select(&mut self, value: P::Value, store: &dyn PreferenceStore) {
        self.kind = SelectionKind::Pinned;
        self.value = value;
        log::debug!("{}: {} pinned to {:?}", self.screen, P::NAME, value);
        self.persist(store);
    }

    /// Returns true if the value changed.
    pub fn collection_size_changed(&mut self, count: usize, store: &dyn PreferenceStore) -> bool {
        self.count = count;
        if self.kind == SelectionKind::Pinned {
            return false;
        }
        let recommended = self.policy.recommend(count);
        if recommended == self.value {
            return false;
        }
        log::debug!(
            "{}: {} follows size {count} to {:?}",
            self.screen,
            P::NAME,
            recommended
        );
        self.value = recommended;
        self.write(store, &Self::value_key(&self.screen), recommended.key());
        true
    }

    pub fn enable_auto(&mut self, store: &dyn PreferenceStore) {
        self.kind = SelectionKind::Auto;
        self.value = self.policy.recommend(self.count);
        log::debug!("{}: {} back to auto ({:?})", self.screen, P::NAME, self.value);
        self.persist(store);
    }

    fn value_key(screen: &str) -> String {
        scoped_key(screen, P::NAME)
    }

    fn auto_key(screen: &str) -> String {
        scoped_key(screen, &format!("{}_auto", P::NAME))
    }

    fn persist(&self, store: &dyn PreferenceStore) {
        let auto = if self.is_auto() { "true" } else { "false" };
        self.write(store, &Self::value_key(&self.screen), self.value.key());
        self.write(store, &Self::auto_key(&self.screen), auto);
    }

    fn write(&self, store: &dyn PreferenceStore, key: &str, value: &str) {
        if let Err(e) = store.write(key, value) {
            log::warn!("Failed to save {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    fn view_mode(store: &MemoryStore, count: usize) -> HeuristicSelector<ViewModePolicy> {
        HeuristicSelector::load(ViewModePolicy::default(), store, "accounts", count)
    }

    #[test]
    fn view_mode_thresholds() {
        let p = ViewModePolicy::default();
        assert_eq!(p.recommend(0), ViewMode::Flat);
        assert_eq!(p.recommend(15), ViewMode::Flat);
        assert_eq!(p.recommend(16), ViewMode::Virtualized);
        assert_eq!(p.recommend(30), ViewMode::Virtualized);
        assert_eq!(p.recommend(31), ViewMode::Grouped);
        assert_eq!(p.recommend(50), ViewMode::Grouped);
        assert_eq!(p.recommend(51), ViewMode::PaginatedTable);
        assert_eq!(p.recommend(75), ViewMode::PaginatedTable);
    }

    #[test]
    fn density_thresholds() {
        let p = DensityPolicy::default();
        assert_eq!(p.recommend(20), Density::Detailed);
        assert_eq!(p.recommend(21), Density::Compact);
        assert_eq!(p.recommend(50), Density::Compact);
        assert_eq!(p.recommend(51), Density::Minimal);
    }

    #[test]
    fn fresh_load_is_auto() {
        let store = MemoryStore::new();
        let sel = view_mode(&store, 75);
        assert!(sel.is_auto());
        assert_eq!(sel.value(), ViewMode::PaginatedTable);
    }

    #[test]
    fn auto_follows_every_size_change() {
        let store = MemoryStore::new();
        let mut sel = view_mode(&store, 3);
        for n in [3, 20, 40, 75, 10, 51, 0] {
            sel.collection_size_changed(n, &store);
            assert_eq!(sel.value(), ViewModePolicy::default().recommend(n));
            assert!(sel.is_auto());
        }
        assert_eq!(store.read("accounts.view_mode").as_deref(), Some("flat"));
    }

    #[test]
    fn pinned_survives_size_changes() {
        let store = MemoryStore::new();
        let mut sel = view_mode(&store, 3);
        sel.select(ViewMode::Grouped, &store);
        for n in [0, 16, 100, 1_000] {
            assert!(!sel.collection_size_changed(n, &store));
            assert_eq!(sel.value(), ViewMode::Grouped);
        }
        assert_eq!(sel.recommended(), ViewMode::PaginatedTable);
    }

    #[test]
    fn pinned_choice_is_restored() {
        let store = MemoryStore::new();
        view_mode(&store, 3).select(ViewMode::Virtualized, &store);

        let sel = view_mode(&store, 200);
        assert_eq!(sel.kind(), SelectionKind::Pinned);
        assert_eq!(sel.value(), ViewMode::Virtualized);
    }

    #[test]
    fn persisted_auto_recomputes_from_count() {
        let store = MemoryStore::new();
        store.write("accounts.view_mode", "flat").unwrap();
        store.write("accounts.view_mode_auto", "true").unwrap();
        let sel = view_mode(&store, 40);
        assert!(sel.is_auto());
        assert_eq!(sel.value(), ViewMode::Grouped);
    }

    #[test]
    fn invalid_pinned_value_falls_back_to_auto() {
        let store = MemoryStore::new();
        store.write("accounts.view_mode", "carousel").unwrap();
        store.write("accounts.view_mode_auto", "false").unwrap();
        let sel = view_mode(&store, 20);
        assert!(sel.is_auto());
        assert_eq!(sel.value(), ViewMode::Virtualized);
    }

    #[test]
    fn enable_auto_uses_current_count() {
        let store = MemoryStore::new();
        let mut sel = view_mode(&store, 10);
        sel.select(ViewMode::PaginatedTable, &store);
        sel.collection_size_changed(45, &store);
        sel.enable_auto(&store);
        assert!(sel.is_auto());
        assert_eq!(sel.value(), ViewMode::Grouped);
        assert_eq!(store.read("accounts.view_mode_auto").as_deref(), Some("true"));
        assert_eq!(store.read("accounts.view_mode").as_deref(), Some("grouped"));
    }

    #[test]
    fn density_uses_its_own_keys() {
        let store = MemoryStore::new();
        let mut sel = HeuristicSelector::load(DensityPolicy::default(), &store, "emails", 5);
        sel.select(Density::Minimal, &store);
        assert_eq!(store.read("emails.density").as_deref(), Some("minimal"));
        assert_eq!(store.read("emails.density_auto").as_deref(), Some("false"));
        assert_eq!(store.read("emails.view_mode"), None);
    }
}
