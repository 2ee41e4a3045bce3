use indexmap::IndexMap;
use serde::Serialize;

use crate::core::models::{Classifier, Record};

/// A single field filter; `All` never excludes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilter<T> {
    All,
    Only(T),
}

impl<T> Default for FieldFilter<T> {
    fn default() -> Self {
        FieldFilter::All
    }
}

impl<T: PartialEq> FieldFilter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            FieldFilter::All => true,
            FieldFilter::Only(wanted) => wanted == value,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, FieldFilter::Only(_))
    }
}

/// Everything the user typed or picked to narrow the collection.
pub struct FilterState<R: Record> {
    pub search_text: String,
    pub status: FieldFilter<R::Status>,
    pub category: FieldFilter<R::Category>,
    pub secondary_status: FieldFilter<R::Secondary>,
}

// Manual impls: deriving would demand the same traits of `R` itself.
impl<R: Record> Clone for FilterState<R> {
    fn clone(&self) -> Self {
        FilterState {
            search_text: self.search_text.clone(),
            status: self.status,
            category: self.category,
            secondary_status: self.secondary_status,
        }
    }
}

impl<R: Record> PartialEq for FilterState<R> {
    fn eq(&self, other: &Self) -> bool {
        self.search_text == other.search_text
            && self.status == other.status
            && self.category == other.category
            && self.secondary_status == other.secondary_status
    }
}

impl<R: Record> std::fmt::Debug for FilterState<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterState")
            .field("search_text", &self.search_text)
            .field("status", &self.status)
            .field("category", &self.category)
            .field("secondary_status", &self.secondary_status)
            .finish()
    }
}

impl<R: Record> Default for FilterState<R> {
    fn default() -> Self {
        FilterState {
            search_text: String::new(),
            status: FieldFilter::All,
            category: FieldFilter::All,
            secondary_status: FieldFilter::All,
        }
    }
}

impl<R: Record> FilterState<R> {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn active_filter_count(&self) -> usize {
        [
            !self.search_text.trim().is_empty(),
            self.status.is_active(),
            self.category.is_active(),
            self.secondary_status.is_active(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }
}

/// Combine every active filter into one predicate (logical AND).
pub fn build_predicate<R: Record>(state: &FilterState<R>) -> impl Fn(&R) -> bool {
    let query = state.search_text.trim().to_lowercase();
    let status = state.status;
    let category = state.category;
    let secondary = state.secondary_status;

    move |record: &R| {
        if !query.is_empty()
            && !record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
        {
            return false;
        }
        status.matches(&record.status())
            && category.matches(&record.category())
            && secondary.matches(&record.secondary_status())
    }
}

/// Records passing the filters, in input order.
pub fn apply_filters<'a, R: Record>(records: &'a [R], state: &FilterState<R>) -> Vec<&'a R> {
    let predicate = build_predicate(state);
    records.iter().filter(|r| predicate(r)).collect()
}

/// How many records share one category value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub key: &'static str,
    pub label: &'static str,
    pub count: usize,
}

/// Whole-collection counts shown next to the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub active: usize,
    pub disabled: usize,
    pub error: usize,
    /// Largest category first; ties by key.
    pub by_category: Vec<CategoryCount>,
}

/// Counts over every record, ignoring the current filters.
pub fn collection_stats<R: Record>(records: &[R]) -> CollectionStats {
    let mut stats = CollectionStats {
        total: records.len(),
        ..Default::default()
    };
    let mut categories: IndexMap<R::Category, usize> = IndexMap::new();
    for record in records {
        stats.active += usize::from(record.is_active());
        stats.disabled += usize::from(record.is_disabled());
        stats.error += usize::from(record.is_error());
        *categories.entry(record.category()).or_insert(0) += 1;
    }
    stats.by_category = categories
        .into_iter()
        .map(|(category, count)| CategoryCount {
            key: category.key(),
            label: category.label(),
            count,
        })
        .collect();
    stats
        .by_category
        .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(b.key)));
    stats
}
