use crate::core::compare::sort_records;
use crate::core::filter::{collection_stats, CollectionStats};
use crate::core::grouping::{group, GroupBy};
use crate::core::heuristic::{Density, ViewMode};
use crate::core::models::Record;
use crate::core::pagination::{page_buttons, PageWindow, DEFAULT_PAGE_BUTTONS};
use crate::core::selection::SelectionStats;
use crate::core::virtualize::VisibleRange;

use super::ScreenModel;

/// One materialized row.
#[derive(Debug, Clone)]
pub struct Row<'a, R> {
    pub record: &'a R,
    pub selected: bool,
    pub busy: bool,
    pub density: Density,
}

#[derive(Debug, Clone)]
pub struct GroupPlan<'a, R> {
    pub key: String,
    pub label: String,
    pub error_count: usize,
    pub active_count: usize,
    pub rows: Vec<Row<'a, R>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// Nothing has been fetched yet.
    Loading,
    NoRecords,
    /// Records exist but the filters exclude all of them.
    NoMatches,
}

#[derive(Debug, Clone)]
pub enum PlanBody<'a, R> {
    Empty {
        reason: EmptyReason,
    },
    Flat {
        rows: Vec<Row<'a, R>>,
    },
    Virtualized {
        range: VisibleRange,
        rows: Vec<Row<'a, R>>,
    },
    Grouped {
        group_by: GroupBy,
        groups: Vec<GroupPlan<'a, R>>,
    },
    Paginated {
        window: PageWindow,
        buttons: Vec<usize>,
        rows: Vec<Row<'a, R>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary {
    pub selected: usize,
    pub all_visible: bool,
    pub partially_visible: bool,
    pub stats: SelectionStats,
}

/// What to draw, derived from scratch on every call.
#[derive(Debug, Clone)]
pub struct RenderPlan<'a, R> {
    pub view_mode: ViewMode,
    pub view_mode_auto: bool,
    pub recommended_view_mode: ViewMode,
    pub density: Density,
    pub density_auto: bool,
    pub total_count: usize,
    pub filtered_count: usize,
    pub active_filters: usize,
    /// Counts over the whole collection, filters ignored.
    pub stats: CollectionStats,
    pub selection: SelectionSummary,
    pub body: PlanBody<'a, R>,
}

impl<R: Record> ScreenModel<R> {
    pub fn render_plan(&self) -> RenderPlan<'_, R> {
        let mut filtered = self.filtered();
        let view_mode = self.view_mode.value();
        if view_mode != ViewMode::Grouped {
            sort_records(&mut filtered, &self.sort);
        }

        let visible: Vec<R::Id> = filtered.iter().map(|r| r.id()).collect();
        let selection = SelectionSummary {
            selected: self.selection.len(),
            all_visible: self.selection.is_all_selected(&visible),
            partially_visible: self.selection.is_partially_selected(&visible),
            stats: self.selection.stats(&self.collection),
        };

        let body = if filtered.is_empty() {
            let reason = if !self.loaded {
                EmptyReason::Loading
            } else if self.collection.is_empty() {
                EmptyReason::NoRecords
            } else {
                EmptyReason::NoMatches
            };
            PlanBody::Empty { reason }
        } else {
            match view_mode {
                ViewMode::Flat => PlanBody::Flat {
                    rows: self.rows(&filtered),
                },
                ViewMode::Virtualized => {
                    let mut range = self.virtualizer.visible_range();
                    if range.end_index > filtered.len() {
                        log::debug!(
                            "{}: virtualizer holds {} items, plan has {}",
                            self.screen,
                            self.virtualizer.count(),
                            filtered.len()
                        );
                        range.end_index = filtered.len();
                        range.start_index = range.start_index.min(range.end_index);
                        range.item_offsets.truncate(range.end_index - range.start_index);
                    }
                    let rows = self.rows(&filtered[range.start_index..range.end_index]);
                    PlanBody::Virtualized { range, rows }
                }
                ViewMode::Grouped => PlanBody::Grouped {
                    group_by: self.group_by,
                    groups: group(&filtered, self.group_by)
                        .into_iter()
                        .map(|bucket| GroupPlan {
                            rows: self.rows(&bucket.members),
                            key: bucket.key,
                            label: bucket.label,
                            error_count: bucket.error_count,
                            active_count: bucket.active_count,
                        })
                        .collect(),
                },
                ViewMode::PaginatedTable => {
                    let window = PageWindow::new(
                        self.pager.page_index(),
                        self.pager.page_size(),
                        filtered.len(),
                    );
                    let (start, end) = window.bounds();
                    PlanBody::Paginated {
                        window,
                        buttons: page_buttons(&window, DEFAULT_PAGE_BUTTONS),
                        rows: self.rows(&filtered[start..end]),
                    }
                }
            }
        };

        RenderPlan {
            view_mode,
            view_mode_auto: self.view_mode.is_auto(),
            recommended_view_mode: self.view_mode.recommended(),
            density: self.density.value(),
            density_auto: self.density.is_auto(),
            total_count: self.collection.len(),
            filtered_count: filtered.len(),
            active_filters: self.filters.active_filter_count(),
            stats: collection_stats(&self.collection),
            selection,
            body,
        }
    }

    fn rows<'a>(&self, records: &[&'a R]) -> Vec<Row<'a, R>> {
        let density = self.density.value();
        records
            .iter()
            .map(|&record| {
                let id = record.id();
                Row {
                    record,
                    selected: self.selection.contains(&id),
                    busy: self.busy.contains(&id),
                    density,
                }
            })
            .collect()
    }
}
