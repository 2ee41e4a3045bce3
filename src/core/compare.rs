use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::core::models::{Record, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// One active sort field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: Copy + Eq> SortState<F> {
    pub fn new(field: F) -> Self {
        SortState {
            field,
            direction: SortDirection::Ascending,
        }
    }

    /// Same field flips direction; a new field starts ascending.
    pub fn toggle(&mut self, field: F) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Case-insensitive text ordering. Strings differing only in case are equal,
/// so a stable sort keeps them in input order.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Missing counts are 0.
pub fn compare_count(a: Option<u64>, b: Option<u64>) -> Ordering {
    a.unwrap_or(0).cmp(&b.unwrap_or(0))
}

/// Missing dates sort as the earliest instant.
pub fn compare_date(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    let a = a.unwrap_or(DateTime::<Utc>::MIN_UTC);
    let b = b.unwrap_or(DateTime::<Utc>::MIN_UTC);
    a.cmp(&b)
}

pub fn compare_keys(a: SortKey<'_>, b: SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
        (SortKey::Count(a), SortKey::Count(b)) => compare_count(a, b),
        (SortKey::Date(a), SortKey::Date(b)) => compare_date(a, b),
        // A field always yields the same key kind; mixed kinds only happen
        // if a Record impl is inconsistent.
        _ => Ordering::Equal,
    }
}

pub fn compare<R: Record>(a: &R, b: &R, sort: &SortState<R::SortField>) -> Ordering {
    let ord = compare_keys(a.sort_key(sort.field), b.sort_key(sort.field));
    sort.direction.apply(ord)
}

/// Stable sort of borrowed records.
pub fn sort_records<R: Record>(records: &mut [&R], sort: &SortState<R::SortField>) {
    records.sort_by(|a, b| compare(*a, *b, sort));
}
