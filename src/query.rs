//! Pure derivations over a task list. Apply in this order: status, date range,
//! then pagination. Page counts come from the filtered set before slicing.

use crate::models::{DateRange, StatusFilter, Task};

pub const DEFAULT_PER_PAGE: usize = 20;

pub fn filter_by_status(tasks: &[Task], filter: StatusFilter) -> Vec<Task> {
    tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
}

/// Keeps tasks whose `created` instant lies within `range`, bounds inclusive.
/// An inverted range is not corrected here; it simply matches nothing.
pub fn filter_by_date_range(tasks: &[Task], range: &DateRange) -> Vec<Task> {
    if range.is_unbounded() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|t| range.contains(t.created))
        .cloned()
        .collect()
}

/// Returns page `page` (1-indexed) of `items`. Page 0 or a page past the end
/// yields an empty slice.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let from = (page - 1).saturating_mul(per_page);
    if from >= items.len() {
        return &[];
    }
    let to = from.saturating_add(per_page).min(items.len());
    &items[from..to]
}

/// `ceil(len / per_page)`; an empty list has zero pages, not one.
pub fn calculate_total_pages<T>(items: &[T], per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    items.len().div_ceil(per_page)
}
