//! Rejects budgets that would share a scope and part of a window with
//! another active budget.

use chrono::NaiveDate;

use crate::error::{EngineError, Result};
use crate::store::Budget;

/// Two budgets share a scope when both are family-wide or both reference
/// the same category.
pub fn same_scope(a: Option<i32>, b: Option<i32>) -> bool {
    a == b
}

/// Open-interval intersection: a window that starts on the day another ends
/// does not overlap it.
pub fn windows_overlap(
    candidate_start: NaiveDate,
    candidate_end: NaiveDate,
    existing_start: NaiveDate,
    existing_end: NaiveDate,
) -> bool {
    candidate_end > existing_start && candidate_start < existing_end
}

/// Finds the first active budget colliding with the candidate scope and
/// window. Candidates are visited in ascending `(start_date, id)` order.
pub fn find_overlap<'a>(
    existing: &'a [Budget],
    category_id: Option<i32>,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<i32>,
) -> Option<&'a Budget> {
    let mut candidates: Vec<&Budget> = existing
        .iter()
        .filter(|b| b.is_active)
        .filter(|b| Some(b.id) != exclude_id)
        .collect();
    candidates.sort_by_key(|b| (b.start_date, b.id));

    candidates.into_iter().find(|b| {
        same_scope(b.category_id, category_id)
            && windows_overlap(start, end, b.start_date, b.end_date)
    })
}

/// Returns [`EngineError::OverlapExists`] naming the first collision.
pub fn ensure_no_overlap(
    existing: &[Budget],
    category_id: Option<i32>,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<i32>,
) -> Result<()> {
    match find_overlap(existing, category_id, start, end, exclude_id) {
        Some(b) => Err(EngineError::OverlapExists {
            budget_id: b.id,
            name: b.name.clone(),
        }),
        None => Ok(()),
    }
}
