use crate::todo::{FieldUpdate, TodoPatch};
use chrono::{DateTime, Utc};

/// Derives `completed_at` from the completion flag of an update payload.
///
/// - `is_completed: Some(true)` stamps `now`, overwriting any earlier directive.
/// - `is_completed: Some(false)` unsets the timestamp.
/// - no flag leaves the payload untouched.
pub fn apply_completion_rule(patch: &mut TodoPatch, now: DateTime<Utc>) {
    match patch.is_completed {
        Some(true) => patch.completed_at = FieldUpdate::Set(now),
        Some(false) => patch.completed_at = FieldUpdate::Unset,
        None => {}
    }
}
