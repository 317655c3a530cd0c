//! Week resolver: which variant a calendar week gets, and its sessions.
//!
//! Stateless. Works the same for past, current and future weeks; logged
//! history is layered on by the caller (see `history::WeekProgress`).

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::plan::{PlanSnapshot, SessionRef};
use crate::time::{week_monday, weeks_between};

/// Variant used when no rotation is configured.
pub const DEFAULT_VARIANT_KEY: &str = "A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    pub week_start: NaiveDate,
    pub variant_key: String,
    pub sessions: Vec<SessionRef>,
    pub total_planned: usize,
}

/// Resolve the week containing `date` (any day of the week is accepted).
pub fn resolve_week(plan: &PlanSnapshot, date: NaiveDate) -> WeekSchedule {
    let week_start = week_monday(date);

    let variant_key = if plan.rotation.is_empty() {
        DEFAULT_VARIANT_KEY.to_string()
    } else {
        let len = plan.rotation.len() as i64;
        let since_anchor = weeks_between(plan.anchor_week_start, week_start);
        let index = ((since_anchor % len) + len) % len;
        plan.rotation[index as usize].clone()
    };

    let sessions = plan.sessions_for(&variant_key).to_vec();
    WeekSchedule {
        week_start,
        total_planned: sessions.len(),
        variant_key,
        sessions,
    }
}

/// `count` consecutive weeks starting with the week containing `from`.
pub fn resolve_weeks(plan: &PlanSnapshot, from: NaiveDate, count: usize) -> Vec<WeekSchedule> {
    let first = week_monday(from);
    (0..count)
        .map(|i| resolve_week(plan, first + Duration::weeks(i as i64)))
        .collect()
}
