//! Study streak: consecutive calendar days with at least one journal entry.
//!
//! Entry ids are creation timestamps in epoch milliseconds. Days are taken in
//! the timezone of the `now` value, the same clock that defines "today".

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;

/// Streak count plus its display label.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreakInfo {
    pub days: u32,
    pub label: String,
}

impl StreakInfo {
    pub fn new(days: u32) -> Self {
        let label = if days == 1 {
            "1 dia".to_string()
        } else {
            format!("{} dias", days)
        };
        Self { days, label }
    }
}

/// Count consecutive active days ending today or yesterday.
///
/// Returns 0 when the latest active day is older than yesterday. Days after
/// today are ignored.
pub fn streak_days<Tz, I>(ids: I, now: &DateTime<Tz>) -> u32
where
    Tz: TimeZone,
    I: IntoIterator<Item = i64>,
{
    let tz = now.timezone();
    let today = now.date_naive();

    let days: BTreeSet<NaiveDate> = ids
        .into_iter()
        .filter_map(|id| tz.timestamp_millis_opt(id).single())
        .map(|at| at.date_naive())
        .filter(|day| *day <= today)
        .collect();

    let mut newest_first = days.into_iter().rev();
    let Some(latest) = newest_first.next() else {
        return 0;
    };

    let yesterday = today.checked_sub_days(Days::new(1));
    if latest != today && Some(latest) != yesterday {
        return 0;
    }

    let mut count = 1;
    let mut previous = latest;
    for day in newest_first {
        if previous.checked_sub_days(Days::new(1)) != Some(day) {
            break;
        }
        count += 1;
        previous = day;
    }
    count
}
