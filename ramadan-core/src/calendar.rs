use crate::model::{CalendarEntry, FastingDay};

/// Project provider records into calendar entries, keeping provider order.
pub fn to_calendar(days: Vec<FastingDay>) -> Vec<CalendarEntry> {
    days.into_iter().map(CalendarEntry::from).collect()
}
