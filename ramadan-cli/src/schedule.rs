//! Local-time helpers for the terminal calendar: today's row, the next
//! sahur/iftar and the countdown to it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use ramadan_core::CalendarEntry;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Sahur,
    Iftar,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Sahur => "Sahur",
            EventKind::Iftar => "Iftar",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextEvent<'a> {
    pub kind: EventKind,
    pub at: NaiveDateTime,
    pub entry: &'a CalendarEntry,
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
}

/// Accepts 24h (`05:42`, `5:42`) and 12h (`5:42 AM`, `5:42pm`) times.
pub fn parse_time(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    ["%H:%M", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())
}

fn event_at(date: &str, time: &str) -> Option<NaiveDateTime> {
    Some(parse_date(date)?.and_time(parse_time(time)?))
}

/// Next sahur or iftar strictly after `now`.
///
/// When today is in the calendar, only today and (after iftar) tomorrow's
/// sahur are considered, and nothing is returned past the last day.
/// Otherwise the first upcoming event anywhere in the calendar is used.
pub fn next_event(entries: &[CalendarEntry], now: NaiveDateTime) -> Option<NextEvent<'_>> {
    let today = now.date().format(DATE_FORMAT).to_string();

    match entries.iter().position(|e| e.date == today) {
        Some(idx) => upcoming_on(&entries[idx], now).or_else(|| {
            let tomorrow = entries.get(idx + 1)?;
            let at = event_at(&tomorrow.date, &tomorrow.sahur)?;
            Some(NextEvent { kind: EventKind::Sahur, at, entry: tomorrow })
        }),
        None => entries.iter().find_map(|entry| upcoming_on(entry, now)),
    }
}

fn upcoming_on(entry: &CalendarEntry, now: NaiveDateTime) -> Option<NextEvent<'_>> {
    [(EventKind::Sahur, &entry.sahur), (EventKind::Iftar, &entry.iftar)]
        .into_iter()
        .find_map(|(kind, time)| {
            let at = event_at(&entry.date, time)?;
            (now < at).then_some(NextEvent { kind, at, entry })
        })
}

/// `HH:MM:SS`, clamped at zero; hours are not wrapped at 24.
pub fn format_countdown(remaining: TimeDelta) -> String {
    let total = remaining.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
