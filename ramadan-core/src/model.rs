use serde::{Deserialize, Serialize};

/// Coordinates as received from the caller. Forwarded upstream verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coordinate {
    pub lat: String,
    pub lon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FastingTime {
    pub sahur: String,
    pub iftar: String,
}

/// One day of the provider's fasting schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FastingDay {
    pub date: String,
    pub time: FastingTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FastingData {
    pub fasting: Vec<FastingDay>,
}

/// Flattened day returned to calendar clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub date: String,
    pub sahur: String,
    pub iftar: String,
}

impl From<FastingDay> for CalendarEntry {
    fn from(day: FastingDay) -> Self {
        Self { date: day.date, sahur: day.time.sahur, iftar: day.time.iftar }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootMessage {
    pub message: String,
}

impl Default for RootMessage {
    fn default() -> Self {
        Self { message: "Salaam World".to_string() }
    }
}
