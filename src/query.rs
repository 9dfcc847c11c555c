//! Filtering of stored flight infos for read-side consumers

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::models::FlightInfo;

/// Read-side filter over records loaded from the store
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightFilter {
    /// Only flights with a known departure and destination
    pub dep_dest: bool,
    /// Only flights currently in the air
    pub in_air: bool,
    /// Only flights tracked for less than a day
    pub today: bool,
    /// Only flights updated within the last hour
    pub recent: bool,
    /// Case-insensitive match against departure or destination
    pub query: Option<String>,
    /// Maximum number of results
    pub limit: usize,
}

impl Default for FlightFilter {
    fn default() -> Self {
        Self {
            dep_dest: false,
            in_air: false,
            today: false,
            recent: false,
            query: None,
            limit: 1000,
        }
    }
}

impl FlightFilter {
    pub fn matches(&self, info: &FlightInfo, now: DateTime<Utc>) -> bool {
        if self.dep_dest && (info.departure.is_none() || info.destination.is_none()) {
            return false;
        }
        if self.in_air && info.grounded {
            return false;
        }
        if self.today && info.tracked_clamped() {
            return false;
        }
        if self.recent && info.last_update < now - TimeDelta::hours(1) {
            return false;
        }
        if let Some(query) = &self.query {
            let query = query.to_lowercase();
            let contains = |location: &Option<String>| {
                location
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains(&query))
            };
            if !contains(&info.departure) && !contains(&info.destination) {
                return false;
            }
        }
        true
    }

    /// Matching records in store order, at most `limit` of them
    pub fn apply<'a>(&self, flights: &'a [FlightInfo], now: DateTime<Utc>) -> Vec<&'a FlightInfo> {
        flights
            .iter()
            .filter(|info| self.matches(info, now))
            .take(self.limit)
            .collect()
    }
}
