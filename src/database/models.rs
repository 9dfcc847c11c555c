// src/database/models.rs
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{AircraftType, FlightInfo, SpeedType};

/// Column list shared by every `flight_infos` select
pub(crate) const FLIGHT_INFO_COLUMNS: &str = "id, registration, first_seen, tracked_ns, \
    latitude, longitude, last_update, speed, speed_type, heading, model, model_description, \
    manufacturer, year, operator, vertical_speed, aircraft_type, departure, destination, \
    grounded, call_sign, has_picture, flights_count";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FlightInfoRow {
    id: String,
    registration: Option<String>,
    first_seen: Option<DateTime<Utc>>,
    tracked_ns: i64, // Store tracked duration as nanoseconds
    latitude: f32,
    longitude: f32,
    last_update: DateTime<Utc>,
    speed: f32,
    speed_type: i32,
    heading: f32,
    model: Option<String>,
    model_description: Option<String>,
    manufacturer: Option<String>,
    year: Option<i16>,
    operator: Option<String>,
    vertical_speed: i32,
    aircraft_type: i32,
    departure: Option<String>,
    destination: Option<String>,
    grounded: bool,
    call_sign: Option<String>,
    has_picture: bool,
    flights_count: i32,
}

pub(crate) fn tracked_to_ns(tracked: Duration) -> i64 {
    i64::try_from(tracked.as_nanos()).unwrap_or(i64::MAX)
}

fn tracked_from_ns(ns: i64) -> Duration {
    Duration::from_nanos(u64::try_from(ns).unwrap_or(0))
}

impl From<FlightInfoRow> for FlightInfo {
    fn from(row: FlightInfoRow) -> Self {
        Self {
            id: row.id,
            registration: row.registration,
            first_seen: row.first_seen,
            tracked: tracked_from_ns(row.tracked_ns),
            latitude: row.latitude,
            longitude: row.longitude,
            last_update: row.last_update,
            speed: row.speed,
            speed_type: SpeedType::from(row.speed_type),
            heading: row.heading,
            model: row.model,
            model_description: row.model_description,
            manufacturer: row.manufacturer,
            year: row.year,
            operator: row.operator,
            vertical_speed: row.vertical_speed,
            aircraft_type: AircraftType::from(row.aircraft_type),
            departure: row.departure,
            destination: row.destination,
            grounded: row.grounded,
            call_sign: row.call_sign,
            has_picture: row.has_picture,
            flights_count: row.flights_count,
        }
    }
}
