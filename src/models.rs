//! Data models.
//!
//! [`RawAircraft`] mirrors one entry of the feed's `acList` array. [`FlightInfo`]
//! is the storage-ready form built from it, see [`FlightInfo::admit`] for the
//! checks applied before a record may be written.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::errors::ValidationError;

/// Longest tracked duration the store can hold (23:59:59.9999999)
pub const MAX_TRACKED: Duration = Duration::new(86_399, 999_999_900);

/// Maximum field lengths, in characters, fixed by the store schema
pub mod limits {
    pub const ID: usize = 6;
    pub const REGISTRATION: usize = 24;
    pub const MODEL: usize = 16;
    pub const MODEL_DESCRIPTION: usize = 64;
    pub const MANUFACTURER: usize = 32;
    pub const OPERATOR: usize = 192;
    pub const LOCATION: usize = 96;
    pub const CALL_SIGN: usize = 128;
}

/// Aircraft entry as reported by the feed
///
/// Fields missing from the payload take their default value; a field of the
/// wrong JSON type fails decoding of the whole snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawAircraft {
    /// ICAO 24-bit transponder address, hex encoded
    pub icao: String,
    pub reg: Option<String>,
    /// First seen, textual
    pub fseen: Option<String>,
    /// Seconds the aircraft has been tracked for
    pub tsecs: i64,
    pub lat: f32,
    pub long: f32,
    /// Time position was last reported, milliseconds from Unix epoch
    pub pos_time: i64,
    /// Speed in knots
    pub spd: f32,
    pub spd_typ: i32,
    /// Track, degrees clockwise from north
    pub trak: f32,
    /// ICAO model code
    #[serde(rename = "Type")]
    pub model: Option<String>,
    /// Model description
    pub mdl: Option<String>,
    /// Manufacturer
    pub man: Option<String>,
    pub year: Option<String>,
    /// Operator name
    pub op: Option<String>,
    /// Vertical speed in feet per minute
    pub vsi: i32,
    pub species: i32,
    pub from: Option<String>,
    pub to: Option<String>,
    pub gnd: bool,
    pub call: Option<String>,
    pub has_pic: bool,
    pub flights_count: i32,
}

/// How the reported speed was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum SpeedType {
    #[default]
    Ground,
    GroundReversing,
    IndicatedAir,
    TrueAir,
    Unknown(i32),
}

impl From<i32> for SpeedType {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Ground,
            1 => Self::GroundReversing,
            2 => Self::IndicatedAir,
            3 => Self::TrueAir,
            other => Self::Unknown(other),
        }
    }
}

impl SpeedType {
    pub fn code(&self) -> i32 {
        match self {
            Self::Ground => 0,
            Self::GroundReversing => 1,
            Self::IndicatedAir => 2,
            Self::TrueAir => 3,
            Self::Unknown(code) => *code,
        }
    }
}

/// Aircraft type (feed "species")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum AircraftType {
    #[default]
    None,
    LandPlane,
    SeaPlane,
    Amphibian,
    Helicopter,
    Gyrocopter,
    TiltWing,
    GroundVehicle,
    Tower,
    Unknown(i32),
}

impl From<i32> for AircraftType {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::None,
            1 => Self::LandPlane,
            2 => Self::SeaPlane,
            3 => Self::Amphibian,
            4 => Self::Helicopter,
            5 => Self::Gyrocopter,
            6 => Self::TiltWing,
            7 => Self::GroundVehicle,
            8 => Self::Tower,
            other => Self::Unknown(other),
        }
    }
}

impl AircraftType {
    pub fn code(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::LandPlane => 1,
            Self::SeaPlane => 2,
            Self::Amphibian => 3,
            Self::Helicopter => 4,
            Self::Gyrocopter => 5,
            Self::TiltWing => 6,
            Self::GroundVehicle => 7,
            Self::Tower => 8,
            Self::Unknown(code) => *code,
        }
    }
}

/// Tracked aircraft, as held by the record store
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct FlightInfo {
    /// ICAO address, primary key
    pub id: String,
    pub registration: Option<String>,
    /// None when the feed value could not be parsed
    pub first_seen: Option<DateTime<Utc>>,
    /// Time the aircraft has been tracked for
    #[serde_as(as = "serde_with::DurationSecondsWithFrac<f64>")]
    pub tracked: Duration,
    pub latitude: f32,
    pub longitude: f32,
    /// Time position was last reported
    pub last_update: DateTime<Utc>,
    /// Speed in knots
    pub speed: f32,
    pub speed_type: SpeedType,
    /// Angle clockwise in degrees
    pub heading: f32,
    pub model: Option<String>,
    pub model_description: Option<String>,
    pub manufacturer: Option<String>,
    /// Year manufactured, None when the feed value could not be parsed
    pub year: Option<i16>,
    pub operator: Option<String>,
    /// Vertical speed in feet per minute
    pub vertical_speed: i32,
    pub aircraft_type: AircraftType,
    /// Code and name of departure airport
    pub departure: Option<String>,
    /// Code and name of destination airport
    pub destination: Option<String>,
    pub grounded: bool,
    pub call_sign: Option<String>,
    pub has_picture: bool,
    /// Number of flights recorded
    pub flights_count: i32,
}

impl From<&RawAircraft> for FlightInfo {
    fn from(raw: &RawAircraft) -> Self {
        Self {
            id: raw.icao.clone(),
            registration: raw.reg.clone(),
            first_seen: raw.fseen.as_deref().and_then(parse_first_seen),
            tracked: Duration::from_secs(u64::try_from(raw.tsecs).unwrap_or(0)),
            latitude: raw.lat,
            longitude: raw.long,
            // Out of range offsets fall back to the epoch itself
            last_update: DateTime::from_timestamp_millis(raw.pos_time).unwrap_or_default(),
            speed: raw.spd,
            speed_type: SpeedType::from(raw.spd_typ),
            heading: raw.trak,
            model: raw.model.clone(),
            model_description: raw.mdl.clone(),
            manufacturer: raw.man.clone(),
            year: raw.year.as_deref().and_then(|y| y.trim().parse().ok()),
            operator: raw.op.clone(),
            vertical_speed: raw.vsi,
            aircraft_type: AircraftType::from(raw.species),
            departure: raw.from.clone(),
            destination: raw.to.clone(),
            grounded: raw.gnd,
            call_sign: raw.call.clone(),
            has_picture: raw.has_pic,
            flights_count: raw.flights_count,
        }
    }
}

impl FlightInfo {
    /// Speed in kilometers per hour
    pub fn speed_km(&self) -> f32 {
        self.speed * 1.852001
    }

    /// Vertical speed in meters per second
    pub fn vertical_speed_m(&self) -> i32 {
        (self.vertical_speed as f32 * 0.3048) as i32
    }

    pub fn departure_city(&self) -> Option<&str> {
        self.departure.as_deref().and_then(location_city)
    }

    pub fn departure_country(&self) -> Option<&str> {
        self.departure.as_deref().and_then(location_country)
    }

    pub fn departure_id(&self) -> Option<&str> {
        self.departure.as_deref().and_then(location_id)
    }

    pub fn destination_city(&self) -> Option<&str> {
        self.destination.as_deref().and_then(location_city)
    }

    pub fn destination_country(&self) -> Option<&str> {
        self.destination.as_deref().and_then(location_country)
    }

    pub fn destination_id(&self) -> Option<&str> {
        self.destination.as_deref().and_then(location_id)
    }

    /// True when the tracked duration has been clamped to [`MAX_TRACKED`]
    pub fn tracked_clamped(&self) -> bool {
        self.tracked == MAX_TRACKED
    }

    /// Clamp the tracked duration to what the store can hold
    pub fn clamp_tracked(&mut self) {
        if self.tracked >= Duration::from_secs(24 * 60 * 60) {
            self.tracked = MAX_TRACKED;
        }
    }

    /// Names of fields exceeding their storage limits, empty when valid
    pub fn validate(&self) -> Vec<&'static str> {
        let mut errors = Vec::new();

        if self.id.is_empty() || exceeds(Some(self.id.as_str()), limits::ID) {
            errors.push("Id");
        }

        let bounded = [
            ("RegistrationNumber", &self.registration, limits::REGISTRATION),
            ("Model", &self.model, limits::MODEL),
            ("ModelDescription", &self.model_description, limits::MODEL_DESCRIPTION),
            ("Manufacturer", &self.manufacturer, limits::MANUFACTURER),
            ("Operator", &self.operator, limits::OPERATOR),
            ("Departure", &self.departure, limits::LOCATION),
            ("Destination", &self.destination, limits::LOCATION),
            ("CallSign", &self.call_sign, limits::CALL_SIGN),
        ];
        for (name, value, max) in bounded {
            if exceeds(value.as_deref(), max) {
                errors.push(name);
            }
        }

        errors
    }

    /// Prepare the record for storage: clamp the tracked duration, then
    /// reject it if any field exceeds its limit.
    pub fn admit(mut self) -> Result<Self, ValidationError> {
        self.clamp_tracked();
        let fields = self.validate();
        if fields.is_empty() {
            Ok(self)
        } else {
            Err(ValidationError {
                id: self.id,
                fields,
            })
        }
    }
}

fn exceeds(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|v| v.chars().count() > max)
}

/// Split a location string into city and country.
///
/// - `<code> <city>, <country>`
/// - `<code> <airport>, <city>, <country>`
///
/// Any other shape yields None for both.
fn split_location(location: &str) -> (Option<&str>, Option<&str>) {
    let parts: Vec<&str> = location.split(',').collect();
    match parts[..] {
        [code_city, country] => (strip_code(code_city), Some(country.trim())),
        [_, city, country] => (Some(city.trim()), Some(country.trim())),
        _ => (None, None),
    }
}

/// Drop the 4 character airport code in front of the city
fn strip_code(code_city: &str) -> Option<&str> {
    code_city
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(code_city.len()))
        .nth(4)
        .map(|i| code_city[i..].trim())
}

pub fn location_city(location: &str) -> Option<&str> {
    split_location(location).0
}

pub fn location_country(location: &str) -> Option<&str> {
    split_location(location).1
}

/// Airport code, the first whitespace-delimited token
pub fn location_id(location: &str) -> Option<&str> {
    location.split_whitespace().next()
}

/// Parse first seen time, accepting `/Date(<ms>)/`, RFC 3339 and
/// `YYYY-MM-DD HH:MM:SS` (UTC)
fn parse_first_seen(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some(inner) = value
        .strip_prefix("/Date(")
        .and_then(|v| v.strip_suffix(")/"))
    {
        // Optional trailing offset, e.g. /Date(1526225044913+0000)/
        let end = inner
            .char_indices()
            .skip(1)
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(inner.len(), |(i, _)| i);
        return inner[..end]
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_raw() -> RawAircraft {
        RawAircraft {
            icao: "4CA2D6".to_string(),
            reg: Some("EI-DYO".to_string()),
            fseen: Some("/Date(1526225044913)/".to_string()),
            tsecs: 3_600,
            lat: 53.42,
            long: -6.27,
            pos_time: 1_526_228_644_913,
            spd: 250.0,
            spd_typ: 0,
            trak: 87.5,
            model: Some("B738".to_string()),
            mdl: Some("Boeing 737NG 8AS/W".to_string()),
            man: Some("Boeing".to_string()),
            year: Some("2009".to_string()),
            op: Some("Ryanair".to_string()),
            vsi: 1_000,
            species: 1,
            from: Some("EIDW Dublin, Ireland".to_string()),
            to: Some("EGLL London Heathrow, London, United Kingdom".to_string()),
            gnd: false,
            call: Some("RYR12AB".to_string()),
            has_pic: true,
            flights_count: 4,
        }
    }

    #[test]
    fn parse_raw_aircraft() {
        let s = r#"{
            "Icao": "4CA2D6",
            "Reg": "EI-DYO",
            "Fseen": "/Date(1526225044913)/",
            "Tsecs": 3600,
            "Lat": 53.42,
            "Long": -6.27,
            "PosTime": 1526228644913,
            "Spd": 250.0,
            "SpdTyp": 0,
            "Trak": 87.5,
            "Type": "B738",
            "Mdl": "Boeing 737NG 8AS/W",
            "Man": "Boeing",
            "Year": "2009",
            "Op": "Ryanair",
            "Vsi": 1000,
            "Species": 1,
            "From": "EIDW Dublin, Ireland",
            "To": "EGLL London Heathrow, London, United Kingdom",
            "Gnd": false,
            "Call": "RYR12AB",
            "HasPic": true,
            "FlightsCount": 4
        }"#;
        let raw: RawAircraft = serde_json::from_str(s).unwrap();

        assert_eq!(raw, sample_raw());
    }

    #[test]
    fn parse_raw_aircraft_missing_fields() {
        let raw: RawAircraft =
            serde_json::from_str(r#"{"Icao": "ABC123", "Lat": 11.0, "Long": 21.0}"#).unwrap();

        assert_eq!(raw.icao, "ABC123");
        assert_eq!(raw.lat, 11.0);
        assert_eq!(raw.long, 21.0);
        assert_eq!(raw.model, None);
        assert!(!raw.gnd);
    }

    #[test]
    fn parse_raw_aircraft_wrong_type() {
        let result = serde_json::from_str::<RawAircraft>(r#"{"Icao": "ABC123", "Lat": "north"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn map_to_flight_info() {
        let info = FlightInfo::from(&sample_raw());

        assert_eq!(info.id, "4CA2D6");
        assert_eq!(
            info.first_seen,
            DateTime::from_timestamp_millis(1_526_225_044_913)
        );
        assert_eq!(info.tracked, Duration::from_secs(3_600));
        assert_eq!(
            info.last_update,
            Utc.with_ymd_and_hms(2018, 5, 13, 16, 24, 4).unwrap()
                + chrono::TimeDelta::milliseconds(913)
        );
        assert_eq!(info.speed_type, SpeedType::Ground);
        assert_eq!(info.aircraft_type, AircraftType::LandPlane);
        assert_eq!(info.year, Some(2009));
        assert_eq!(info.model.as_deref(), Some("B738"));
        assert_eq!(info.vertical_speed_m(), 304);
        assert!((info.speed_km() - 463.00025).abs() < 0.001);
    }

    #[test]
    fn map_is_deterministic() {
        let raw = sample_raw();
        let first = FlightInfo::from(&raw);
        let _ = FlightInfo::from(&RawAircraft::default());
        let second = FlightInfo::from(&raw);

        assert_eq!(first, second);
    }

    #[test]
    fn map_unparseable_values() {
        let raw = RawAircraft {
            icao: "ABC123".to_string(),
            fseen: Some("yesterday".to_string()),
            year: Some("19xx".to_string()),
            tsecs: -5,
            spd_typ: 9,
            species: 42,
            ..Default::default()
        };
        let info = FlightInfo::from(&raw);

        assert_eq!(info.first_seen, None);
        assert_eq!(info.year, None);
        assert_eq!(info.tracked, Duration::ZERO);
        assert_eq!(info.last_update, DateTime::UNIX_EPOCH);
        assert_eq!(info.speed_type, SpeedType::Unknown(9));
        assert_eq!(info.aircraft_type, AircraftType::Unknown(42));
    }

    #[test]
    fn first_seen_formats() {
        let expected = Utc.with_ymd_and_hms(2018, 5, 13, 15, 24, 4).unwrap();

        assert_eq!(
            parse_first_seen("/Date(1526225044000+0000)/"),
            Some(expected)
        );
        assert_eq!(parse_first_seen("2018-05-13T15:24:04Z"), Some(expected));
        assert_eq!(parse_first_seen("2018-05-13 15:24:04"), Some(expected));
        assert_eq!(parse_first_seen("/Date()/"), None);
        assert_eq!(parse_first_seen(""), None);
    }

    #[test]
    fn location_three_parts() {
        let location = "EGLL London Heathrow, London, United Kingdom";

        assert_eq!(location_city(location), Some("London"));
        assert_eq!(location_country(location), Some("United Kingdom"));
        assert_eq!(location_id(location), Some("EGLL"));
    }

    #[test]
    fn location_two_parts() {
        assert_eq!(location_city("EIDW Dublin, Ireland"), Some("Dublin"));
        assert_eq!(location_country("EIDW Dublin, Ireland"), Some("Ireland"));
        assert_eq!(location_city("EGLL, United Kingdom"), Some(""));
        assert_eq!(
            location_country("EGLL, United Kingdom"),
            Some("United Kingdom")
        );
        // Too short to strip the code prefix, country still known
        assert_eq!(location_city("AB, Somewhere"), None);
        assert_eq!(location_country("AB, Somewhere"), Some("Somewhere"));
    }

    #[test]
    fn location_code_prefix_counts_characters() {
        assert_eq!(location_city("ÅÅBC Oslo, Norway"), Some("Oslo"));
        assert_eq!(location_country("ÅÅBC Oslo, Norway"), Some("Norway"));
        assert_eq!(location_city("ÅÅ, Norway"), None);
        assert_eq!(location_country("ÅÅ, Norway"), Some("Norway"));
    }

    #[test]
    fn location_other_shapes() {
        for location in ["EGLL London Heathrow", "A, B, C, D", "A,B,C,D,E"] {
            assert_eq!(location_city(location), None);
            assert_eq!(location_country(location), None);
        }
    }

    #[test]
    fn derived_locations_on_flight_info() {
        let info = FlightInfo::from(&sample_raw());

        assert_eq!(info.departure_city(), Some("Dublin"));
        assert_eq!(info.departure_country(), Some("Ireland"));
        assert_eq!(info.departure_id(), Some("EIDW"));
        assert_eq!(info.destination_city(), Some("London"));
        assert_eq!(info.destination_country(), Some("United Kingdom"));
        assert_eq!(info.destination_id(), Some("EGLL"));

        let unknown = FlightInfo::default();
        assert_eq!(unknown.departure_city(), None);
        assert_eq!(unknown.destination_id(), None);
    }

    #[test]
    fn validate_within_bounds() {
        let info = FlightInfo::from(&sample_raw());

        assert!(info.validate().is_empty());
    }

    #[test]
    fn validate_long_manufacturer() {
        let mut info = FlightInfo::from(&sample_raw());
        info.manufacturer = Some("M".repeat(33));

        assert_eq!(info.validate(), vec!["Manufacturer"]);

        info.manufacturer = Some("M".repeat(32));
        assert!(info.validate().is_empty());
    }

    #[test]
    fn validate_reports_every_field() {
        let info = FlightInfo {
            id: "ABCDEFG".to_string(),
            registration: Some("R".repeat(25)),
            call_sign: Some("C".repeat(129)),
            departure: Some("D".repeat(97)),
            ..Default::default()
        };

        assert_eq!(
            info.validate(),
            vec!["Id", "RegistrationNumber", "Departure", "CallSign"]
        );
    }

    #[test]
    fn validate_empty_id() {
        assert_eq!(FlightInfo::default().validate(), vec!["Id"]);
    }

    #[test]
    fn admit_clamps_tracked() {
        let mut info = FlightInfo::from(&sample_raw());
        info.tracked = Duration::from_secs(24 * 60 * 60);

        let admitted = info.admit().unwrap();
        assert_eq!(admitted.tracked, MAX_TRACKED);
        assert!(admitted.tracked_clamped());

        let mut info = FlightInfo::from(&sample_raw());
        info.tracked = Duration::from_secs(86_399);
        assert_eq!(info.admit().unwrap().tracked, Duration::from_secs(86_399));
    }

    #[test]
    fn admit_rejects_invalid() {
        let mut info = FlightInfo::from(&sample_raw());
        info.operator = Some("O".repeat(193));

        let err = info.admit().unwrap_err();
        assert_eq!(err.id, "4CA2D6");
        assert_eq!(err.fields, vec!["Operator"]);
    }
}
