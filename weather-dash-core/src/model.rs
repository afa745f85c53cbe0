use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Device position as reported by the platform location service.
///
/// On the wire this is `{ "lat": .., "lon": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,
    #[serde(rename = "lon", alias = "longitude")]
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A place tracked by the backend, with its most recent weather snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    /// The listing endpoint leaves this out.
    #[serde(default)]
    pub country: String,
    #[serde(deserialize_with = "measurement")]
    pub temperature: f64,
    #[serde(deserialize_with = "measurement")]
    pub rain: f64,
    #[serde(alias = "weatherCode")]
    pub weather_code: i32,
}

impl Location {
    pub fn icon(&self) -> Option<WeatherIcon> {
        WeatherIcon::from_code(self.weather_code)
    }
}

/// Seven-day style projection, one entry per day across five parallel sequences.
///
/// Readings are nullable: the upstream weather service leaves gaps as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    pub time: Vec<String>,
    #[serde(alias = "weatherCode")]
    pub weather_code: Vec<i32>,
    #[serde(rename = "temperature_2m_max", alias = "temperatureMax")]
    pub temperature_max: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_min", alias = "temperatureMin")]
    pub temperature_min: Vec<Option<f64>>,
    #[serde(alias = "rainSum")]
    pub rain_sum: Vec<Option<f64>>,
}

impl DailyForecast {
    /// True when all five sequences describe the same number of days.
    pub fn is_consistent(&self) -> bool {
        let n = self.time.len();
        self.weather_code.len() == n
            && self.temperature_max.len() == n
            && self.temperature_min.len() == n
            && self.rain_sum.len() == n
    }

    /// Number of complete days (the shortest sequence wins if inconsistent).
    pub fn len(&self) -> usize {
        [
            self.time.len(),
            self.weather_code.len(),
            self.temperature_max.len(),
            self.temperature_min.len(),
            self.rain_sum.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> impl Iterator<Item = ForecastDay<'_>> {
        self.time
            .iter()
            .zip(&self.weather_code)
            .zip(&self.temperature_max)
            .zip(&self.temperature_min)
            .zip(&self.rain_sum)
            .map(|((((time, code), max), min), rain)| ForecastDay {
                time,
                weather_code: *code,
                temperature_max: *max,
                temperature_min: *min,
                rain_sum: *rain,
            })
    }
}

/// Borrowed view of day `i` of a [`DailyForecast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastDay<'a> {
    pub time: &'a str,
    pub weather_code: i32,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub rain_sum: Option<f64>,
}

impl ForecastDay<'_> {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.time, "%Y-%m-%d").ok()
    }

    pub fn icon(&self) -> Option<WeatherIcon> {
        WeatherIcon::from_code(self.weather_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub name: String,
    pub country: String,
    pub daily: DailyForecast,
}

/// The five icon buckets the backend folds WMO weather codes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Clear,
    Thunderstorm,
    PartlyCloudy,
    Cloudy,
    Rain,
}

impl WeatherIcon {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Clear),
            2 => Some(Self::Thunderstorm),
            3 => Some(Self::PartlyCloudy),
            4 => Some(Self::Cloudy),
            5 => Some(Self::Rain),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Thunderstorm => "thunderstorm",
            Self::PartlyCloudy => "partly cloudy",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of `POST /locations`.
#[derive(Debug, Clone, Serialize)]
pub struct AddLocationRequest<'a> {
    pub city: &'a str,
}

/// Payload of `POST /locations/single`.
///
/// The backend answers either with a full location object or with a bare
/// temperature reading such as `"12°C"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CurrentWeather {
    Location(Location),
    Reading(Measurement),
}

impl CurrentWeather {
    pub fn temperature(&self) -> f64 {
        match self {
            Self::Location(location) => location.temperature,
            Self::Reading(reading) => reading.0,
        }
    }
}

/// One entry of a `GET /locations/{city}` search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SearchMatch {
    Name(String),
    Location(Location),
}

impl SearchMatch {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Location(location) => &location.name,
        }
    }
}

/// Answer to `POST /locations`. Duplicates come back as `{ "error": ".." }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AddLocationOutcome {
    Created(Location),
    Rejected { error: String },
}

impl AddLocationOutcome {
    pub fn created(&self) -> Option<&Location> {
        match self {
            Self::Created(location) => Some(location),
            Self::Rejected { .. } => None,
        }
    }
}

/// Answer to `DELETE /locations/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DeletionAck {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl DeletionAck {
    pub fn is_deleted(&self) -> bool {
        self.error.is_none()
    }
}

/// A numeric reading that may arrive as a number or as a unit-suffixed string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement(pub f64);

impl<'de> Deserialize<'de> for Measurement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Self(value)),
            Raw::Text(text) => parse_measurement(&text).map(Self).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid measurement '{text}'"))
            }),
        }
    }
}

fn measurement<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Measurement::deserialize(deserializer).map(|m| m.0)
}

/// Leading number of a string like `"12°C"` or `"3 mm"`.
pub(crate) fn parse_measurement(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.')))
        .unwrap_or(text.len());
    text[..end].parse().ok()
}
