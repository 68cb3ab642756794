//! Data models for reservoir readings and daily forecasts.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`City`]: The closed set of cities whose reservoirs are tracked
//! - [`ReservoirReading`]: One fill-level value for one city in one cycle
//! - [`LevelSnapshot`]: All four readings of a cycle, sharing one timestamp
//! - [`ForecastDay`]: One day of the 15-day forecast for a city
//!
//! Field names of [`ForecastDay`] are part of the JSON handed to the
//! summarizer and written to disk, so they are kept in snake_case.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A city whose reservoir fill level is tracked.
///
/// Declaration order is the canonical order used for iteration, map keys
/// and chart ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "İstanbul")]
    Istanbul,
    #[serde(rename = "Bursa")]
    Bursa,
    #[serde(rename = "İzmir")]
    Izmir,
    #[serde(rename = "Ankara")]
    Ankara,
}

impl City {
    /// Every tracked city, in canonical order.
    pub const ALL: [City; 4] = [City::Istanbul, City::Bursa, City::Izmir, City::Ankara];

    /// The Turkish display name, as used in charts and status texts.
    pub fn name(self) -> &'static str {
        match self {
            City::Istanbul => "İstanbul",
            City::Bursa => "Bursa",
            City::Izmir => "İzmir",
            City::Ankara => "Ankara",
        }
    }

    /// Placeholder key used in status-text templates, e.g. `{{IST}}`.
    pub fn template_key(self) -> &'static str {
        match self {
            City::Istanbul => "IST",
            City::Bursa => "BURSA",
            City::Izmir => "IZMIR",
            City::Ankara => "ANKARA",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single fill-level reading.
///
/// The percentage is nominally within `[0, 100]` but is not clamped; whatever
/// the source reports is passed through. A failed extraction shows up as the
/// source's default value (usually `0.0`), never as a missing reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirReading {
    pub city: City,
    pub fill_pct: f64,
    /// Assigned by the orchestrator when the cycle's readings are assembled.
    pub captured_at: DateTime<Local>,
}

/// The readings of one scrape cycle, one per city in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSnapshot {
    pub captured_at: DateTime<Local>,
    pub readings: Vec<ReservoirReading>,
}

impl LevelSnapshot {
    /// Build a snapshot stamping every reading with the same capture time.
    pub fn new(captured_at: DateTime<Local>, values: impl IntoIterator<Item = (City, f64)>) -> Self {
        let readings = values
            .into_iter()
            .map(|(city, fill_pct)| ReservoirReading {
                city,
                fill_pct,
                captured_at,
            })
            .collect();
        Self {
            captured_at,
            readings,
        }
    }

    /// Fill percentage for `city`, or `0.0` if the snapshot has no reading for it.
    pub fn pct(&self, city: City) -> f64 {
        self.readings
            .iter()
            .find(|r| r.city == city)
            .map(|r| r.fill_pct)
            .unwrap_or(0.0)
    }

    /// The `{city: percentage}` view handed to the chart and the summarizer.
    pub fn as_map(&self) -> BTreeMap<City, f64> {
        self.readings.iter().map(|r| (r.city, r.fill_pct)).collect()
    }
}

/// One day of a city's 15-day forecast, as read from one forecast card.
///
/// Every field the card did not expose legibly is `None` (serialized as
/// `null`); nothing is guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// 1-based position of the card on the page.
    pub day_index: usize,
    /// Visible card text, cut to 200 characters.
    pub text: String,
    pub high_c: Option<i32>,
    pub low_c: Option<i32>,
    pub precip_pct: Option<u8>,
}

/// Forecast lists keyed by city, one entry per city even when empty.
pub type WeatherByCity = BTreeMap<City, Vec<ForecastDay>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_order_and_names() {
        let names: Vec<_> = City::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["İstanbul", "Bursa", "İzmir", "Ankara"]);
        assert!(City::Istanbul < City::Ankara);
    }

    #[test]
    fn test_snapshot_shares_timestamp() {
        let now = Local::now();
        let snapshot = LevelSnapshot::new(now, [(City::Bursa, 41.5), (City::Ankara, 12.0)]);
        assert!(snapshot.readings.iter().all(|r| r.captured_at == now));
        assert_eq!(snapshot.pct(City::Bursa), 41.5);
        assert_eq!(snapshot.pct(City::Izmir), 0.0);
    }

    #[test]
    fn test_weather_map_serializes_city_names_as_keys() {
        let mut weather = WeatherByCity::new();
        weather.insert(City::Izmir, vec![]);
        weather.insert(
            City::Istanbul,
            vec![ForecastDay {
                day_index: 1,
                text: "Cuma 20° 11°".to_string(),
                high_c: Some(20),
                low_c: Some(11),
                precip_pct: None,
            }],
        );

        let json = serde_json::to_string(&weather).unwrap();
        assert!(json.starts_with(r#"{"İstanbul":[{"day_index":1"#));
        assert!(json.contains(r#""precip_pct":null"#));
        assert!(json.contains(r#""İzmir":[]"#));
    }

    #[test]
    fn test_forecast_day_deserialization() {
        let json = r#"{"day_index":3,"text":"x","high_c":-2,"low_c":null,"precip_pct":40}"#;
        let day: ForecastDay = serde_json::from_str(json).unwrap();
        assert_eq!(day.high_c, Some(-2));
        assert_eq!(day.low_c, None);
        assert_eq!(day.precip_pct, Some(40));
    }
}
