//! JSON dump of the 15-day forecasts.
//!
//! The file mirrors what the summarizer receives under `weather_15day`:
//!
//! ```text
//! {
//!   "İstanbul": [ { "day_index": 1, "text": "...", "high_c": 24, "low_c": 15, "precip_pct": 20 }, ... ],
//!   "Bursa": [],
//!   ...
//! }
//! ```

use crate::models::WeatherByCity;
use crate::utils::{output_path, timestamped_name};
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `weather` as pretty JSON to `accuweather_15day_<timestamp>.json`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_weather(
    weather: &WeatherByCity,
    output_dir: &str,
    at: DateTime<Local>,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(weather)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = output_path(output_dir, &timestamped_name("accuweather_15day", "json", at));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote forecast JSON");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, ForecastDay};

    #[tokio::test]
    async fn test_write_weather_keeps_turkish_text() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();
        let mut weather = WeatherByCity::new();
        weather.insert(
            City::Izmir,
            vec![ForecastDay {
                day_index: 1,
                text: "Perşembe 24° 15° %20 yağmur".to_string(),
                high_c: Some(24),
                low_c: Some(15),
                precip_pct: Some(20),
            }],
        );
        weather.insert(City::Ankara, vec![]);

        let path = write_weather(&weather, dir, Local::now()).await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("accuweather_15day_") && name.ends_with(".json"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"İzmir\""));
        assert!(written.contains("yağmur"));
        let parsed: WeatherByCity = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, weather);
    }
}
