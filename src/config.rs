//! Runtime configuration for the extraction pipeline.
//!
//! The fill-level sources are a fixed table ([`LEVEL_SOURCES`]); forecast
//! URLs, timeouts and the WebDriver endpoint come from the [`Cli`]. Everything
//! is gathered into one [`PipelineConfig`] at startup and passed down, so the
//! orchestrator never reads the process environment itself.

use crate::cli::Cli;
use crate::extract::levels::LevelStrategy;
use crate::models::City;
use std::error::Error;
use std::time::Duration;
use url::Url;

/// Where and how one city's fill level is read.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub city: City,
    pub url: String,
    pub strategy: LevelStrategy,
    /// Reported when the page or the node cannot be read.
    pub default_pct: f64,
}

/// Static fill-level source table: `(city, url, strategy)`.
pub const LEVEL_SOURCES: [(City, &str, LevelStrategy); 4] = [
    (
        City::Istanbul,
        "https://iski.istanbul/baraj-doluluk/",
        LevelStrategy::StyledDiv("div.text-4xl.font-bold.absolute"),
    ),
    (
        City::Bursa,
        "https://www.buski.gov.tr/baraj-detay",
        LevelStrategy::LabeledSpan("span#baraj-doluluk-1-info"),
    ),
    (
        City::Izmir,
        "https://www.izsu.gov.tr/tr/BarajlarinSuDurumu/1",
        LevelStrategy::VolumeRatio {
            available_label: "Kullanılabilir su hacmi",
            total_label: "Kullanılabilir göl su hacmi",
        },
    ),
    (
        City::Ankara,
        "https://www.aski.gov.tr/tr/baraj.aspx",
        LevelStrategy::ServerLabel("label#LabelBarajOrani"),
    ),
];

/// Everything the orchestrator needs to run one cycle.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub level_sources: Vec<SourceSpec>,
    pub forecast_urls: Vec<(City, String)>,
    pub webdriver_url: String,
    pub settle_delay: Duration,
    pub forecast_timeout: Duration,
}

impl PipelineConfig {
    /// Build the configuration from parsed arguments, validating every URL.
    pub fn from_cli(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let forecast_urls = vec![
            (City::Istanbul, cli.accu_ist_url.clone()),
            (City::Bursa, cli.accu_bursa_url.clone()),
            (City::Izmir, cli.accu_izmir_url.clone()),
            (City::Ankara, cli.accu_ankara_url.clone()),
        ];
        for (city, url) in &forecast_urls {
            Url::parse(url).map_err(|e| format!("invalid forecast URL for {city}: {url}: {e}"))?;
        }
        Url::parse(&cli.webdriver_url)
            .map_err(|e| format!("invalid WebDriver URL {}: {e}", cli.webdriver_url))?;

        Ok(Self {
            level_sources: default_level_sources(),
            forecast_urls,
            webdriver_url: cli.webdriver_url.clone(),
            settle_delay: Duration::from_secs(cli.settle_secs),
            forecast_timeout: Duration::from_secs(cli.forecast_timeout_secs),
        })
    }

    /// The source configured for `city`, if any.
    pub fn level_source(&self, city: City) -> Option<&SourceSpec> {
        self.level_sources.iter().find(|s| s.city == city)
    }

    /// The forecast page configured for `city`, if any.
    pub fn forecast_url(&self, city: City) -> Option<&str> {
        self.forecast_urls
            .iter()
            .find(|(c, _)| *c == city)
            .map(|(_, url)| url.as_str())
    }
}

/// [`LEVEL_SOURCES`] as owned specs with a `0.0` default.
pub fn default_level_sources() -> Vec<SourceSpec> {
    LEVEL_SOURCES
        .iter()
        .map(|(city, url, strategy)| SourceSpec {
            city: *city,
            url: url.to_string(),
            strategy: *strategy,
            default_pct: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_every_city_has_a_level_source() {
        let sources = default_level_sources();
        for city in City::ALL {
            assert_eq!(sources.iter().filter(|s| s.city == city).count(), 1);
        }
        assert!(sources.iter().all(|s| Url::parse(&s.url).is_ok()));
    }

    #[test]
    fn test_from_cli_overrides_forecast_url() {
        let cli = Cli::parse_from([
            "baraj_doluluk",
            "--accu-bursa-url",
            "http://127.0.0.1:8080/bursa",
            "--forecast-timeout-secs",
            "3",
        ]);
        let config = PipelineConfig::from_cli(&cli).unwrap();

        assert_eq!(config.forecast_url(City::Bursa), Some("http://127.0.0.1:8080/bursa"));
        assert_eq!(config.forecast_timeout, Duration::from_secs(3));
        assert_eq!(config.level_source(City::Ankara).unwrap().default_pct, 0.0);
    }

    #[test]
    fn test_from_cli_rejects_bad_url() {
        let cli = Cli::parse_from(["baraj_doluluk", "--accu-ankara-url", "not a url"]);
        let err = PipelineConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("Ankara"));
    }
}
