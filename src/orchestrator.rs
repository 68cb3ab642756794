//! Extraction orchestration for both passes.
//!
//! # Fill-level pass
//!
//! 1. Open one browser session per configured source, all initiated together
//! 2. Navigate each session to its page, one after another
//! 3. Wait one shared settle delay for client-side rendering
//! 4. Read and extract each page in turn
//! 5. Release every session that was opened, whatever happened above
//!
//! # Forecast pass
//!
//! Pages are fetched one at a time, each with its own timeout. A failed or
//! non-200 fetch leaves that city with an empty forecast.
//!
//! Both passes produce exactly one entry per [`City`]; a source that fails at
//! any step contributes its default instead of aborting the cycle.

use crate::config::{PipelineConfig, SourceSpec};
use crate::extract::forecast::extract_forecast;
use crate::models::{City, ForecastDay, LevelSnapshot, WeatherByCity};
use crate::sources::{PageFetcher, PageRenderer, RenderSession};
use chrono::Local;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// A source together with its session, if one could be opened.
struct Slot<'a, S> {
    spec: &'a SourceSpec,
    session: Option<S>,
    navigated: bool,
    markup: Option<String>,
}

/// Run the fill-level pass and assemble the cycle's [`LevelSnapshot`].
#[instrument(level = "info", skip_all, fields(sources = config.level_sources.len()))]
pub async fn scrape_levels<R: PageRenderer>(config: &PipelineConfig, renderer: &R) -> LevelSnapshot {
    let opened = join_all(config.level_sources.iter().map(|_| renderer.open())).await;
    let mut slots: Vec<Slot<'_, R::Session>> = config
        .level_sources
        .iter()
        .zip(opened)
        .map(|(spec, session)| {
            let session = match session {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(city = %spec.city, error = %e, "Could not open browser session");
                    None
                }
            };
            Slot {
                spec,
                session,
                navigated: false,
                markup: None,
            }
        })
        .collect();

    read_rendered(&mut slots, config).await;

    for slot in &mut slots {
        if let Some(session) = slot.session.take() {
            if let Err(e) = session.release().await {
                warn!(city = %slot.spec.city, error = %e, "Failed to close browser session");
            }
        }
    }

    let markups: Vec<(City, Option<&str>)> = slots
        .iter()
        .map(|slot| (slot.spec.city, slot.markup.as_deref()))
        .collect();
    assemble_levels(config, &markups)
}

/// Navigate every session, let the pages settle once, then read them in turn.
///
/// Never releases anything; sessions stay in their slots for the caller.
async fn read_rendered<S: RenderSession>(slots: &mut [Slot<'_, S>], config: &PipelineConfig) {
    for slot in slots.iter_mut() {
        let Some(session) = slot.session.as_mut() else {
            continue;
        };
        match session.navigate(&slot.spec.url).await {
            Ok(()) => slot.navigated = true,
            Err(e) => {
                warn!(city = %slot.spec.city, url = %slot.spec.url, error = %e, "Navigation failed");
            }
        }
    }

    sleep(config.settle_delay).await;

    for slot in slots.iter_mut().filter(|slot| slot.navigated) {
        let Some(session) = slot.session.as_mut() else {
            continue;
        };
        match session.markup().await {
            Ok(html) => slot.markup = Some(html),
            Err(e) => warn!(city = %slot.spec.city, error = %e, "Could not read rendered page"),
        }
    }
}

/// Turn per-source markup into a snapshot with one reading per city.
///
/// Cities without a configured source, or whose markup is missing, get the
/// source default (`0.0` when there is no source at all).
pub fn assemble_levels(config: &PipelineConfig, markups: &[(City, Option<&str>)]) -> LevelSnapshot {
    let captured_at = Local::now();
    let values = City::ALL.map(|city| {
        let spec = config.level_source(city);
        let markup = markups
            .iter()
            .find(|(c, _)| *c == city)
            .and_then(|(_, m)| *m);
        let pct = match (spec, markup) {
            (Some(spec), Some(markup)) => spec.strategy.extract(markup, spec.default_pct),
            (Some(spec), None) => spec.default_pct,
            (None, _) => 0.0,
        };
        info!(%city, pct, "Read fill level");
        (city, pct)
    });
    LevelSnapshot::new(captured_at, values)
}

/// Run the forecast pass: one sequential GET per city.
#[instrument(level = "info", skip_all)]
pub async fn fetch_all_forecasts<F: PageFetcher>(config: &PipelineConfig, fetcher: &F) -> WeatherByCity {
    let weather: WeatherByCity = stream::iter(City::ALL)
        .then(|city| async move {
            let days = match config.forecast_url(city) {
                Some(url) => fetch_forecast(fetcher, city, url).await,
                None => {
                    warn!(%city, "No forecast URL configured");
                    Vec::new()
                }
            };
            (city, days)
        })
        .collect()
        .await;

    info!(
        cities = weather.len(),
        days = weather.values().map(Vec::len).sum::<usize>(),
        "Fetched 15-day forecasts"
    );
    weather
}

async fn fetch_forecast<F: PageFetcher>(fetcher: &F, city: City, url: &str) -> Vec<ForecastDay> {
    match fetcher.fetch(url).await {
        Ok(html) => {
            let days = extract_forecast(&html);
            info!(%city, days = days.len(), "Parsed forecast");
            days
        }
        Err(e) => {
            warn!(%city, %url, error = %e, "Forecast fetch failed; using empty forecast");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_level_sources;
    use crate::sources::SourceError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            level_sources: default_level_sources(),
            forecast_urls: City::ALL
                .iter()
                .map(|c| (*c, format!("http://forecast.test/{}", c.template_key())))
                .collect(),
            webdriver_url: "http://localhost:9515".to_string(),
            settle_delay: Duration::ZERO,
            forecast_timeout: Duration::from_secs(1),
        }
    }

    #[derive(Default)]
    struct Log {
        opened: usize,
        released: usize,
    }

    /// Serves canned markup by URL; URLs listed in `fail_nav` fail to load and
    /// those in `fail_read` load but cannot be read back.
    struct StubRenderer {
        pages: HashMap<String, String>,
        fail_nav: Vec<String>,
        fail_read: Vec<String>,
        fail_open_after: Option<usize>,
        log: Rc<RefCell<Log>>,
    }

    impl StubRenderer {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, m)| (u.to_string(), m.to_string())).collect(),
                fail_nav: Vec::new(),
                fail_read: Vec::new(),
                fail_open_after: None,
                log: Rc::new(RefCell::new(Log::default())),
            }
        }
    }

    struct StubSession {
        pages: HashMap<String, String>,
        fail_nav: Vec<String>,
        fail_read: Vec<String>,
        current: Option<String>,
        log: Rc<RefCell<Log>>,
    }

    impl PageRenderer for StubRenderer {
        type Session = StubSession;

        async fn open(&self) -> Result<StubSession, SourceError> {
            let mut log = self.log.borrow_mut();
            if self.fail_open_after.is_some_and(|n| log.opened >= n) {
                return Err(SourceError::Status(503));
            }
            log.opened += 1;
            Ok(StubSession {
                pages: self.pages.clone(),
                fail_nav: self.fail_nav.clone(),
                fail_read: self.fail_read.clone(),
                current: None,
                log: Rc::clone(&self.log),
            })
        }
    }

    impl RenderSession for StubSession {
        async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
            if self.fail_nav.iter().any(|u| u == url) {
                return Err(SourceError::Status(504));
            }
            self.current = Some(url.to_string());
            Ok(())
        }

        async fn markup(&mut self) -> Result<String, SourceError> {
            let url = self.current.as_ref().ok_or(SourceError::Status(500))?;
            if self.fail_read.contains(url) {
                return Err(SourceError::Status(500));
            }
            Ok(self.pages.get(url).cloned().unwrap_or_default())
        }

        async fn release(self) -> Result<(), SourceError> {
            self.log.borrow_mut().released += 1;
            Ok(())
        }
    }

    struct StubFetcher {
        pages: HashMap<String, Result<String, u16>>,
    }

    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, SourceError> {
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(SourceError::Status(*status)),
                None => Err(SourceError::Status(404)),
            }
        }
    }

    fn forecast_page(n: usize) -> String {
        (0..n)
            .map(|i| format!(r#"<a class="daily-forecast-card">Gün {i} 2{i}° 1{i}° %{i}0</a>"#))
            .collect()
    }

    const ISTANBUL_PAGE: &str = r#"<div class="text-4xl font-bold absolute">%38,71</div>"#;
    const BURSA_PAGE: &str = r#"<span id="baraj-doluluk-1-info">27,50</span>"#;
    const ANKARA_PAGE: &str = r#"<label id="LabelBarajOrani">%14,02</label>"#;
    const IZMIR_PAGE: &str = r#"<table>
        <tr><td><span>Kullanılabilir göl su hacmi</span></td><td class="damtotaltd">200,0</td></tr>
        <tr><td><span>Kullanılabilir su hacmi</span></td><td class="damtotaltd">50,0</td></tr>
    </table>"#;

    fn all_pages() -> StubRenderer {
        StubRenderer::new(&[
            ("https://iski.istanbul/baraj-doluluk/", ISTANBUL_PAGE),
            ("https://www.buski.gov.tr/baraj-detay", BURSA_PAGE),
            ("https://www.izsu.gov.tr/tr/BarajlarinSuDurumu/1", IZMIR_PAGE),
            ("https://www.aski.gov.tr/tr/baraj.aspx", ANKARA_PAGE),
        ])
    }

    #[tokio::test]
    async fn test_scrape_levels_reads_every_source() {
        let renderer = all_pages();
        let snapshot = scrape_levels(&test_config(), &renderer).await;

        assert_eq!(snapshot.pct(City::Istanbul), 38.71);
        assert_eq!(snapshot.pct(City::Bursa), 27.5);
        assert_eq!(snapshot.pct(City::Izmir), 25.0);
        assert_eq!(snapshot.pct(City::Ankara), 14.02);
        let log = renderer.log.borrow();
        assert_eq!((log.opened, log.released), (4, 4));
    }

    #[tokio::test]
    async fn test_missing_nodes_yield_zero_for_every_city() {
        let renderer = StubRenderer::new(&[]);
        let snapshot = scrape_levels(&test_config(), &renderer).await;

        let map = snapshot.as_map();
        assert_eq!(map.len(), 4);
        assert!(map.values().all(|pct| *pct == 0.0));
    }

    #[tokio::test]
    async fn test_failed_navigation_still_releases_session() {
        let mut renderer = all_pages();
        renderer.fail_nav = vec!["https://www.buski.gov.tr/baraj-detay".to_string()];
        let snapshot = scrape_levels(&test_config(), &renderer).await;

        assert_eq!(snapshot.pct(City::Bursa), 0.0);
        assert_eq!(snapshot.pct(City::Ankara), 14.02);
        let log = renderer.log.borrow();
        assert_eq!((log.opened, log.released), (4, 4));
    }

    #[tokio::test]
    async fn test_failed_read_still_releases_session() {
        let mut renderer = all_pages();
        renderer.fail_read = vec!["https://www.izsu.gov.tr/tr/BarajlarinSuDurumu/1".to_string()];
        let snapshot = scrape_levels(&test_config(), &renderer).await;

        assert_eq!(snapshot.pct(City::Izmir), 0.0);
        assert_eq!(snapshot.pct(City::Istanbul), 38.71);
        assert_eq!(snapshot.pct(City::Bursa), 27.5);
        assert_eq!(snapshot.pct(City::Ankara), 14.02);
        let log = renderer.log.borrow();
        assert_eq!((log.opened, log.released), (4, 4));
    }

    #[tokio::test]
    async fn test_unreadable_sessions_are_all_released() {
        let mut renderer = all_pages();
        renderer.fail_read = renderer.pages.keys().cloned().collect();
        let snapshot = scrape_levels(&test_config(), &renderer).await;

        assert!(snapshot.as_map().values().all(|pct| *pct == 0.0));
        let log = renderer.log.borrow();
        assert_eq!((log.opened, log.released), (4, 4));
    }

    #[tokio::test]
    async fn test_failed_session_open_degrades_that_city() {
        let mut renderer = all_pages();
        renderer.fail_open_after = Some(2);
        let snapshot = scrape_levels(&test_config(), &renderer).await;

        assert_eq!(snapshot.readings.len(), 4);
        assert_eq!(snapshot.pct(City::Istanbul), 38.71);
        assert_eq!(snapshot.pct(City::Bursa), 27.5);
        assert_eq!(snapshot.pct(City::Izmir), 0.0);
        assert_eq!(snapshot.pct(City::Ankara), 0.0);
        let log = renderer.log.borrow();
        assert_eq!((log.opened, log.released), (2, 2));
    }

    #[test]
    fn test_assemble_levels_without_source_config() {
        let mut config = test_config();
        config.level_sources.retain(|s| s.city != City::Izmir);
        let snapshot = assemble_levels(&config, &[(City::Bursa, Some(BURSA_PAGE))]);

        let cities: Vec<_> = snapshot.readings.iter().map(|r| r.city).collect();
        assert_eq!(cities, City::ALL.to_vec());
        assert_eq!(snapshot.pct(City::Bursa), 27.5);
        assert_eq!(snapshot.pct(City::Izmir), 0.0);
    }

    #[test]
    fn test_assemble_levels_is_repeatable() {
        let config = test_config();
        let markups = [(City::Ankara, Some(ANKARA_PAGE)), (City::Izmir, Some(IZMIR_PAGE))];
        let a = assemble_levels(&config, &markups).as_map();
        let b = assemble_levels(&config, &markups).as_map();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_forecast_failure_isolated_per_city() {
        let config = test_config();
        let fetcher = StubFetcher {
            pages: HashMap::from([
                ("http://forecast.test/IST".to_string(), Ok(forecast_page(10))),
                ("http://forecast.test/BURSA".to_string(), Err(500)),
                ("http://forecast.test/IZMIR".to_string(), Ok("<p>bakım</p>".to_string())),
                ("http://forecast.test/ANKARA".to_string(), Ok(forecast_page(8))),
            ]),
        };

        let weather = fetch_all_forecasts(&config, &fetcher).await;

        assert_eq!(weather.len(), 4);
        assert_eq!(weather[&City::Istanbul].len(), 10);
        assert!(weather[&City::Bursa].is_empty());
        assert!(weather[&City::Izmir].is_empty());
        let first = &weather[&City::Ankara][0];
        assert_eq!((first.high_c, first.low_c, first.precip_pct), (Some(20), Some(10), Some(0)));
    }
}
