//! 15-day forecast card extraction.
//!
//! The forecast page has no stable markup: depending on how it was rendered,
//! daily cards show up as anchors, divs or list items, with or without
//! `data-qa` attributes. Candidate selectors are tried in priority order and
//! the first one matching at least [`MIN_FORECAST_CARDS`] elements wins.

use crate::models::ForecastDay;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

/// Matches needed before a candidate selector is trusted. Fewer than half a
/// 15-day page usually means an unrelated element matched.
pub const MIN_FORECAST_CARDS: usize = 7;

/// Cards read per page.
pub const MAX_FORECAST_DAYS: usize = 15;

/// Characters of card text kept on each [`ForecastDay`].
pub const MAX_CARD_TEXT_CHARS: usize = 200;

/// Daily-card selectors, highest priority first.
pub const CARD_SELECTORS: [&str; 9] = [
    "a.daily-forecast-card",
    "div.daily-forecast-card",
    "li.daily-forecast-card",
    r#"[data-qa="daily-card"]"#,
    r#"a[data-qa="daily-card"]"#,
    r#"li[data-qa="daily-card"]"#,
    "div.forecast-list a",
    "li.daily-card",
    "div.daily-list a",
];

static CARD_SELECTOR_LIST: Lazy<Vec<Selector>> = Lazy::new(|| {
    CARD_SELECTORS
        .iter()
        .map(|css| Selector::parse(css).expect("static selector"))
        .collect()
});

static TEMPERATURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(-?\d{1,2})°").expect("static regex"));

// Turkish pages write "%20", others "20%". The suffix form reads at most the
// last two digits before the sign unless they spell 100.
static PRECIPITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(\d{1,3})(?:\D|$)|(100|\d{1,2})%").expect("static regex"));

/// Extract up to [`MAX_FORECAST_DAYS`] forecast days from a forecast page.
///
/// A page without any recognisable card yields an empty list.
pub fn extract_forecast(markup: &str) -> Vec<ForecastDay> {
    let document = Html::parse_document(markup);
    let cards = select_cards(&document);

    let days: Vec<ForecastDay> = cards
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .enumerate()
        .map(|(i, card)| parse_card(i + 1, card))
        .collect();

    if days.is_empty() {
        info!("No forecast cards found");
    }
    days
}

/// Matches of the first selector clearing the threshold, else of the last one tried.
fn select_cards(document: &Html) -> Vec<ElementRef<'_>> {
    let mut cards = Vec::new();
    for (css, selector) in CARD_SELECTORS.iter().zip(CARD_SELECTOR_LIST.iter()) {
        cards = document.select(selector).collect();
        debug!(selector = css, matches = cards.len(), "Tried forecast card selector");
        if cards.len() >= MIN_FORECAST_CARDS {
            break;
        }
    }
    cards
}

fn parse_card(day_index: usize, card: ElementRef<'_>) -> ForecastDay {
    let text = card
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let (high_c, low_c) = parse_temperatures(&text);
    let precip_pct = parse_precipitation(&text);

    ForecastDay {
        day_index,
        text: text.chars().take(MAX_CARD_TEXT_CHARS).collect(),
        high_c,
        low_c,
        precip_pct,
    }
}

/// First degree token is the high, second the low.
pub fn parse_temperatures(text: &str) -> (Option<i32>, Option<i32>) {
    let mut temps = TEMPERATURE
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<i32>().ok());
    (temps.next(), temps.next())
}

/// First percent token in the text, if it reads as 0–100.
pub fn parse_precipitation(text: &str) -> Option<u8> {
    let caps = PRECIPITATION.captures(text)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    digits.as_str().parse::<u8>().ok().filter(|pct| *pct <= 100)
}
