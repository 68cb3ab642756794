//! LLM summarization with exponential backoff retry logic.
//!
//! The summarizer receives the current fill levels and the 15-day forecasts
//! and answers with a Markdown forecast of fill levels two weeks out. It talks
//! to any OpenAI-compatible chat-completions endpoint (DeepSeek by default).
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`ChatCompletionsAsk`]: Posts one chat-completions request
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 2 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::models::{City, WeatherByCity};
use crate::utils::collapse_whitespace;
use rand::{rng, Rng};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

const SYSTEM_PROMPT: &str = "Sen bir baraj su seviyesi tahmin asistanısın. \
Istanbul, Bursa, İzmir, Ankara için mevcut su seviyeleri ve 15 günlük hava durumu (özellikle yağış) \
göz önünde bulundurarak tam 2 hafta sonraki gün için baraj doluluk tahmininde bulun. \
Aralık verme; net bir yüzde ver. Cevabını Türkçe ve Markdown formatında ver. \
Yağmurun etkisini düşük; karın etkisini yüksek değerlendir. \
Kar erimesi dönemlerinde artış bekle. \
Her şehir için yeni satırda tahmin ver.";

const TEMPERATURE: f64 = 0.3;
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(25);
const WINDOW_DAYS: u32 = 7;

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send text to an LLM and receive a response.
/// This abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// One chat-completions request per [`AskAsync::ask`] call.
///
/// The text passed to `ask` becomes the user message; the system prompt is
/// fixed. The reply's whitespace is collapsed to single spaces.
pub struct ChatCompletionsAsk {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsAsk {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl fmt::Debug for ChatCompletionsAsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsAsk")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl AskAsync for ChatCompletionsAsk {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let payload = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Summarizer returned an error status");
            return Err(format!("summarizer returned HTTP {status}").into());
        }

        let body: ChatResponse = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| collapse_whitespace(&c))
            .filter(|c| !c.is_empty())
            .ok_or("summarizer reply had no content")?;
        Ok(content)
    }
}

/// Where and how to reach the summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// The user message: levels, forecasts and the forecast window.
pub fn build_user_message(
    levels: &BTreeMap<City, f64>,
    weather: &WeatherByCity,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&json!({
        "current_levels_pct": levels,
        "weather_15day": weather,
        "window_days": WINDOW_DAYS,
    }))
}

/// Ask the summarizer for a fill-level forecast.
///
/// # Returns
///
/// `Ok(None)` when no API key is configured, otherwise the collapsed reply or
/// the last error after retries are exhausted.
#[instrument(level = "info", skip_all)]
pub async fn summarize(
    config: &SummarizerConfig,
    levels: &BTreeMap<City, f64>,
    weather: &WeatherByCity,
) -> Result<Option<String>, Box<dyn Error>> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        info!("No summarizer API key; skipping summary");
        return Ok(None);
    };

    let t0 = Instant::now();
    let message = build_user_message(levels, weather)?;
    let client = ChatCompletionsAsk::new(&config.endpoint, api_key, &config.model)?;
    let api = RetryAsk::new(client, 2, StdDuration::from_secs(1));
    let res = api.ask(&message).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(elapsed_ms_total = dt.as_millis() as u64, "summarize succeeded"),
        Err(e) => error!(elapsed_ms_total = dt.as_millis() as u64, error = %e, "summarize failed"),
    }
    res.map(Some)
}
