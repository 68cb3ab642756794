//! # Baraj Doluluk
//!
//! Collects reservoir fill levels for İstanbul, Bursa, İzmir and Ankara from
//! the four municipal water utilities, charts them, gathers 15-day forecasts,
//! asks an LLM for a two-week outlook and posts the result to X.
//!
//! ## Usage
//!
//! ```sh
//! chromedriver --port=9515 &
//! baraj_doluluk -o ./out
//! ```
//!
//! ## Architecture
//!
//! The application runs one cycle and exits:
//! 1. **Fill levels**: Render the four utility pages in headless Chrome and extract one percentage each
//! 2. **Chart**: Write a PNG bar chart of the levels
//! 3. **Forecasts**: Fetch and parse each city's 15-day forecast page, dump them as JSON
//! 4. **Summary**: Send levels and forecasts to the summarizer, save the reply as Markdown
//! 5. **Publish**: Compose the status text and post it
//!
//! Every source failure degrades to a default value for that city; no single
//! site can stop the cycle.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod extract;
mod models;
mod orchestrator;
mod outputs;
mod publish;
mod sources;
mod utils;

use api::SummarizerConfig;
use cli::Cli;
use config::PipelineConfig;
use outputs::{chart, json, markdown};
use publish::{PublisherConfig, XCredentials, XPublisher, compose_status};
use sources::browser::WebDriverRenderer;
use sources::http::HttpFetcher;
use utils::{ensure_writable_dir, parse_flag, truncate_for_log};

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenv::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("baraj_doluluk starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.webdriver_url, "Parsed CLI arguments");
    let config = PipelineConfig::from_cli(&args)?;

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Fill levels ----
    info!("Scraping reservoir fill levels");
    let renderer = WebDriverRenderer::new(config.webdriver_url.clone());
    let levels = orchestrator::scrape_levels(&config, &renderer).await;

    // ---- Chart ----
    info!("Rendering chart");
    let chart_path = match chart::write_chart(&levels, &args.output_dir, levels.captured_at).await {
        Ok(path) => Some(path),
        Err(e) => {
            error!(error = %e, "Failed to write chart");
            None
        }
    };

    // ---- Forecasts ----
    info!("Fetching 15-day forecasts");
    let fetcher = HttpFetcher::new(config.forecast_timeout)?;
    let weather = orchestrator::fetch_all_forecasts(&config, &fetcher).await;
    if let Err(e) = json::write_weather(&weather, &args.output_dir, Local::now()).await {
        error!(error = %e, "Failed to write forecast JSON");
    }

    // ---- Summary ----
    info!("Requesting AI summary");
    let summarizer = SummarizerConfig {
        endpoint: args.deepseek_endpoint.clone(),
        api_key: args.deepseek_api_key.clone(),
        model: args.deepseek_model.clone(),
    };
    let summary = match api::summarize(&summarizer, &levels.as_map(), &weather).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "Summary unavailable; continuing without it");
            None
        }
    };
    if let Some(summary) = &summary {
        debug!(preview = %truncate_for_log(summary, 200), "Summary received");
        if let Err(e) = markdown::write_analysis(&args.analysis_file, summary, Local::now()).await {
            error!(path = %args.analysis_file, error = %e, "Failed to write analysis file");
        }
    }

    // ---- Publish ----
    let status = compose_status(
        args.x_tweet_text.as_deref(),
        &levels,
        args.share_url.as_deref(),
    );
    info!(status = %status, "Publishing");
    let publisher = XPublisher::new(PublisherConfig {
        enabled: parse_flag(&args.x_post_enabled),
        text_only: parse_flag(&args.x_text_only),
        credentials: XCredentials::resolve(
            args.x_api_key.as_deref(),
            args.x_api_secret.as_deref(),
            args.x_access_token.as_deref(),
            args.x_access_token_secret.as_deref(),
            args.x_bearer_token.as_deref(),
        ),
        api_base: args.x_api_base.clone(),
    })?;
    let image = chart_path.as_deref().unwrap_or(Path::new(""));
    match publisher.post(image, &status).await {
        Ok(outcome) => debug!(?outcome, "Publish step finished"),
        Err(e) => error!(error = %e, "Failed to post to X"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
