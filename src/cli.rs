//! Command-line interface definitions for the reservoir pipeline.
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file in the working directory is loaded first). The parsed [`Cli`] is
//! turned into a [`crate::config::PipelineConfig`] once at startup.

use clap::Parser;

/// Command-line arguments for the reservoir pipeline.
///
/// # Examples
///
/// ```sh
/// # Scrape, chart and dump forecasts into ./out
/// baraj_doluluk -o ./out
///
/// # Point the browser pass at a remote chromedriver
/// baraj_doluluk --webdriver-url http://chrome:9515
///
/// # Enable the summary and the X post
/// DEEPSEEK_API_KEY=... X_POST_ENABLED=true \
///   X_API_KEY=... X_API_SECRET=... X_ACCESS_TOKEN=... X_ACCESS_TOKEN_SECRET=... \
///   baraj_doluluk
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory for the chart and the forecast JSON
    #[arg(short, long, env = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// Markdown file receiving the AI analysis
    #[arg(short, long, env = "ANALYSIS_FILE", default_value = "AI_Analysis.md")]
    pub analysis_file: String,

    /// WebDriver endpoint used to render the fill-level pages
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Seconds to let the fill-level pages render before reading them
    #[arg(long, env = "SETTLE_SECS", default_value_t = 2)]
    pub settle_secs: u64,

    /// Per-request timeout for forecast pages, in seconds
    #[arg(long, env = "FORECAST_TIMEOUT_SECS", default_value_t = 15)]
    pub forecast_timeout_secs: u64,

    /// İstanbul 15-day forecast page
    #[arg(
        long,
        env = "ACCU_IST_URL",
        default_value = "https://www.accuweather.com/tr/tr/istanbul/318251/daily-weather-forecast/318251"
    )]
    pub accu_ist_url: String,

    /// Bursa 15-day forecast page
    #[arg(
        long,
        env = "ACCU_BURSA_URL",
        default_value = "https://www.accuweather.com/tr/tr/bursa/316938/daily-weather-forecast/316938"
    )]
    pub accu_bursa_url: String,

    /// İzmir 15-day forecast page
    #[arg(
        long,
        env = "ACCU_IZMIR_URL",
        default_value = "https://www.accuweather.com/tr/tr/izmir/318316/daily-weather-forecast/318316"
    )]
    pub accu_izmir_url: String,

    /// Ankara 15-day forecast page
    #[arg(
        long,
        env = "ACCU_ANKARA_URL",
        default_value = "https://www.accuweather.com/tr/tr/ankara/316938/daily-weather-forecast/316938"
    )]
    pub accu_ankara_url: String,

    /// API key for the summarizer; the summary is skipped without it
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,

    /// Summarizer model name
    #[arg(long, env = "DEEPSEEK_MODEL", default_value = "deepseek-chat")]
    pub deepseek_model: String,

    /// OpenAI-compatible chat-completions endpoint
    #[arg(
        long,
        env = "DEEPSEEK_ENDPOINT",
        default_value = "https://api.deepseek.com/chat/completions"
    )]
    pub deepseek_endpoint: String,

    /// Post to X when set to 1/true/yes/on
    #[arg(long, env = "X_POST_ENABLED", default_value = "false")]
    pub x_post_enabled: String,

    /// Post text only, without the chart image, when set to 1/true/yes/on
    #[arg(long, env = "X_TEXT_ONLY", default_value = "false")]
    pub x_text_only: String,

    /// OAuth 1.0a consumer key
    #[arg(long, env = "X_API_KEY", hide_env_values = true)]
    pub x_api_key: Option<String>,

    /// OAuth 1.0a consumer secret
    #[arg(long, env = "X_API_SECRET", hide_env_values = true)]
    pub x_api_secret: Option<String>,

    /// OAuth 1.0a access token
    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    pub x_access_token: Option<String>,

    /// OAuth 1.0a access token secret
    #[arg(long, env = "X_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub x_access_token_secret: Option<String>,

    /// OAuth 2.0 user token, used when the OAuth 1.0a values are incomplete
    #[arg(long, env = "X_BEARER_TOKEN", hide_env_values = true)]
    pub x_bearer_token: Option<String>,

    /// X API base URL
    #[arg(long, env = "X_API_BASE", default_value = "https://api.x.com")]
    pub x_api_base: String,

    /// Status template; {{IST}}, {{BURSA}}, {{IZMIR}} and {{ANKARA}} are replaced
    #[arg(long, env = "X_TWEET_TEXT")]
    pub x_tweet_text: Option<String>,

    /// Link appended to the status on its own line
    #[arg(long, env = "SHARE_URL")]
    pub share_url: Option<String>,
}
