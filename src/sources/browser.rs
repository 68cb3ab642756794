//! WebDriver-backed page rendering.
//!
//! Each [`BrowserSession`] is its own headless Chrome process behind a
//! WebDriver endpoint (chromedriver on `localhost:9515` by default). Sessions
//! are not closed on drop; callers release them explicitly.

use super::{PageRenderer, RenderSession, SourceError};
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

/// Chrome flags for an unattended, containerised run.
const CHROME_ARGS: [&str; 3] = ["--headless=new", "--no-sandbox", "--disable-dev-shm-usage"];

/// Opens headless Chrome sessions through a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverRenderer {
    webdriver_url: String,
}

impl WebDriverRenderer {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

fn chrome_capabilities() -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": CHROME_ARGS }));
    caps
}

impl PageRenderer for WebDriverRenderer {
    type Session = BrowserSession;

    #[instrument(level = "debug", skip_all, fields(webdriver = %self.webdriver_url))]
    async fn open(&self) -> Result<BrowserSession, SourceError> {
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities())
            .connect(&self.webdriver_url)
            .await?;
        debug!("Opened browser session");
        Ok(BrowserSession { client })
    }
}

/// A live headless browser session.
pub struct BrowserSession {
    client: Client,
}

impl RenderSession for BrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn markup(&mut self) -> Result<String, SourceError> {
        Ok(self.client.source().await?)
    }

    async fn release(self) -> Result<(), SourceError> {
        self.client.close().await?;
        debug!("Closed browser session");
        Ok(())
    }
}
