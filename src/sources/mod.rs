//! Markup sources for the two extraction passes.
//!
//! The fill-level pages only show their numbers after client-side rendering,
//! so they are read through a browser session ([`browser`]). The forecast
//! pages are server-rendered and a plain GET is enough ([`http`]).
//!
//! Both sit behind small traits so the orchestrator can be driven by stubs:
//!
//! | Trait | Implementation | Used for |
//! |-------|----------------|----------|
//! | [`PageRenderer`] / [`RenderSession`] | [`browser::WebDriverRenderer`] | Fill levels |
//! | [`PageFetcher`] | [`http::HttpFetcher`] | Forecasts |

pub mod browser;
pub mod http;

use thiserror::Error;

/// Failure to obtain markup from a source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open browser session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),
    #[error("browser command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),
    #[error("failed to fetch page: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Opens browser sessions.
pub trait PageRenderer {
    type Session: RenderSession;

    /// Acquire a new session. Every acquired session must be handed back
    /// through [`RenderSession::release`].
    async fn open(&self) -> Result<Self::Session, SourceError>;
}

/// One browser session rendering one page at a time.
pub trait RenderSession {
    /// Start loading `url`.
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError>;

    /// The currently rendered document.
    async fn markup(&mut self) -> Result<String, SourceError>;

    /// End the session and its browser process.
    async fn release(self) -> Result<(), SourceError>;
}

/// Fetches server-rendered pages.
pub trait PageFetcher {
    /// Body of `url`; any non-200 response is an error.
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
}
