//! Markdown file holding the latest AI analysis.
//!
//! The file is replaced on every run that produced a summary; runs without a
//! summary leave the previous analysis in place.

use chrono::{DateTime, Local};
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Render the analysis document.
pub fn analysis_to_markdown(summary: &str, at: DateTime<Local>) -> String {
    format!(
        "# Yapay Zeka Tahmini ({})\n\n{}\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        summary
    )
}

/// Overwrite `path` with the analysis document.
#[instrument(level = "info", skip(summary, at))]
pub async fn write_analysis(
    path: &str,
    summary: &str,
    at: DateTime<Local>,
) -> Result<(), Box<dyn Error>> {
    fs::write(path, analysis_to_markdown(summary, at)).await?;
    info!("Updated analysis file");
    Ok(())
}
