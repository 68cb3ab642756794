//! Output generation for charts, forecast dumps and the analysis file.
//!
//! # Submodules
//!
//! - [`chart`]: Renders the fill levels to a PNG bar chart
//! - [`json`]: Dumps the 15-day forecasts as JSON
//! - [`markdown`]: Writes the AI analysis Markdown file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── baraj_doluluk_20250506_081500.png
//! └── accuweather_15day_20250506_081512.json
//!
//! AI_Analysis.md   # path chosen separately, replaced on each summarized run
//! ```

pub mod chart;
pub mod json;
pub mod markdown;
