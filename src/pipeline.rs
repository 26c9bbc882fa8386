// src/pipeline.rs
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::consumption::ConsumptionTable;
use crate::error::Result;
use crate::process::{derive_consumption, load_table, remove_water_columns};

/// Load → sanitize → derive with the default column lists.
pub fn process(file_name: &str, content: &[u8]) -> Result<ConsumptionTable> {
    process_with(&PipelineConfig::default(), file_name, content)
}

/// Run the whole pipeline over one uploaded file.
///
/// The returned `Result` carries either the derived table or one
/// [`PipelineError`](crate::error::PipelineError); stage failures never escape
/// any other way.
#[tracing::instrument(level = "info", skip(config, content), fields(bytes = content.len()))]
pub fn process_with(
    config: &PipelineConfig,
    file_name: &str,
    content: &[u8],
) -> Result<ConsumptionTable> {
    let result = load_table(file_name, content)
        .map(|raw| remove_water_columns(raw, &config.water_keywords))
        .and_then(|cleaned| derive_consumption(cleaned, config));

    match &result {
        Ok(table) => info!(records = table.len(), "processed"),
        Err(e) => warn!(kind = e.kind(), error = %e, "processing failed"),
    }
    result
}
