//! Export the site as static files

use anyhow::Result;

use crate::generator::{ExportSummary, Generator};
use crate::GhostFront;

/// Render every view into the public directory
pub async fn run(site: &GhostFront) -> Result<ExportSummary> {
    let start = std::time::Instant::now();

    let generator = Generator::new(site)?;
    let summary = generator.export().await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(summary)
}
