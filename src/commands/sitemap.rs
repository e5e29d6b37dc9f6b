//! Print the sitemap

use anyhow::Result;

use crate::generator::Generator;
use crate::GhostFront;

/// Sitemap XML, or the entry list as JSON
pub async fn run(site: &GhostFront, json: bool) -> Result<String> {
    let generator = Generator::new(site)?;
    if json {
        let entries = generator.sitemap_entries().await;
        Ok(serde_json::to_string_pretty(&entries)?)
    } else {
        Ok(generator.render_sitemap().await)
    }
}
