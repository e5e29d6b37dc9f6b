//! Sitemap generation
//!
//! Posts, pages and tags are fetched concurrently and mapped to URL entries.
//! If any fetch fails the sitemap degrades to the homepage alone.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::ghost::{BrowseOptions, ContentSource, GhostResult, Limit, Post, Tag};
use crate::helpers::{date_xml, full_url_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapImage {
    pub loc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<DateTime<FixedOffset>>,
    pub changefreq: ChangeFreq,
    pub priority: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<SitemapImage>>,
}

impl SitemapEntry {
    pub fn homepage() -> Self {
        Self {
            loc: "/".to_string(),
            lastmod: None,
            changefreq: ChangeFreq::Daily,
            priority: 1.0,
            images: None,
        }
    }

    fn post(post: &Post) -> Self {
        Self {
            loc: format!("/posts/{}", post.slug),
            lastmod: post.updated_at,
            changefreq: ChangeFreq::Weekly,
            priority: 0.8,
            images: post
                .feature_image
                .as_ref()
                .filter(|img| !img.is_empty())
                .map(|img| vec![SitemapImage { loc: img.clone() }]),
        }
    }

    fn page(page: &Post) -> Self {
        Self {
            loc: format!("/page/{}", page.slug),
            lastmod: page.updated_at,
            changefreq: ChangeFreq::Monthly,
            priority: 0.7,
            images: None,
        }
    }

    fn tag(tag: &Tag) -> Self {
        Self {
            loc: format!("/tag/{}", tag.slug),
            lastmod: None,
            changefreq: ChangeFreq::Weekly,
            priority: 0.6,
            images: None,
        }
    }
}

async fn fetch_all(source: &dyn ContentSource) -> GhostResult<(Vec<Post>, Vec<Post>, Vec<Tag>)> {
    let post_options = BrowseOptions::new()
        .limit(Limit::All)
        .fields("slug,updated_at,published_at,feature_image");
    let page_options = BrowseOptions::new()
        .limit(Limit::All)
        .fields("slug,updated_at,published_at");
    let tag_options = BrowseOptions::new().limit(Limit::All).fields("slug");

    tokio::try_join!(
        source.browse_posts(&post_options),
        source.browse_pages(&page_options),
        source.browse_tags(&tag_options),
    )
}

/// Build sitemap entries from the content source
pub async fn entries(source: &dyn ContentSource) -> Vec<SitemapEntry> {
    match fetch_all(source).await {
        Ok((posts, pages, tags)) => {
            let mut entries = Vec::with_capacity(1 + posts.len() + pages.len() + tags.len());
            entries.push(SitemapEntry::homepage());
            entries.extend(posts.iter().map(SitemapEntry::post));
            entries.extend(pages.iter().map(SitemapEntry::page));
            entries.extend(tags.iter().map(SitemapEntry::tag));
            tracing::debug!("Sitemap has {} entries", entries.len());
            entries
        }
        Err(e) => {
            tracing::error!("Error generating sitemap: {}", e);
            vec![SitemapEntry::homepage()]
        }
    }
}

/// Render entries as sitemap-protocol XML with absolute locations
pub fn to_xml(config: &SiteConfig, entries: &[SitemapEntry]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">"#);
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&full_url_for(config, &entry.loc))
        ));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", date_xml(lastmod)));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        for image in entry.images.iter().flatten() {
            xml.push_str(&format!(
                "    <image:image><image:loc>{}</image:loc></image:image>\n",
                escape_xml(&full_url_for(config, &image.loc))
            ));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
