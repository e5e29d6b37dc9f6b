//! Generator module - renders views from CMS content using the built-in templates
//!
//! Used by the server for every request and by `generate` to prerender the
//! whole site into the public directory.

use anyhow::{Context as _, Result};
use chrono::Datelike;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Context;

use crate::content::cards;
use crate::ghost::{Post, Tag};
use crate::helpers::{attr_escape, full_url_for, is_slug, meta_generator, social_meta};
use crate::settings::SiteSettings;
use crate::sitemap::{self, SitemapEntry};
use crate::templates::{MetaData, PostCard, PostData, TagData, TagLink, TemplateRenderer};
use crate::GhostFront;

/// Width requested for post-card thumbnails
const CARD_IMAGE_WIDTH: u32 = 600;

/// Page-level metadata before it is turned into `MetaData`
struct PageMeta<'a> {
    title: Option<&'a str>,
    description: Option<&'a str>,
    path: &'a str,
    og_image: Option<&'a str>,
    twitter_image: Option<&'a str>,
}

/// Counts of files written by `export`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub posts: usize,
    pub pages: usize,
    pub tags: usize,
    pub skipped: usize,
}

/// Renders site views with Tera templates
pub struct Generator {
    site: GhostFront,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &GhostFront) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        Ok(Self {
            site: site.clone(),
            renderer,
        })
    }

    /// Render the homepage post feed
    pub async fn render_index(&self) -> Result<String> {
        let (settings, posts) =
            tokio::join!(self.site.settings.current(), self.site.api.get_posts());

        let cards: Vec<PostCard> = posts.iter().map(|p| self.post_card(p)).collect();

        let meta = PageMeta {
            title: None,
            description: None,
            path: "/",
            og_image: None,
            twitter_image: None,
        };
        let mut context = self.create_base_context(&settings, &meta);
        context.insert("posts", &cards);

        self.renderer.render("index.html", &context)
    }

    /// Render a single post, `None` if it does not exist
    pub async fn render_post(&self, slug: &str) -> Result<Option<String>> {
        let (settings, post) = tokio::join!(
            self.site.settings.current(),
            self.site.api.get_single_post(slug)
        );
        match post {
            Some(post) => {
                let path = format!("/posts/{}", post.slug);
                self.render_article("post.html", &settings, &post, &path)
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Render a standalone page, `None` if it does not exist
    pub async fn render_page(&self, slug: &str) -> Result<Option<String>> {
        let (settings, page) = tokio::join!(
            self.site.settings.current(),
            self.site.api.get_single_page(slug)
        );
        match page {
            Some(page) => {
                let path = format!("/page/{}", page.slug);
                self.render_article("page.html", &settings, &page, &path)
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Render a tag archive, `None` if the tag does not exist
    pub async fn render_tag(&self, slug: &str) -> Result<Option<String>> {
        let (settings, tag, posts) = tokio::join!(
            self.site.settings.current(),
            self.site.api.get_single_tag(slug),
            self.site.api.get_posts_by_tag(slug)
        );
        let tag = match tag {
            Some(tag) => tag,
            None => return Ok(None),
        };

        let path = format!("/tag/{}", tag.slug);
        let meta = PageMeta {
            title: Some(tag.name.as_str()),
            description: tag.description.as_deref(),
            path: &path,
            og_image: tag.feature_image.as_deref(),
            twitter_image: tag.feature_image.as_deref(),
        };
        let mut context = self.create_base_context(&settings, &meta);
        context.insert("tag", &self.tag_data(&tag));
        context.insert(
            "posts",
            &posts.iter().map(|p| self.post_card(p)).collect::<Vec<_>>(),
        );

        self.renderer.render("tag.html", &context).map(Some)
    }

    /// Render the 404 page
    pub async fn render_not_found(&self, path: &str) -> Result<String> {
        let settings = self.site.settings.current().await;
        let meta = PageMeta {
            title: Some("Not Found"),
            description: None,
            path,
            og_image: None,
            twitter_image: None,
        };
        let mut context = self.create_base_context(&settings, &meta);
        context.insert(
            "message",
            &format!("Nothing was found at {}.", path),
        );
        self.renderer.render("not_found.html", &context)
    }

    /// Sitemap entries; the homepage alone if the CMS cannot be reached
    pub async fn sitemap_entries(&self) -> Vec<SitemapEntry> {
        match self.site.api.source() {
            Ok(source) => sitemap::entries(source.as_ref()).await,
            Err(e) => {
                tracing::error!("Error generating sitemap: {}", e);
                vec![SitemapEntry::homepage()]
            }
        }
    }

    /// Sitemap XML with absolute locations
    pub async fn render_sitemap(&self) -> String {
        let entries = self.sitemap_entries().await;
        sitemap::to_xml(&self.site.config, &entries)
    }

    /// Prerender every view listed in the sitemap into the public directory
    pub async fn export(&self) -> Result<ExportSummary> {
        let public_dir = &self.site.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        let entries = self.sitemap_entries().await;
        let mut summary = ExportSummary::default();

        write_file(&public_dir.join("index.html"), &self.render_index().await?)?;

        for entry in &entries {
            let (kind, slug) = match entry.loc.trim_start_matches('/').split_once('/') {
                Some(parts) => parts,
                None => continue,
            };
            if !is_slug(slug) {
                tracing::warn!("Skipping unsafe slug {:?}", slug);
                summary.skipped += 1;
                continue;
            }

            let html = match kind {
                "posts" => self.render_post(slug).await?,
                "page" => self.render_page(slug).await?,
                "tag" => self.render_tag(slug).await?,
                _ => None,
            };
            let html = match html {
                Some(html) => html,
                None => {
                    tracing::warn!("Nothing to render for {}", entry.loc);
                    summary.skipped += 1;
                    continue;
                }
            };

            write_file(&output_path(public_dir, kind, slug), &html)?;
            match kind {
                "posts" => summary.posts += 1,
                "page" => summary.pages += 1,
                _ => summary.tags += 1,
            }
        }

        let xml = sitemap::to_xml(&self.site.config, &entries);
        write_file(&public_dir.join("sitemap.xml"), &xml)?;
        tracing::info!(
            "Exported {} posts, {} pages, {} tags to {:?}",
            summary.posts,
            summary.pages,
            summary.tags,
            public_dir
        );

        Ok(summary)
    }

    /// Render a post or page body with processed HTML
    fn render_article(
        &self,
        template: &str,
        settings: &SiteSettings,
        post: &Post,
        path: &str,
    ) -> Result<String> {
        let processed = self
            .site
            .html
            .process(post.html.as_deref().unwrap_or_default());

        let feature_image = post
            .feature_image
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|src| self.optimized_image(src, self.site.config.images.default_width));

        let data = PostData {
            title: post.title.clone(),
            path: path.to_string(),
            html: processed.html,
            excerpt: post.summary().unwrap_or_default().to_string(),
            feature_image,
            feature_image_alt: post
                .feature_image_alt
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| post.title.clone()),
            published_at: post.published_at.map(|d| d.to_rfc3339()),
            updated_at: post.updated_at.map(|d| d.to_rfc3339()),
            reading_time: post.reading_time,
            tags: post.tags.iter().map(tag_link).collect(),
            authors: post.authors.iter().map(|a| a.name.clone()).collect(),
        };

        let meta = PageMeta {
            title: Some(
                post.meta_title
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(&post.title),
            ),
            description: post
                .meta_description
                .as_deref()
                .filter(|s| !s.is_empty())
                .or_else(|| post.summary()),
            path,
            og_image: post
                .og_image
                .as_deref()
                .or(post.feature_image.as_deref()),
            twitter_image: post
                .twitter_image
                .as_deref()
                .or(post.feature_image.as_deref()),
        };

        let mut context = self.create_base_context(settings, &meta);
        context.insert("post", &data);

        let page = self.renderer.render(template, &context)?;
        if processed.has_toggle_cards {
            Ok(cards::inject_script(&page))
        } else {
            Ok(page)
        }
    }

    /// Create a base context with common variables
    fn create_base_context(&self, settings: &SiteSettings, meta: &PageMeta) -> Context {
        let config = &self.site.config;
        let description = meta
            .description
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| settings.meta_description());
        let title = settings.meta_title(meta.title);
        let canonical_url = full_url_for(config, meta.path);
        let og_image = meta
            .og_image
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| settings.og_image());
        let twitter_image = meta
            .twitter_image
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| settings.twitter_image());

        let meta_data = MetaData {
            social: social_meta(
                &title,
                description,
                &canonical_url,
                Some(og_image),
                Some(twitter_image),
                settings.site_title(),
            ),
            title,
            description: description.to_string(),
            canonical_url,
            generator: meta_generator(),
        };

        let mut context = Context::new();
        context.insert("site", &settings.view());
        context.insert("meta", &meta_data);
        context.insert("current_year", &chrono::Utc::now().year());
        context
    }

    fn post_card(&self, post: &Post) -> PostCard {
        PostCard {
            title: post.title.clone(),
            path: format!("/posts/{}", post.slug),
            excerpt: post.summary().unwrap_or_default().to_string(),
            feature_image: post
                .feature_image
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|src| self.optimized_image(src, CARD_IMAGE_WIDTH)),
            published_at: post.published_at.map(|d| d.to_rfc3339()),
            reading_time: post.reading_time,
            tags: post.tags.iter().map(tag_link).collect(),
        }
    }

    fn tag_data(&self, tag: &Tag) -> TagData {
        TagData {
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            description: tag.description.clone().filter(|s| !s.is_empty()),
            feature_image: tag
                .feature_image
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|src| self.optimized_image(src, self.site.config.images.default_width)),
            post_count: tag.count.as_ref().map(|c| c.posts),
        }
    }

    /// Attribute-escaped optimized URL for a standalone image, the original if it cannot be optimized
    fn optimized_image(&self, src: &str, width: u32) -> String {
        let images = self.site.html.images();
        let width = images.target_width(Some(width.to_string().as_str()), None);
        let url = match images.image_url(src, width) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Using original image {}: {}", src, e);
                src.to_string()
            }
        };
        attr_escape(&url)
    }
}

fn tag_link(tag: &Tag) -> TagLink {
    TagLink {
        name: tag.name.clone(),
        path: format!("/tag/{}", tag.slug),
    }
}

fn output_path(public_dir: &Path, kind: &str, slug: &str) -> PathBuf {
    public_dir.join(kind).join(slug).join("index.html")
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Generated: {:?}", path);
    Ok(())
}
