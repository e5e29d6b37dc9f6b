//! In-memory content source
//!
//! Keeps posts, pages, tags and settings in plain vectors so the API wrapper,
//! sitemap, generator and router can run without a Ghost instance.

use async_trait::async_trait;
use chrono::DateTime;
use std::sync::{Arc, Mutex};

use super::error::{GhostError, GhostResult};
use super::model::{Post, Settings, Tag};
use super::source::{BrowseOptions, ContentSource};

#[derive(Clone, Default)]
pub struct MemorySource {
    pub posts: Vec<Post>,
    pub pages: Vec<Post>,
    pub tags: Vec<Tag>,
    pub settings: Option<Settings>,
    /// Fail every request as if the CMS were unreachable
    pub fail: bool,
    calls: Arc<Mutex<Vec<BrowseOptions>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Browse options seen so far, in call order
    pub fn calls(&self) -> Arc<Mutex<Vec<BrowseOptions>>> {
        self.calls.clone()
    }

    pub fn with_post(mut self, slug: &str, title: &str, html: &str) -> Self {
        self.posts.push(sample_post(slug, title, html));
        self
    }

    pub fn with_tagged_post(mut self, slug: &str, title: &str, tag_slug: &str) -> Self {
        let mut post = sample_post(slug, title, "");
        post.tags.push(sample_tag(tag_slug));
        self.posts.push(post);
        self
    }

    pub fn with_page(mut self, slug: &str, title: &str, html: &str) -> Self {
        self.pages.push(sample_post(slug, title, html));
        self
    }

    pub fn with_tag(mut self, slug: &str) -> Self {
        self.tags.push(sample_tag(slug));
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    fn check(&self) -> GhostResult<()> {
        if self.fail {
            Err(GhostError::Status {
                url: "memory://".to_string(),
                status: 503,
                message: "content source unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn record(&self, options: &BrowseOptions) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(options.clone());
        }
    }
}

/// A published post with stable timestamps
pub fn sample_post(slug: &str, title: &str, html: &str) -> Post {
    let published = DateTime::parse_from_rfc3339("2024-05-01T09:30:00+00:00").ok();
    let updated = DateTime::parse_from_rfc3339("2024-05-03T12:00:00+00:00").ok();
    Post {
        id: format!("id-{}", slug),
        title: title.to_string(),
        slug: slug.to_string(),
        html: if html.is_empty() {
            None
        } else {
            Some(html.to_string())
        },
        excerpt: Some(format!("About {}", title)),
        published_at: published,
        updated_at: updated,
        reading_time: Some(2),
        ..Default::default()
    }
}

pub fn sample_tag(slug: &str) -> Tag {
    Tag {
        id: format!("tag-{}", slug),
        name: slug.to_string(),
        slug: slug.to_string(),
        ..Default::default()
    }
}

/// Apply the `tag:slug` filter form used by the API wrapper
fn matches_filter(post: &Post, filter: Option<&str>) -> bool {
    match filter.and_then(|f| f.strip_prefix("tag:")) {
        Some(tag) => post.tags.iter().any(|t| t.slug == tag),
        None => true,
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn browse_posts(&self, options: &BrowseOptions) -> GhostResult<Vec<Post>> {
        self.record(options);
        self.check()?;
        Ok(self
            .posts
            .iter()
            .filter(|p| matches_filter(p, options.filter.as_deref()))
            .cloned()
            .collect())
    }

    async fn read_post(&self, slug: &str, _include: Option<&str>) -> GhostResult<Post> {
        self.check()?;
        self.posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| GhostError::NotFound(format!("posts/slug/{}/", slug)))
    }

    async fn browse_pages(&self, options: &BrowseOptions) -> GhostResult<Vec<Post>> {
        self.record(options);
        self.check()?;
        Ok(self.pages.clone())
    }

    async fn read_page(&self, slug: &str, _include: Option<&str>) -> GhostResult<Post> {
        self.check()?;
        self.pages
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| GhostError::NotFound(format!("pages/slug/{}/", slug)))
    }

    async fn browse_tags(&self, options: &BrowseOptions) -> GhostResult<Vec<Tag>> {
        self.record(options);
        self.check()?;
        Ok(self.tags.clone())
    }

    async fn read_tag(&self, slug: &str) -> GhostResult<Tag> {
        self.check()?;
        self.tags
            .iter()
            .find(|t| t.slug == slug)
            .cloned()
            .ok_or_else(|| GhostError::NotFound(format!("tags/slug/{}/", slug)))
    }

    async fn read_settings(&self) -> GhostResult<Settings> {
        self.check()?;
        self.settings
            .clone()
            .ok_or_else(|| GhostError::NotFound("settings/".to_string()))
    }
}
