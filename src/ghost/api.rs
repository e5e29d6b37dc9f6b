//! Infallible accessors over a lazily constructed content source
//!
//! Every accessor performs one request and turns any failure into an empty
//! or `None` result after logging it. Callers never see errors.

use std::sync::{Arc, OnceLock};

use super::client::GhostClient;
use super::error::GhostResult;
use super::model::{Post, Settings, Tag};
use super::source::{BrowseOptions, ContentSource, Limit};
use crate::config::SiteConfig;
use crate::helpers::is_slug;

const POST_LIST_FIELDS: &str =
    "id,title,slug,excerpt,custom_excerpt,feature_image,published_at,updated_at,reading_time";
const PAGE_LIST_FIELDS: &str = "id,title,slug,excerpt,feature_image,published_at,updated_at";
const INCLUDE_RELATIONS: &str = "tags,authors";

pub struct ContentApi {
    config: Arc<SiteConfig>,
    source: OnceLock<Arc<dyn ContentSource>>,
}

impl ContentApi {
    /// Create the wrapper; the HTTP client is built on first use
    pub fn new(config: Arc<SiteConfig>) -> Self {
        Self {
            config,
            source: OnceLock::new(),
        }
    }

    /// Create the wrapper around an already constructed source
    pub fn with_source(config: Arc<SiteConfig>, source: Arc<dyn ContentSource>) -> Self {
        let api = Self::new(config);
        let _ = api.source.set(source);
        api
    }

    /// The shared source, constructing the Ghost client on first call.
    ///
    /// A failed construction is not cached, so the next call tries again.
    pub fn source(&self) -> GhostResult<Arc<dyn ContentSource>> {
        if let Some(source) = self.source.get() {
            return Ok(source.clone());
        }

        let client: Arc<dyn ContentSource> = Arc::new(GhostClient::new(&self.config)?);
        tracing::info!("Initialized Ghost client for {}", self.config.ghost_url);
        Ok(self.source.get_or_init(|| client).clone())
    }

    pub async fn get_posts(&self) -> Vec<Post> {
        let options = BrowseOptions::new()
            .limit(Limit::Count(self.config.posts_limit))
            .include(INCLUDE_RELATIONS)
            .fields(POST_LIST_FIELDS);
        self.list("posts", |source| async move {
            source.browse_posts(&options).await
        })
        .await
    }

    pub async fn get_single_post(&self, slug: &str) -> Option<Post> {
        self.single("post", |source| async move {
            source.read_post(slug, Some(INCLUDE_RELATIONS)).await
        })
        .await
    }

    pub async fn get_pages(&self) -> Vec<Post> {
        let options = BrowseOptions::new()
            .limit(Limit::All)
            .fields(PAGE_LIST_FIELDS);
        self.list("pages", |source| async move {
            source.browse_pages(&options).await
        })
        .await
    }

    pub async fn get_single_page(&self, slug: &str) -> Option<Post> {
        self.single("page", |source| async move {
            source.read_page(slug, Some(INCLUDE_RELATIONS)).await
        })
        .await
    }

    pub async fn get_tags(&self) -> Vec<Tag> {
        let options = BrowseOptions::new()
            .limit(Limit::All)
            .include("count.posts");
        self.list("tags", |source| async move {
            source.browse_tags(&options).await
        })
        .await
    }

    pub async fn get_single_tag(&self, slug: &str) -> Option<Tag> {
        self.single("tag", |source| async move { source.read_tag(slug).await })
            .await
    }

    /// Posts carrying the given tag, newest first
    pub async fn get_posts_by_tag(&self, tag_slug: &str) -> Vec<Post> {
        // the slug is spliced into an NQL filter
        if !is_slug(tag_slug) {
            tracing::warn!("Rejected tag slug {:?}", tag_slug);
            return Vec::new();
        }
        let options = BrowseOptions::new()
            .limit(Limit::Count(self.config.posts_limit))
            .include(INCLUDE_RELATIONS)
            .fields(POST_LIST_FIELDS)
            .filter(&format!("tag:{}", tag_slug))
            .order("published_at desc");
        self.list("tag posts", |source| async move {
            source.browse_posts(&options).await
        })
        .await
    }

    pub async fn get_settings(&self) -> Option<Settings> {
        self.single("settings", |source| async move {
            source.read_settings().await
        })
        .await
    }

    async fn list<T, F, Fut>(&self, what: &str, fetch: F) -> Vec<T>
    where
        F: FnOnce(Arc<dyn ContentSource>) -> Fut,
        Fut: std::future::Future<Output = GhostResult<Vec<T>>>,
    {
        let result = match self.source() {
            Ok(source) => fetch(source).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Error fetching {}: {}", what, e);
                Vec::new()
            }
        }
    }

    async fn single<T, F, Fut>(&self, what: &str, fetch: F) -> Option<T>
    where
        F: FnOnce(Arc<dyn ContentSource>) -> Fut,
        Fut: std::future::Future<Output = GhostResult<T>>,
    {
        let result = match self.source() {
            Ok(source) => fetch(source).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::error!("Error fetching {}: {}", what, e);
                None
            }
        }
    }
}
