//! HTTP client for the Ghost Content API

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{GhostError, GhostResult};
use super::model::{
    ErrorEnvelope, PagesEnvelope, Post, PostsEnvelope, Settings, SettingsEnvelope, Tag,
    TagsEnvelope,
};
use super::source::{BrowseOptions, ContentSource};
use crate::config::SiteConfig;

const API_PATH: &str = "ghost/api/content";

/// Characters that would end or restructure a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b',');

/// `{resource}/slug/{slug}/` with the slug encoded as one segment
fn slug_path(resource: &str, slug: &str) -> String {
    format!(
        "{}/slug/{}/",
        resource,
        utf8_percent_encode(slug, PATH_SEGMENT)
    )
}

pub struct GhostClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
    version: String,
}

impl GhostClient {
    /// Build a client from the site configuration
    pub fn new(config: &SiteConfig) -> GhostResult<Self> {
        let base_url = config.ghost_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(GhostError::Config("ghost_url is empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GhostError::Config(format!(
                "ghost_url must be an http(s) URL, got {:?}",
                base_url
            )));
        }
        let key = config.content_api_key.trim();
        if key.is_empty() {
            return Err(GhostError::Config("content_api_key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("ghost-front/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GhostError::Http {
                url: base_url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            key: key.to_string(),
            version: config.api_version.clone(),
        })
    }

    /// Full URL of a Content API resource path such as `posts/` or `tags/slug/news/`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            API_PATH,
            path.trim_start_matches('/')
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&'static str, String)>,
    ) -> GhostResult<T> {
        let url = self.endpoint(path);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .header("Accept-Version", &self.version)
            .query(&[("key", self.key.as_str())])
            .query(&query)
            .send()
            .await
            .map_err(|e| GhostError::Http {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GhostError::Http {
            url: url.clone(),
            source: e,
        })?;

        if !status.is_success() {
            let message = api_error_message(&body);
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(GhostError::NotFound(format!("{} ({})", path, message)));
            }
            return Err(GhostError::Status {
                url,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| GhostError::Decode { url, source: e })
    }
}

/// Pull the first message out of a Ghost `{"errors": [...]}` body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map(|detail| {
            if detail.kind.is_empty() {
                detail.message
            } else {
                format!("{}: {}", detail.kind, detail.message)
            }
        })
        .unwrap_or_else(|| "no error details".to_string())
}

fn read_query(include: Option<&str>) -> Vec<(&'static str, String)> {
    include
        .map(|include| vec![("include", include.to_string())])
        .unwrap_or_default()
}

fn first_or_not_found<T>(items: Vec<T>, what: &str) -> GhostResult<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| GhostError::NotFound(what.to_string()))
}

#[async_trait]
impl ContentSource for GhostClient {
    async fn browse_posts(&self, options: &BrowseOptions) -> GhostResult<Vec<Post>> {
        let envelope: PostsEnvelope = self.get("posts/", options.to_query()).await?;
        Ok(envelope.posts)
    }

    async fn read_post(&self, slug: &str, include: Option<&str>) -> GhostResult<Post> {
        let path = slug_path("posts", slug);
        let envelope: PostsEnvelope = self.get(&path, read_query(include)).await?;
        first_or_not_found(envelope.posts, &path)
    }

    async fn browse_pages(&self, options: &BrowseOptions) -> GhostResult<Vec<Post>> {
        let envelope: PagesEnvelope = self.get("pages/", options.to_query()).await?;
        Ok(envelope.pages)
    }

    async fn read_page(&self, slug: &str, include: Option<&str>) -> GhostResult<Post> {
        let path = slug_path("pages", slug);
        let envelope: PagesEnvelope = self.get(&path, read_query(include)).await?;
        first_or_not_found(envelope.pages, &path)
    }

    async fn browse_tags(&self, options: &BrowseOptions) -> GhostResult<Vec<Tag>> {
        let envelope: TagsEnvelope = self.get("tags/", options.to_query()).await?;
        Ok(envelope.tags)
    }

    async fn read_tag(&self, slug: &str) -> GhostResult<Tag> {
        let path = slug_path("tags", slug);
        let envelope: TagsEnvelope = self.get(&path, Vec::new()).await?;
        first_or_not_found(envelope.tags, &path)
    }

    async fn read_settings(&self) -> GhostResult<Settings> {
        let envelope: SettingsEnvelope = self.get("settings/", Vec::new()).await?;
        Ok(envelope.settings)
    }
}
