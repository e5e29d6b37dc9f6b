//! The raw, fallible content source behind the API wrapper

use async_trait::async_trait;

use super::error::GhostResult;
use super::model::{Post, Settings, Tag};

/// Page size for browse requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    All,
    Count(u32),
}

impl Limit {
    pub fn as_param(&self) -> String {
        match self {
            Limit::All => "all".to_string(),
            Limit::Count(n) => n.to_string(),
        }
    }
}

/// Query options for browse requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseOptions {
    pub limit: Option<Limit>,
    pub include: Option<String>,
    pub fields: Option<String>,
    pub filter: Option<String>,
    pub order: Option<String>,
}

impl BrowseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include(mut self, include: &str) -> Self {
        self.include = Some(include.to_string());
        self
    }

    pub fn fields(mut self, fields: &str) -> Self {
        self.fields = Some(fields.to_string());
        self
    }

    pub fn filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    /// Query parameters in a stable order (the API key is added by the client)
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = &self.limit {
            query.push(("limit", limit.as_param()));
        }
        if let Some(include) = &self.include {
            query.push(("include", include.clone()));
        }
        if let Some(fields) = &self.fields {
            query.push(("fields", fields.clone()));
        }
        if let Some(filter) = &self.filter {
            query.push(("filter", filter.clone()));
        }
        if let Some(order) = &self.order {
            query.push(("order", order.clone()));
        }
        query
    }
}

/// Read-only access to posts, pages, tags and settings.
///
/// `GhostClient` implements this over HTTP; tests plug in an in-memory source.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn browse_posts(&self, options: &BrowseOptions) -> GhostResult<Vec<Post>>;

    async fn read_post(&self, slug: &str, include: Option<&str>) -> GhostResult<Post>;

    async fn browse_pages(&self, options: &BrowseOptions) -> GhostResult<Vec<Post>>;

    async fn read_page(&self, slug: &str, include: Option<&str>) -> GhostResult<Post>;

    async fn browse_tags(&self, options: &BrowseOptions) -> GhostResult<Vec<Tag>>;

    async fn read_tag(&self, slug: &str) -> GhostResult<Tag>;

    async fn read_settings(&self) -> GhostResult<Settings>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_order() {
        let options = BrowseOptions::new()
            .limit(Limit::All)
            .fields("slug")
            .include("tags,authors");
        assert_eq!(
            options.to_query(),
            vec![
                ("limit", "all".to_string()),
                ("include", "tags,authors".to_string()),
                ("fields", "slug".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_query() {
        assert!(BrowseOptions::new().to_query().is_empty());
        assert_eq!(Limit::Count(100).as_param(), "100");
    }
}
