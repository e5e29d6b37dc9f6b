//! Ghost Content API records

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A post or a page. Ghost uses the same shape for both.
///
/// Everything except the slug is optional because `fields=` queries
/// return partial records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub uuid: Option<String>,
    pub title: String,
    pub slug: String,
    pub html: Option<String>,
    pub comment_id: Option<String>,
    pub feature_image: Option<String>,
    pub feature_image_alt: Option<String>,
    pub featured: bool,
    pub visibility: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub custom_excerpt: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Vec<Tag>,
    pub authors: Vec<Author>,
    pub primary_author: Option<Author>,
    pub primary_tag: Option<Tag>,
    pub url: Option<String>,
    pub canonical_url: Option<String>,
    pub reading_time: Option<u32>,
    pub og_image: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_image: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl Post {
    /// Custom excerpt if the author wrote one, else Ghost's generated excerpt
    pub fn summary(&self) -> Option<&str> {
        let non_blank = |s: &&str| !s.trim().is_empty();
        self.custom_excerpt
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.excerpt.as_deref().filter(non_blank))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub feature_image: Option<String>,
    pub visibility: Option<String>,
    /// Present when requested with `include=count.posts`
    pub count: Option<TagCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagCount {
    pub posts: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
}

/// Site-wide settings from `/settings/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub icon: Option<String>,
    pub accent_color: Option<String>,
    pub cover_image: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub lang: Option<String>,
    pub timezone: Option<String>,
    pub url: Option<String>,
    pub navigation: Vec<NavigationItem>,
    pub secondary_navigation: Vec<NavigationItem>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_image: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_image: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationItem {
    pub label: String,
    pub url: String,
}

/// `{"posts": [...]}` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// `{"pages": [...]}` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct PagesEnvelope {
    #[serde(default)]
    pub pages: Vec<Post>,
}

/// `{"tags": [...]}` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct TagsEnvelope {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// `{"settings": {...}}` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct SettingsEnvelope {
    pub settings: Settings,
}

/// `{"errors": [...]}` body returned with non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}
