//! Site-wide settings with fallbacks
//!
//! `SettingsStore` fetches Ghost's settings at most once per TTL and hands
//! out `SiteSettings`, which resolves every derived field against the
//! configured defaults.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::SiteConfig;
use crate::ghost::{ContentApi, NavigationItem, Settings};

/// Settings as the templates see them
#[derive(Debug, Clone)]
pub struct SiteSettings {
    settings: Option<Settings>,
    default_title: String,
    default_description: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl SiteSettings {
    pub fn new(settings: Option<Settings>, config: &SiteConfig) -> Self {
        Self {
            settings,
            default_title: config.default_title.clone(),
            default_description: config.default_description.clone(),
        }
    }

    /// Raw settings, if the CMS returned any
    pub fn raw(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    fn field(&self, get: impl Fn(&Settings) -> &Option<String>) -> Option<&str> {
        self.settings.as_ref().and_then(|s| non_empty(get(s)))
    }

    pub fn site_title(&self) -> &str {
        self.field(|s| &s.title).unwrap_or(&self.default_title)
    }

    pub fn site_description(&self) -> &str {
        self.field(|s| &s.description)
            .unwrap_or(&self.default_description)
    }

    pub fn site_logo(&self) -> Option<&str> {
        self.field(|s| &s.logo)
    }

    pub fn site_icon(&self) -> Option<&str> {
        self.field(|s| &s.icon)
    }

    pub fn accent_color(&self) -> Option<&str> {
        self.field(|s| &s.accent_color)
    }

    pub fn navigation(&self) -> &[NavigationItem] {
        self.settings
            .as_ref()
            .map(|s| s.navigation.as_slice())
            .unwrap_or(&[])
    }

    pub fn secondary_navigation(&self) -> &[NavigationItem] {
        self.settings
            .as_ref()
            .map(|s| s.secondary_navigation.as_slice())
            .unwrap_or(&[])
    }

    /// `"{page} - {site}"` for a titled page, else the site's meta title
    pub fn meta_title(&self, page_title: Option<&str>) -> String {
        match page_title.filter(|t| !t.trim().is_empty()) {
            Some(title) => format!("{} - {}", title, self.site_title()),
            None => self
                .field(|s| &s.meta_title)
                .unwrap_or_else(|| self.site_title())
                .to_string(),
        }
    }

    pub fn meta_description(&self) -> &str {
        self.field(|s| &s.meta_description)
            .unwrap_or_else(|| self.site_description())
    }

    pub fn og_image(&self) -> &str {
        self.field(|s| &s.og_image)
            .or_else(|| self.field(|s| &s.cover_image))
            .unwrap_or("")
    }

    pub fn twitter_image(&self) -> &str {
        self.field(|s| &s.twitter_image)
            .or_else(|| self.field(|s| &s.cover_image))
            .unwrap_or("")
    }

    /// Resolved fields for template contexts
    pub fn view(&self) -> SettingsView {
        SettingsView {
            title: self.site_title().to_string(),
            description: self.site_description().to_string(),
            logo: self.site_logo().map(str::to_string),
            icon: self.site_icon().map(str::to_string),
            accent_color: self.accent_color().map(str::to_string),
            navigation: self.navigation().to_vec(),
            secondary_navigation: self.secondary_navigation().to_vec(),
            meta_description: self.meta_description().to_string(),
            og_image: self.og_image().to_string(),
            twitter_image: self.twitter_image().to_string(),
            lang: self
                .field(|s| &s.lang)
                .unwrap_or("en")
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub title: String,
    pub description: String,
    pub logo: Option<String>,
    pub icon: Option<String>,
    pub accent_color: Option<String>,
    pub navigation: Vec<NavigationItem>,
    pub secondary_navigation: Vec<NavigationItem>,
    pub meta_description: String,
    pub og_image: String,
    pub twitter_image: String,
    pub lang: String,
}

/// Process-wide settings cache
pub struct SettingsStore {
    api: Arc<ContentApi>,
    config: Arc<SiteConfig>,
    cache: TtlCache<Settings>,
}

impl SettingsStore {
    pub fn new(api: Arc<ContentApi>, config: Arc<SiteConfig>) -> Self {
        let ttl = Duration::from_secs(config.settings_ttl_secs);
        Self {
            api,
            config,
            cache: TtlCache::new(ttl),
        }
    }

    /// Current settings; a failed fetch is not cached
    pub async fn current(&self) -> SiteSettings {
        let settings = match self.cache.get().await {
            Some(settings) => Some(settings),
            None => {
                let fetched = self.api.get_settings().await;
                if let Some(settings) = &fetched {
                    self.cache.set(settings.clone()).await;
                }
                fetched
            }
        };
        SiteSettings::new(settings, &self.config)
    }

    /// Forget the cached settings
    pub async fn refresh(&self) {
        self.cache.invalidate().await;
        tracing::debug!("Settings cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::testing::MemorySource;

    fn config() -> SiteConfig {
        SiteConfig::default()
    }

    #[test]
    fn test_defaults_without_settings() {
        let site = SiteSettings::new(None, &config());
        assert_eq!(site.site_title(), "My Blog");
        assert_eq!(site.site_description(), "A blog powered by Ghost");
        assert_eq!(site.meta_title(None), "My Blog");
        assert_eq!(site.meta_title(Some("Hello")), "Hello - My Blog");
        assert_eq!(site.meta_description(), "A blog powered by Ghost");
        assert_eq!(site.og_image(), "");
        assert_eq!(site.twitter_image(), "");
        assert!(site.navigation().is_empty());
        assert!(site.site_logo().is_none());
    }

    #[test]
    fn test_empty_strings_fall_back() {
        let settings = Settings {
            title: Some("".into()),
            description: Some("  ".into()),
            ..Default::default()
        };
        let site = SiteSettings::new(Some(settings), &config());
        assert_eq!(site.site_title(), "My Blog");
        assert_eq!(site.site_description(), "A blog powered by Ghost");
    }

    #[test]
    fn test_derived_fields() {
        let settings = Settings {
            title: Some("Notes".into()),
            description: Some("Field notes".into()),
            meta_title: Some("Notes | Home".into()),
            cover_image: Some("https://cms.test/cover.jpg".into()),
            twitter_image: Some("https://cms.test/tw.jpg".into()),
            navigation: vec![NavigationItem {
                label: "Home".into(),
                url: "/".into(),
            }],
            ..Default::default()
        };
        let site = SiteSettings::new(Some(settings), &config());
        assert_eq!(site.meta_title(None), "Notes | Home");
        assert_eq!(site.meta_title(Some("Post")), "Post - Notes");
        assert_eq!(site.meta_description(), "Field notes");
        assert_eq!(site.og_image(), "https://cms.test/cover.jpg");
        assert_eq!(site.twitter_image(), "https://cms.test/tw.jpg");
        assert_eq!(site.view().navigation.len(), 1);
        assert_eq!(site.view().lang, "en");
    }

    #[tokio::test]
    async fn test_store_falls_back_when_cms_down() {
        let config = Arc::new(config());
        let api = Arc::new(ContentApi::with_source(
            config.clone(),
            Arc::new(MemorySource::failing()),
        ));
        let store = SettingsStore::new(api, config);
        let site = store.current().await;
        assert_eq!(site.site_title(), "My Blog");
        assert!(site.raw().is_none());
    }

    #[tokio::test]
    async fn test_store_caches_settings() {
        let config = Arc::new(config());
        let source = MemorySource::new().with_settings(Settings {
            title: Some("Cached".into()),
            ..Default::default()
        });
        let api = Arc::new(ContentApi::with_source(config.clone(), Arc::new(source)));
        let store = SettingsStore::new(api, config);

        assert_eq!(store.current().await.site_title(), "Cached");
        assert!(store.cache.get().await.is_some());
        store.refresh().await;
        assert!(store.cache.get().await.is_none());
    }
}
