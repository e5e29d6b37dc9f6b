//! Site configuration (ghost-front.yml + environment)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Ghost Content API
    pub ghost_url: String,
    pub content_api_key: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
    pub posts_limit: u32,

    // Site
    pub url: String,
    pub default_title: String,
    pub default_description: String,
    pub settings_ttl_secs: u64,

    // Static export
    pub public_dir: String,

    // Image optimization
    #[serde(default)]
    pub images: ImageConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            ghost_url: String::new(),
            content_api_key: String::new(),
            api_version: "v5.0".to_string(),
            request_timeout_secs: 10,
            posts_limit: 100,

            url: "http://localhost:3000".to_string(),
            default_title: "My Blog".to_string(),
            default_description: "A blog powered by Ghost".to_string(),
            settings_ttl_secs: 300,

            public_dir: "public".to_string(),

            images: ImageConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {:?}", path);
                Self::load(path)?
            }
            Some(path) => {
                tracing::debug!("No config at {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("GHOST_URL") {
            self.ghost_url = url;
        }
        if let Some(key) = non_empty("GHOST_CONTENT_API_KEY") {
            self.content_api_key = key;
        }
        if let Some(url) = non_empty("SITE_URL") {
            self.url = url;
        }
    }
}

/// Which image optimization service rewritten `<img>` sources point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProviderKind {
    /// IPX-style endpoint: `{base_url}/w_1200&q_80&f_webp/{src}`
    Ipx,
    /// Ghost's built-in `/content/images/size/...` resizer
    Ghost,
    /// Keep the original URL
    None,
}

/// Image optimization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub provider: ImageProviderKind,
    pub base_url: String,
    pub default_width: u32,
    pub max_width: u32,
    pub quality: u32,
    pub format: String,
    /// Hosts allowed for optimization; empty allows every host
    #[serde(default)]
    pub domains: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: ImageProviderKind::Ipx,
            base_url: "/_ipx".to_string(),
            default_width: 1200,
            max_width: 2000,
            quality: 80,
            format: "webp".to_string(),
            domains: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.api_version, "v5.0");
        assert_eq!(config.posts_limit, 100);
        assert_eq!(config.images.default_width, 1200);
        assert_eq!(config.images.max_width, 2000);
        assert_eq!(config.images.quality, 80);
        assert_eq!(config.images.provider, ImageProviderKind::Ipx);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
ghost_url: https://cms.example.com
content_api_key: abc123
default_title: Field Notes
images:
  provider: ghost
  domains:
    - cms.example.com
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ghost_url, "https://cms.example.com");
        assert_eq!(config.content_api_key, "abc123");
        assert_eq!(config.default_title, "Field Notes");
        assert_eq!(config.images.provider, ImageProviderKind::Ghost);
        assert_eq!(config.images.domains, vec!["cms.example.com"]);
        // untouched fields keep their defaults
        assert_eq!(config.images.quality, 80);
        assert_eq!(config.settings_ttl_secs, 300);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GHOST_URL", "https://ghost.test"),
            ("GHOST_CONTENT_API_KEY", "k"),
            ("SITE_URL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.ghost_url, "https://ghost.test");
        assert_eq!(config.content_api_key, "k");
        // blank values do not override
        assert_eq!(config.url, "http://localhost:3000");
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghost-front.yml");
        fs::write(&path, "url: https://blog.example.com\nposts_limit: 20\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.url, "https://blog.example.com");
        assert_eq!(config.posts_limit, 20);
    }
}
