//! ghost-front: a server-rendered blog front end for the Ghost Content API
//!
//! Content is fetched from a Ghost instance on every request, post HTML is
//! rewritten to serve optimized images, and pages are rendered with an
//! embedded Tera theme. The same renderer can export the site to static files.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod ghost;
pub mod helpers;
pub mod server;
pub mod settings;
pub mod sitemap;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct GhostFront {
    /// Site configuration
    pub config: Arc<config::SiteConfig>,
    /// Lazily connected Content API wrapper
    pub api: Arc<ghost::ContentApi>,
    /// Cached site settings
    pub settings: Arc<settings::SettingsStore>,
    /// Post HTML processor
    pub html: Arc<content::HtmlProcessor>,
    /// Output directory for `generate`
    pub public_dir: PathBuf,
}

impl GhostFront {
    /// Load configuration from `base_dir` and the environment
    pub fn new<P: AsRef<Path>>(base_dir: P, config_path: Option<&Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config = match config_path {
            // an explicit path must exist
            Some(path) => {
                let mut config = config::SiteConfig::load(base_dir.join(path))?;
                config.apply_env(|key| std::env::var(key).ok());
                config
            }
            None => config::SiteConfig::resolve(Some(base_dir.join("ghost-front.yml").as_path()))?,
        };
        let public_dir = base_dir.join(&config.public_dir);

        let config = Arc::new(config);
        let api = Arc::new(ghost::ContentApi::new(config.clone()));
        Ok(Self::assemble(config, api, public_dir))
    }

    /// Build the app around an existing content source
    pub fn with_source(config: config::SiteConfig, source: Arc<dyn ghost::ContentSource>) -> Self {
        let public_dir = PathBuf::from(&config.public_dir);
        let config = Arc::new(config);
        let api = Arc::new(ghost::ContentApi::with_source(config.clone(), source));
        Self::assemble(config, api, public_dir)
    }

    fn assemble(
        config: Arc<config::SiteConfig>,
        api: Arc<ghost::ContentApi>,
        public_dir: PathBuf,
    ) -> Self {
        let settings = Arc::new(settings::SettingsStore::new(api.clone(), config.clone()));
        let html = Arc::new(content::HtmlProcessor::new(&config.images));
        Self {
            config,
            api,
            settings,
            html,
            public_dir,
        }
    }
}
