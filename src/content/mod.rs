//! Content module - post-processing of CMS-authored HTML

pub mod cards;
pub mod images;

pub use images::{ImageError, ImageOptions, ImageProcessor, ImageProvider};

use crate::config::ImageConfig;

/// HTML ready to be placed in a template
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedHtml {
    pub html: String,
    /// The page needs the toggle card script
    pub has_toggle_cards: bool,
}

/// Runs every transformation a post body goes through before rendering
pub struct HtmlProcessor {
    images: ImageProcessor,
}

impl HtmlProcessor {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            images: ImageProcessor::from_config(config),
        }
    }

    pub fn images(&self) -> &ImageProcessor {
        &self.images
    }

    pub fn process(&self, html: &str) -> ProcessedHtml {
        let html = self.images.process_html(html);
        let has_toggle_cards = cards::has_toggle_cards(&html);
        let html = if has_toggle_cards {
            cards::normalize_toggle_cards(&html)
        } else {
            html
        };
        ProcessedHtml {
            html,
            has_toggle_cards,
        }
    }
}
