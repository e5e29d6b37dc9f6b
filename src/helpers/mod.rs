//! Helper functions shared by templates, the sitemap and the HTML processor

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
