//! `<img>` rewriting for CMS-authored HTML
//!
//! Every image source is routed through the configured optimization
//! provider at a width derived from the tag itself. Responsive hints are
//! dropped in favour of the single optimized URL, and lazy loading is
//! switched on.
//!
//! Only `<img>` tags are touched; the rest of the fragment is copied through
//! byte-for-byte. Comments and `<script>`/`<style>` bodies are skipped.

use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use thiserror::Error;

use crate::config::{ImageConfig, ImageProviderKind};
use crate::helpers::{attr_escape, host_of, html_unescape};

lazy_static! {
    /// Things the scanner has to stop at
    static ref TAG_START: Regex = Regex::new(r"(?i)<!--|<script\b|<style\b|<img\b").unwrap();
    static ref STYLE_WIDTH: Regex = Regex::new(r"width:\s*(\d+)px").unwrap();
    static ref SCRIPT_END: Regex = Regex::new(r"(?i)</script\s*>").unwrap();
    static ref STYLE_END: Regex = Regex::new(r"(?i)</style\s*>").unwrap();
}

/// Characters escaped when a source URL is embedded in a provider path
const PATH_UNSAFE: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Why a single image could not be rewritten
#[derive(Error, Debug, PartialEq)]
pub enum ImageError {
    #[error("inline data URIs cannot be optimized")]
    DataUri,

    #[error("host {0} is not in the image domain allow-list")]
    DomainNotAllowed(String),

    #[error("provider cannot handle {0}")]
    Unsupported(String),
}

/// Why a fragment could not be parsed at all
#[derive(Error, Debug, PartialEq)]
pub enum HtmlError {
    #[error("unterminated <img> tag at byte {0}")]
    UnterminatedTag(usize),

    #[error("unterminated attribute value at byte {0}")]
    UnterminatedQuote(usize),
}

/// Parameters passed to an image provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub width: u32,
    pub quality: u32,
    pub format: String,
}

/// Turns an image source into an optimized-image URL
pub trait ImageProvider: Send + Sync {
    fn url(&self, src: &str, options: &ImageOptions) -> Result<String, ImageError>;
}

/// IPX-style endpoint: `{base}/w_{w}&q_{q}&f_{f}/{src}`
pub struct IpxProvider {
    base_url: String,
}

impl IpxProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ImageProvider for IpxProvider {
    fn url(&self, src: &str, options: &ImageOptions) -> Result<String, ImageError> {
        let modifiers = format!(
            "w_{}&q_{}&f_{}",
            options.width, options.quality, options.format
        );
        let src = if let Some(rest) = src.strip_prefix("//") {
            format!("https://{}", rest)
        } else if src.starts_with("http://") || src.starts_with("https://") {
            src.to_string()
        } else {
            src.trim_start_matches('/').to_string()
        };
        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            modifiers,
            utf8_percent_encode(&src, PATH_UNSAFE)
        ))
    }
}

/// Ghost's built-in resizer for images it hosts itself
pub struct GhostProvider;

impl ImageProvider for GhostProvider {
    fn url(&self, src: &str, options: &ImageOptions) -> Result<String, ImageError> {
        const MARKER: &str = "/content/images/";

        let pos = src
            .find(MARKER)
            .ok_or_else(|| ImageError::Unsupported(src.to_string()))?;
        let (prefix, rest) = src.split_at(pos + MARKER.len());

        // a source that is already a sized variant is re-sized from its original
        let rest = strip_size_segments(rest);

        let path_only = rest.split(['?', '#']).next().unwrap_or(rest);
        if path_only.to_ascii_lowercase().ends_with(".svg") {
            return Err(ImageError::Unsupported(src.to_string()));
        }

        Ok(format!(
            "{}size/w{}/format/{}/{}",
            prefix, options.width, options.format, rest
        ))
    }
}

/// Drop a leading `size/wN/` and an optional `format/x/` from a Ghost image path
fn strip_size_segments(path: &str) -> &str {
    let mut rest = path;
    if let Some(after) = rest.strip_prefix("size/") {
        if let Some((_, tail)) = after.split_once('/') {
            rest = tail;
        }
        if let Some(after) = rest.strip_prefix("format/") {
            if let Some((_, tail)) = after.split_once('/') {
                rest = tail;
            }
        }
    }
    rest
}

/// Keeps the original URL
pub struct PassthroughProvider;

impl ImageProvider for PassthroughProvider {
    fn url(&self, src: &str, _options: &ImageOptions) -> Result<String, ImageError> {
        Ok(src.to_string())
    }
}

/// Rewrites every `<img>` in an HTML fragment
pub struct ImageProcessor {
    provider: Box<dyn ImageProvider>,
    default_width: u32,
    max_width: u32,
    quality: u32,
    format: String,
    domains: Vec<String>,
}

impl ImageProcessor {
    /// Create a processor for the configured provider
    pub fn from_config(config: &ImageConfig) -> Self {
        let provider: Box<dyn ImageProvider> = match config.provider {
            ImageProviderKind::Ipx => Box::new(IpxProvider::new(&config.base_url)),
            ImageProviderKind::Ghost => Box::new(GhostProvider),
            ImageProviderKind::None => Box::new(PassthroughProvider),
        };
        Self::with_provider(config, provider)
    }

    /// Create a processor around a custom provider
    pub fn with_provider(config: &ImageConfig, provider: Box<dyn ImageProvider>) -> Self {
        Self {
            provider,
            default_width: config.default_width,
            max_width: config.max_width,
            quality: config.quality,
            format: config.format.clone(),
            domains: config
                .domains
                .iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Rewrite all images in `html`.
    ///
    /// Returns the input unchanged if it cannot be parsed.
    pub fn process_html(&self, html: &str) -> String {
        if html.is_empty() {
            return String::new();
        }

        match self.rewrite(html) {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!("Error processing HTML: {}", e);
                html.to_string()
            }
        }
    }

    /// Width to request: explicit attribute, then inline style, else the default; capped
    pub fn target_width(&self, width_attr: Option<&str>, style: Option<&str>) -> u32 {
        let width = width_attr
            .and_then(parse_leading_int)
            .filter(|w| *w > 0)
            .or_else(|| {
                style
                    .and_then(|s| STYLE_WIDTH.captures(s))
                    .and_then(|caps| parse_leading_int(&caps[1]))
                    .filter(|w| *w > 0)
            });

        match width {
            Some(w) => w.min(self.max_width as u64) as u32,
            None => self.default_width,
        }
    }

    /// Optimized URL for one image
    pub fn image_url(&self, src: &str, width: u32) -> Result<String, ImageError> {
        if src.trim_start().to_ascii_lowercase().starts_with("data:") {
            return Err(ImageError::DataUri);
        }

        if !self.domains.is_empty() {
            if let Some(host) = host_of(src) {
                let host = host.to_ascii_lowercase();
                if !self.domains.iter().any(|d| *d == host) {
                    return Err(ImageError::DomainNotAllowed(host));
                }
            }
        }

        let options = ImageOptions {
            width,
            quality: self.quality,
            format: self.format.clone(),
        };
        self.provider.url(src, &options)
    }

    fn rewrite(&self, html: &str) -> Result<String, HtmlError> {
        let mut out = String::with_capacity(html.len() + html.len() / 8);
        let mut cursor = 0;

        while let Some(m) = TAG_START.find_at(html, cursor) {
            let token = m.as_str().to_ascii_lowercase();

            let skip_to = match token.as_str() {
                "<!--" => Some(
                    html[m.end()..]
                        .find("-->")
                        .map(|i| m.end() + i + 3)
                        .unwrap_or(html.len()),
                ),
                "<script" => Some(raw_text_end(html, m.end(), &SCRIPT_END)),
                "<style" => Some(raw_text_end(html, m.end(), &STYLE_END)),
                _ => None,
            };

            if let Some(end) = skip_to {
                out.push_str(&html[cursor..end]);
                cursor = end;
                continue;
            }

            let tag = parse_img_tag(html, m.start())?;
            out.push_str(&html[cursor..tag.start]);
            out.push_str(&self.rewrite_tag(html, &tag));
            cursor = tag.end;
        }

        out.push_str(&html[cursor..]);
        Ok(out)
    }

    fn rewrite_tag(&self, html: &str, tag: &ImgTag) -> String {
        let original = &html[tag.start..tag.end];

        let src = match tag.get("src").map(str::trim).filter(|s| !s.is_empty()) {
            Some(src) => src,
            None => return original.to_string(),
        };

        let width = self.target_width(tag.get("width"), tag.get("style"));
        let optimized = match self.image_url(src, width) {
            Ok(url) => url,
            Err(e @ ImageError::DomainNotAllowed(_)) => {
                tracing::debug!("Skipping image {}: {}", src, e);
                return original.to_string();
            }
            Err(e) => {
                tracing::warn!("Failed to optimize image {}: {}", src, e);
                return original.to_string();
            }
        };

        let mut rebuilt = String::from("<img");
        let mut src_written = false;
        let mut has_loading = false;

        for attr in &tag.attrs {
            match attr.name.as_str() {
                "srcset" | "sizes" => continue,
                "src" if !src_written => {
                    rebuilt.push_str(&format!(r#" src="{}""#, attr_escape(&optimized)));
                    src_written = true;
                }
                "loading" if attr.value.as_deref().map_or(true, |v| v.trim().is_empty()) => {
                    rebuilt.push_str(r#" loading="lazy""#);
                    has_loading = true;
                }
                name => {
                    if name == "loading" {
                        has_loading = true;
                    }
                    rebuilt.push(' ');
                    rebuilt.push_str(attr.raw);
                }
            }
        }

        if !has_loading {
            rebuilt.push_str(r#" loading="lazy""#);
        }
        if tag.self_closing {
            rebuilt.push_str(" /");
        }
        rebuilt.push('>');
        rebuilt
    }
}

/// Leading decimal digits, like `parseInt` (`"800px"` is 800); saturates on overflow
fn parse_leading_int(s: &str) -> Option<u64> {
    let digits: &str = {
        let s = s.trim_start();
        let end = s
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        &s[..end]
    };
    if digits.is_empty() {
        return None;
    }
    Some(digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add((b - b'0') as u64)
    }))
}

/// End of a raw-text element body, or the end of input when it is never closed
fn raw_text_end(html: &str, from: usize, closer: &Regex) -> usize {
    closer
        .find_at(html, from)
        .map(|m| m.end())
        .unwrap_or(html.len())
}

struct Attr<'a> {
    /// Lowercased attribute name
    name: String,
    /// Source text of the whole attribute, as written
    raw: &'a str,
    /// Entity-decoded value, `None` for bare attributes
    value: Option<String>,
}

struct ImgTag<'a> {
    start: usize,
    end: usize,
    attrs: Vec<Attr<'a>>,
    self_closing: bool,
}

impl ImgTag<'_> {
    fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }
}

/// Parse the `<img ...>` tag starting at `start`
fn parse_img_tag(html: &str, start: usize) -> Result<ImgTag<'_>, HtmlError> {
    let bytes = html.as_bytes();
    let mut pos = start + "<img".len();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(HtmlError::UnterminatedTag(start));
        }

        match bytes[pos] {
            b'>' => {
                return Ok(ImgTag {
                    start,
                    end: pos + 1,
                    attrs,
                    self_closing,
                });
            }
            b'/' => {
                self_closing = true;
                pos += 1;
                continue;
            }
            _ => {}
        }
        self_closing = false;

        let name_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'>' | b'/')
        {
            pos += 1;
        }
        let name = html[name_start..pos].to_ascii_lowercase();

        let mut look = pos;
        while look < bytes.len() && bytes[look].is_ascii_whitespace() {
            look += 1;
        }

        let mut value = None;
        if look < bytes.len() && bytes[look] == b'=' {
            pos = look + 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= bytes.len() {
                return Err(HtmlError::UnterminatedTag(start));
            }

            match bytes[pos] {
                quote @ (b'"' | b'\'') => {
                    let value_start = pos + 1;
                    let close = html[value_start..]
                        .find(quote as char)
                        .ok_or(HtmlError::UnterminatedQuote(pos))?;
                    value = Some(html_unescape(&html[value_start..value_start + close]));
                    pos = value_start + close + 1;
                }
                _ => {
                    let value_start = pos;
                    while pos < bytes.len()
                        && !bytes[pos].is_ascii_whitespace()
                        && bytes[pos] != b'>'
                    {
                        pos += 1;
                    }
                    value = Some(html_unescape(&html[value_start..pos]));
                }
            }
        }

        attrs.push(Attr {
            name,
            raw: &html[name_start..pos],
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> ImageProcessor {
        ImageProcessor::from_config(&ImageConfig::default())
    }

    fn processor_with(provider: ImageProviderKind, domains: &[&str]) -> ImageProcessor {
        ImageProcessor::from_config(&ImageConfig {
            provider,
            domains: domains.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_default_width_and_lazy() {
        let out = processor().process_html(r#"<p><img src="https://cms.test/a.jpg" alt="A"></p>"#);
        assert_eq!(
            out,
            r#"<p><img src="/_ipx/w_1200&amp;q_80&amp;f_webp/https://cms.test/a.jpg" alt="A" loading="lazy"></p>"#
        );
    }

    #[test]
    fn test_width_capped() {
        let out = processor().process_html(r#"<img src="/a.jpg" width="3000">"#);
        assert!(out.contains("w_2000&amp;"), "{}", out);
        assert!(out.contains(r#"width="3000""#));
    }

    #[test]
    fn test_width_attribute_used() {
        let out = processor().process_html(r#"<img src="/a.jpg" width="800px" height="600">"#);
        assert!(out.contains("/_ipx/w_800&amp;q_80&amp;f_webp/a.jpg"), "{}", out);
    }

    #[test]
    fn test_width_from_style() {
        let p = processor();
        assert_eq!(p.target_width(None, Some("border: 0; width: 640px")), 640);
        assert_eq!(p.target_width(None, Some("width:4000px")), 2000);
        assert_eq!(p.target_width(None, Some("width: 50%")), 1200);
        // attribute wins over style
        assert_eq!(p.target_width(Some("300"), Some("width: 640px")), 300);
        // zero and garbage count as absent
        assert_eq!(p.target_width(Some("0"), None), 1200);
        assert_eq!(p.target_width(Some("auto"), Some("width: 720px")), 720);
        assert_eq!(p.target_width(Some("99999999999999999999999"), None), 2000);
    }

    #[test]
    fn test_responsive_hints_removed() {
        let html = r#"<img src="/content/images/a.jpg" srcset="/a-600.jpg 600w, /a-1000.jpg 1000w" sizes="(min-width: 720px) 720px" loading="eager">"#;
        let out = processor().process_html(html);
        assert!(!out.contains("srcset"));
        assert!(!out.contains("sizes"));
        assert!(out.contains(r#"loading="eager""#));
        assert!(!out.contains("lazy"));
    }

    #[test]
    fn test_empty_loading_replaced() {
        let out = processor().process_html(r#"<img src="/a.jpg" loading="">"#);
        assert_eq!(out, r#"<img src="/_ipx/w_1200&amp;q_80&amp;f_webp/a.jpg" loading="lazy">"#);
    }

    #[test]
    fn test_malformed_html_unchanged() {
        let p = processor();
        let unterminated = r#"<p>text</p><img src="/a.jpg" alt="x"#;
        assert_eq!(p.process_html(unterminated), unterminated);

        let open_quote = r#"<img src="/a.jpg alt=x> <p>more</p>"#;
        assert_eq!(p.process_html(open_quote), open_quote);

        // one bad tag spoils the whole fragment, including earlier good images
        let mixed = r#"<img src="/ok.jpg"><img src='/bad.jpg"#;
        assert_eq!(p.process_html(mixed), mixed);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(processor().process_html(""), "");
    }

    #[test]
    fn test_failed_image_left_alone() {
        let html = concat!(
            r#"<img src="data:image/png;base64,AAAA" srcset="x 1w">"#,
            r#"<img src="/b.jpg">"#
        );
        let out = processor().process_html(html);
        assert!(out.starts_with(r#"<img src="data:image/png;base64,AAAA" srcset="x 1w">"#));
        assert!(out.contains("/_ipx/w_1200&amp;q_80&amp;f_webp/b.jpg"));
    }

    #[test]
    fn test_img_without_src_untouched() {
        let html = r#"<img alt="placeholder"><img src="">"#;
        assert_eq!(processor().process_html(html), html);
    }

    #[test]
    fn test_self_closing_and_case() {
        let out = processor().process_html(r#"<IMG SRC="/a.jpg" Alt="A"/>"#);
        assert_eq!(
            out,
            r#"<img src="/_ipx/w_1200&amp;q_80&amp;f_webp/a.jpg" Alt="A" loading="lazy" />"#
        );
    }

    #[test]
    fn test_unquoted_and_bare_attributes() {
        let out = processor().process_html("<img src=/a.jpg width=500 decoding=async hidden>");
        assert_eq!(
            out,
            r#"<img src="/_ipx/w_500&amp;q_80&amp;f_webp/a.jpg" width=500 decoding=async hidden loading="lazy">"#
        );
    }

    #[test]
    fn test_entities_in_src() {
        let out = processor().process_html(r#"<img src="https://cdn.test/a.jpg?v=1&amp;x=2">"#);
        assert!(out.contains("https://cdn.test/a.jpg?v=1&amp;x=2\""), "{}", out);
    }

    #[test]
    fn test_comments_and_scripts_skipped() {
        let html = concat!(
            "<!-- <img src=\"/c.jpg\"> -->",
            "<script>document.write('<img src=\"/s.jpg\"')</script>",
            "<img src=\"/real.jpg\">"
        );
        let out = processor().process_html(html);
        assert!(out.starts_with("<!-- <img src=\"/c.jpg\"> --><script>document.write('<img src=\"/s.jpg\"')</script>"));
        assert!(out.contains("w_1200&amp;q_80&amp;f_webp/real.jpg"));
    }

    #[test]
    fn test_non_img_tags_preserved() {
        let html = "<figure class=\"kg-card\"><imgx src=\"/a.jpg\"><figcaption>Caption &amp; more</figcaption></figure>";
        assert_eq!(processor().process_html(html), html);
    }

    #[test]
    fn test_domain_allow_list() {
        let p = processor_with(ImageProviderKind::Ipx, &["cms.test"]);
        let out = p.process_html(r#"<img src="https://other.test/a.jpg"><img src="https://CMS.test/b.jpg"><img src="/c.jpg">"#);
        assert!(out.starts_with(r#"<img src="https://other.test/a.jpg">"#));
        assert!(out.contains("f_webp/https://CMS.test/b.jpg"));
        assert!(out.contains("f_webp/c.jpg"));
    }

    #[test]
    fn test_ghost_provider() {
        let p = processor_with(ImageProviderKind::Ghost, &[]);
        let out = p.process_html(r#"<img src="https://cms.test/content/images/2024/05/a.jpg" width="600">"#);
        assert!(out.contains(r#"src="https://cms.test/content/images/size/w600/format/webp/2024/05/a.jpg""#), "{}", out);

        let resized = p.image_url("https://cms.test/content/images/size/w300/format/avif/2024/05/a.jpg", 1200).unwrap();
        assert_eq!(resized, "https://cms.test/content/images/size/w1200/format/webp/2024/05/a.jpg");

        assert!(matches!(p.image_url("https://elsewhere.test/a.jpg", 1200), Err(ImageError::Unsupported(_))));
        assert!(matches!(p.image_url("/content/images/logo.svg", 1200), Err(ImageError::Unsupported(_))));
    }

    #[test]
    fn test_passthrough_provider_still_cleans_up() {
        let p = processor_with(ImageProviderKind::None, &[]);
        let out = p.process_html(r#"<img src="/a.jpg" sizes="100vw">"#);
        assert_eq!(out, r#"<img src="/a.jpg" loading="lazy">"#);
    }

    #[test]
    fn test_ipx_escapes_unsafe_characters() {
        let provider = IpxProvider::new("/_ipx/");
        let options = ImageOptions {
            width: 100,
            quality: 80,
            format: "webp".into(),
        };
        assert_eq!(
            provider.url("//cdn.test/my photo.jpg", &options).unwrap(),
            "/_ipx/w_100&q_80&f_webp/https://cdn.test/my%20photo.jpg"
        );
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("  42px"), Some(42));
        assert_eq!(parse_leading_int("px"), None);
        assert_eq!(parse_leading_int(""), None);
    }
}
