//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape a value for use inside a double-quoted attribute
pub fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Decode the character references Ghost emits inside attribute values
pub fn html_unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            decode_entity(entity).map(|c| (c, end + 1))
        });

        match decoded {
            Some((c, len)) => {
                result.push(c);
                rest = &rest[len..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Strip HTML tags from a string
pub fn strip_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Truncate a string to a specified length
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s
            .chars()
            .take(length.saturating_sub(omission.chars().count()))
            .collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}

/// Generate Open Graph and Twitter card meta tags
pub fn social_meta(
    title: &str,
    description: &str,
    url: &str,
    og_image: Option<&str>,
    twitter_image: Option<&str>,
    site_name: &str,
) -> String {
    let mut tags = vec![
        r#"<meta property="og:type" content="website">"#.to_string(),
        format!(
            r#"<meta property="og:title" content="{}">"#,
            html_escape(title)
        ),
        format!(r#"<meta property="og:url" content="{}">"#, attr_escape(url)),
        format!(
            r#"<meta property="og:site_name" content="{}">"#,
            html_escape(site_name)
        ),
        format!(
            r#"<meta name="twitter:title" content="{}">"#,
            html_escape(title)
        ),
    ];

    if !description.is_empty() {
        tags.push(format!(
            r#"<meta property="og:description" content="{}">"#,
            html_escape(description)
        ));
        tags.push(format!(
            r#"<meta name="twitter:description" content="{}">"#,
            html_escape(description)
        ));
    }

    if let Some(img) = og_image.filter(|s| !s.is_empty()) {
        tags.push(format!(
            r#"<meta property="og:image" content="{}">"#,
            attr_escape(img)
        ));
    }

    match twitter_image.filter(|s| !s.is_empty()) {
        Some(img) => {
            tags.push(r#"<meta name="twitter:card" content="summary_large_image">"#.to_string());
            tags.push(format!(
                r#"<meta name="twitter:image" content="{}">"#,
                attr_escape(img)
            ));
        }
        None => tags.push(r#"<meta name="twitter:card" content="summary">"#.to_string()),
    }

    tags.join("\n")
}

/// Generate meta generator tag
pub fn meta_generator() -> String {
    format!(
        r#"<meta name="generator" content="ghost-front {}">"#,
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>World</b></p>"), "Hello World");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello World", 8, None), "Hello...");
        assert_eq!(truncate("Hi", 10, None), "Hi");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(html_unescape("a.jpg?w=1&amp;h=2"), "a.jpg?w=1&h=2");
        assert_eq!(html_unescape("&#39;x&#x27;"), "'x'");
        assert_eq!(html_unescape("fish & chips"), "fish & chips");
        assert_eq!(html_unescape("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_attr_escape() {
        assert_eq!(attr_escape(r#"/_ipx/w_1&q_2/"x""#), "/_ipx/w_1&amp;q_2/&quot;x&quot;");
    }

    #[test]
    fn test_social_meta() {
        let meta = social_meta("Post & More", "", "https://x.test/p", None, Some("https://x.test/t.png"), "Site");
        assert!(meta.contains("Post &amp; More"));
        assert!(!meta.contains("og:description"));
        assert!(!meta.contains("og:image"));
        assert!(meta.contains("summary_large_image"));
    }
}
