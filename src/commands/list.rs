//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::ghost::{BrowseOptions, Limit, Tag};
use crate::GhostFront;

/// List CMS content by type
///
/// Unlike the page views this reports CMS errors instead of hiding them.
pub async fn run(site: &GhostFront, content_type: &str) -> Result<String> {
    let source = site.api.source()?;
    let all = BrowseOptions::new().limit(Limit::All);
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            let posts = source.browse_posts(&all.clone().order("published_at desc")).await?;
            writeln!(out, "Posts ({}):", posts.len())?;
            for post in posts {
                let date = post
                    .published_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "draft".to_string());
                writeln!(out, "  {} - {} [/posts/{}]", date, post.title, post.slug)?;
            }
        }
        "page" | "pages" => {
            let pages = source.browse_pages(&all).await?;
            writeln!(out, "Pages ({}):", pages.len())?;
            for page in pages {
                writeln!(out, "  {} [/page/{}]", page.title, page.slug)?;
            }
        }
        "tag" | "tags" => {
            let mut tags = source.browse_tags(&all.clone().include("count.posts")).await?;
            tags.sort_by_key(|t| std::cmp::Reverse(post_count(t)));
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                writeln!(out, "  {} ({})", tag.name, post_count(&tag))?;
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, page, tag", content_type);
        }
    }

    Ok(out)
}

fn post_count(tag: &Tag) -> u32 {
    tag.count.as_ref().map_or(0, |c| c.posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::ghost::testing::{sample_tag, MemorySource};
    use crate::ghost::model::TagCount;
    use std::sync::Arc;

    fn site(source: MemorySource) -> GhostFront {
        GhostFront::with_source(SiteConfig::default(), Arc::new(source))
    }

    #[tokio::test]
    async fn test_list_posts() {
        let source = MemorySource::new().with_post("hello", "Hello", "");
        let out = run(&site(source), "posts").await.unwrap();
        assert_eq!(out, "Posts (1):\n  2024-05-01 - Hello [/posts/hello]\n");
    }

    #[tokio::test]
    async fn test_list_tags_by_count() {
        let mut source = MemorySource::new();
        for (slug, posts) in [("few", 1), ("many", 5)] {
            let mut tag = sample_tag(slug);
            tag.count = Some(TagCount { posts });
            source.tags.push(tag);
        }
        let out = run(&site(source), "tag").await.unwrap();
        assert_eq!(out, "Tags (2):\n  many (5)\n  few (1)\n");
    }

    #[tokio::test]
    async fn test_errors_are_reported() {
        assert!(run(&site(MemorySource::failing()), "posts").await.is_err());
        assert!(run(&site(MemorySource::new()), "category").await.is_err());
    }
}
