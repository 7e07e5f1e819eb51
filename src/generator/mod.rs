//! Generator module - renders pages with the built-in Tera templates
//!
//! The same renderer serves `generate` (pages written to the public dir)
//! and the server (pages rendered on demand).

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use tera::Context;

use crate::cms::ContentSource;
use crate::comments::CommentWidget;
use crate::content::{PostDetail, PostSummary};
use crate::helpers::{is_path_safe_uid, meta_generator, DateFormatter};
use crate::listing::{paths_query, ListingFeed};
use crate::templates::{ConfigData, PostItem, PostView, TemplateRenderer};
use crate::Site;

/// Seconds before the loading page asks for the post again
const LOADING_REFRESH_SECONDS: u64 = 1;

/// Static page generator
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
    dates: DateFormatter,
}

/// What a `generate` run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub listed: usize,
    pub has_more: bool,
    pub posts: Vec<String>,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let dates = DateFormatter::new(&site.config.dates)?;

        Ok(Self {
            site: site.clone(),
            renderer,
            dates,
        })
    }

    /// Fetch the listing and the pre-generated posts and write them out
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<GenerateReport> {
        fs::create_dir_all(&self.site.public_dir)?;

        let feed = ListingFeed::initial(source, &self.site.config, None).await?;
        let html = self.render_index(&feed, false)?;
        self.write_index(&html)?;

        let mut report = GenerateReport {
            listed: feed.posts().len(),
            has_more: feed.has_more(),
            posts: Vec::new(),
        };

        let paths = source.query(&paths_query(&self.site.config)).await?;
        for doc in &paths.results {
            let post = PostDetail::from_document(doc);
            let html = self.render_post(&post, false)?;
            if self.write_post(&post.uid, &html)?.is_some() {
                report.posts.push(post.uid);
            }
        }

        self.write_not_found()?;

        tracing::info!(
            "Generated listing ({} posts) and {} post pages",
            report.listed,
            report.posts.len()
        );
        Ok(report)
    }

    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert(
            "config",
            &ConfigData {
                title: self.site.config.title.clone(),
                language: self.site.config.language.clone(),
            },
        );
        context.insert("generator", &meta_generator());
        context
    }

    /// Listing entry for a summary
    pub fn post_item(&self, post: &PostSummary) -> PostItem {
        PostItem::new(post, &self.dates)
    }

    /// Render the home page
    pub fn render_index(&self, feed: &ListingFeed, preview: bool) -> Result<String> {
        let posts: Vec<PostItem> = feed.posts().iter().map(|p| self.post_item(p)).collect();

        let mut context = self.create_base_context();
        context.insert("posts", &posts);
        context.insert("next_page", &feed.next_page());
        context.insert("load_more_endpoint", "/api/posts");
        context.insert("preview", &preview);

        self.renderer.render("index.html", &context)
    }

    /// Render a post page with its comment widget
    pub fn render_post(&self, post: &PostDetail, preview: bool) -> Result<String> {
        let view = PostView::new(post, &self.dates, self.site.config.reading.words_per_minute);
        let mut widget = CommentWidget::new(&self.site.config.comments);

        let mut context = self.create_base_context();
        context.insert("post", &view);
        context.insert("comment_script", &widget.attach());
        context.insert("preview", &preview);

        self.renderer.render("post.html", &context)
    }

    /// Provisional page shown while a post is looked up
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("refresh_seconds", &LOADING_REFRESH_SECONDS);
        self.renderer.render("loading.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("not_found.html", &self.create_base_context())
    }

    /// Output path of a post page, `None` for uids unusable as a path
    pub fn post_output_path(&self, uid: &str) -> Option<PathBuf> {
        if !is_path_safe_uid(uid) {
            return None;
        }
        Some(
            self.site
                .public_dir
                .join("post")
                .join(uid)
                .join("index.html"),
        )
    }

    pub fn write_index(&self, html: &str) -> Result<PathBuf> {
        let output_path = self.site.public_dir.join("index.html");
        write_file(&output_path, html)?;
        Ok(output_path)
    }

    /// Write a post page; skipped with a warning when the uid is not a slug
    pub fn write_post(&self, uid: &str, html: &str) -> Result<Option<PathBuf>> {
        let Some(output_path) = self.post_output_path(uid) else {
            tracing::warn!("Not writing post with unsafe uid {:?}", uid);
            return Ok(None);
        };
        write_file(&output_path, html)?;
        Ok(Some(output_path))
    }

    pub fn write_not_found(&self) -> Result<PathBuf> {
        let output_path = self.site.public_dir.join("404.html");
        write_file(&output_path, &self.render_not_found()?)?;
        Ok(output_path)
    }
}

fn write_file(output_path: &std::path::Path, html: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(output_path, html)
        .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
    tracing::debug!("Generated: {:?}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{doc, page, MemorySource};
    use crate::content::RichField;
    use serde_json::json;
    use tempfile::TempDir;

    fn site(dir: &TempDir) -> Site {
        Site::new(dir.path()).unwrap()
    }

    #[test]
    fn test_index_with_more_pages() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&site(&dir)).unwrap();
        let feed = ListingFeed::from_response(page(Some("https://x.io/p2"), vec![doc("a", "Post A")]));

        let html = generator.render_index(&feed, false).unwrap();
        assert!(html.contains(r#"data-uid="a""#));
        assert!(html.contains("Post A"));
        assert!(html.contains("25  mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("fetch('/api/posts?next_page="));
        assert!(!html.contains("Sair do modo Preview"));
    }

    #[test]
    fn test_index_last_page_has_no_button() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&site(&dir)).unwrap();
        let feed = ListingFeed::from_response(page(None, vec![doc("a", "Post A")]));

        let html = generator.render_index(&feed, true).unwrap();
        assert!(!html.contains("Carregar mais posts"));
        assert!(html.contains("/api/exit-preview"));
    }

    #[test]
    fn test_post_page() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&site(&dir)).unwrap();
        let mut raw = doc("hooks", "Como utilizar Hooks");
        raw.data.content = serde_json::from_value(json!([
            { "heading": "Intro", "body": [{ "type": "paragraph", "text": "Olá <mundo>", "spans": [] }] }
        ]))
        .unwrap();
        let post = PostDetail::from_document(&raw);

        let html = generator.render_post(&post, false).unwrap();
        assert!(html.contains("<h2>Como utilizar Hooks</h2>"));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("1 min"));
        assert!(html.contains("<p>Olá &lt;mundo&gt;</p>"));
        assert!(html.contains(r#"data-section="0""#));
        assert_eq!(html.matches("utteranc.es/client.js").count(), 1);
    }

    #[test]
    fn test_title_is_escaped() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&site(&dir)).unwrap();
        let mut raw = doc("x", "");
        raw.data.title = Some(RichField::from("<script>alert(1)</script>"));
        let html = generator
            .render_post(&PostDetail::from_document(&raw), false)
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_unsafe_uid_is_not_written() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&site(&dir)).unwrap();
        assert!(generator.write_post("../escape", "x").unwrap().is_none());
        assert!(generator.post_output_path("ok-slug").is_some());
    }

    #[test]
    fn test_non_slug_uids_are_written() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&site(&dir)).unwrap();
        for uid in ["post_2", "Post-2"] {
            let path = generator.write_post(uid, "x").unwrap().unwrap();
            assert_eq!(path, dir.path().join("public/post").join(uid).join("index.html"));
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn test_generate_writes_pages() {
        let dir = TempDir::new().unwrap();
        let site = site(&dir);
        let generator = Generator::new(&site).unwrap();
        let source = MemorySource::new()
            .with_document(doc("first", "First"))
            .with_document(doc("second", "Second"))
            .with_document(doc("third", "Third"));

        let report = generator.generate(&source).await.unwrap();
        assert_eq!(report.listed, 1);
        assert!(!report.has_more);
        assert_eq!(report.posts, vec!["first", "second"]);

        assert!(site.public_dir.join("index.html").exists());
        assert!(site.public_dir.join("post/first/index.html").exists());
        assert!(site.public_dir.join("post/second/index.html").exists());
        assert!(!site.public_dir.join("post/third").exists());
        assert!(site.public_dir.join("404.html").exists());

        let queries = source.queries();
        assert_eq!(queries[0].page_size, 1);
        assert_eq!(queries[1].page_size, 2);
    }
}
