//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::{PostDetail, PostSummary};
use crate::helpers::{post_path, strip_html, DateFormatter};

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/post_item.html",
                include_str!("site/partials/post_item.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub language: String,
}

/// A listing entry, also the JSON shape of the "load more" endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostItem {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl PostItem {
    pub fn new(post: &PostSummary, dates: &DateFormatter) -> Self {
        Self {
            uid: post.uid.clone(),
            path: post_path(&post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: dates.listing(post.first_publication_date.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub index: usize,
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub reading_time: String,
    pub banner_url: String,
    pub description: String,
    pub sections: Vec<SectionView>,
}

impl PostView {
    pub fn new(post: &PostDetail, dates: &DateFormatter, words_per_minute: usize) -> Self {
        let sections: Vec<SectionView> = post
            .content
            .iter()
            .enumerate()
            .map(|(index, section)| SectionView {
                index,
                heading: section.heading.clone(),
                html: section.body.as_html(),
            })
            .collect();

        let description = if post.subtitle.is_empty() {
            sections.first().map(|s| s.html.clone()).unwrap_or_default()
        } else {
            post.subtitle.clone()
        };

        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: dates.detail(post.first_publication_date.as_deref()),
            reading_time: post.reading_time(words_per_minute),
            banner_url: post.banner_url().to_string(),
            description,
            sections,
        }
    }
}
