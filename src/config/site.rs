//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `cms.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,

    // Directory
    pub public_dir: String,

    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub dates: DateConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            public_dir: "public".to_string(),
            cms: CmsConfig::default(),
            listing: ListingConfig::default(),
            dates: DateConfig::default(),
            reading: ReadingConfig::default(),
            comments: CommentsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("Using CMS endpoint from {}", ENDPOINT_ENV);
            self.cms.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.cms.access_token = Some(token);
        }
    }
}

/// Headless CMS connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    /// Fields requested for listing queries
    #[serde(default)]
    pub fetch: Vec<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            fetch: vec![
                "posts.title".to_string(),
                "posts.subtitle".to_string(),
                "posts.author".to_string(),
            ],
        }
    }
}

/// Home page listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Posts per "load more" step
    pub page_size: usize,
    /// Posts pre-rendered by `generate`
    pub paths_page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 1,
            paths_page_size: 2,
        }
    }
}

/// Publication date rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    pub listing_format: String,
    pub detail_format: String,
    pub locale: String,
    pub timezone: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            listing_format: "dd  MMM yyyy".to_string(),
            detail_format: "dd MMM yyyy".to_string(),
            locale: "pt_BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

/// Reading time estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
        }
    }
}

/// utterances comment widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub src: String,
    pub repo: String,
    pub issue_term: String,
    pub label: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            src: "https://utteranc.es/client.js".to_string(),
            repo: "esterfania/space-traveling".to_string(),
            issue_term: "pathname".to_string(),
            label: "blog-comment".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}
