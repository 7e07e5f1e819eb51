//! spacetraveling: a blog backed by a headless Prismic repository
//!
//! Posts are fetched from the CMS, shaped into view models and rendered
//! with embedded Tera templates, either ahead of time (`generate`) or on
//! demand by the bundled server.

pub mod cms;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod listing;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// The blog application
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new site from a directory
    ///
    /// Reads `_config.yml` and `.env` when present; CMS settings from the
    /// environment take precedence over the file.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)?;
            tracing::debug!("Loaded environment from {:?}", env_path);
        }

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
        })
    }

    /// CMS client for the configured repository
    pub fn client(&self) -> Result<cms::PrismicClient> {
        Ok(cms::PrismicClient::new(&self.config.cms)?)
    }

    /// Generate the listing and pre-rendered post pages
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
