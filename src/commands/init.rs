//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
language: pt-BR

# Directory
public_dir: public

# Content repository (PRISMIC_API_ENDPOINT / PRISMIC_ACCESS_TOKEN override these)
cms:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  document_type: posts
  fetch:
    - posts.title
    - posts.subtitle
    - posts.author

# Home page
listing:
  page_size: 1
  paths_page_size: 2

# Publication dates (date-fns patterns)
dates:
  listing_format: "dd  MMM yyyy"
  detail_format: "dd MMM yyyy"
  locale: pt_BR
  timezone: America/Sao_Paulo

reading:
  words_per_minute: 200

# utterances
comments:
  enable: true
  src: https://utteranc.es/client.js
  repo: your-user/your-repository
  issue_term: pathname
  label: blog-comment
  theme: github-dark
"#;

const ENV_TEMPLATE: &str = "PRISMIC_API_ENDPOINT=\nPRISMIC_ACCESS_TOKEN=\n";

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;
    tracing::debug!("Created {:?}", config_path);

    let env_path = target_dir.join(".env.example");
    if !env_path.exists() {
        fs::write(&env_path, ENV_TEMPLATE)?;
    }

    Ok(())
}
