//! Home page listing with "load more" pagination
//!
//! A [`ListingFeed`] owns the summaries shown so far and the cursor of the
//! next page. Further pages are appended, never replacing what is already
//! visible, and a post whose uid was already shown is dropped.

use std::collections::HashSet;

use crate::cms::{ContentSource, Document, DocumentQuery, QueryResponse, Result};
use crate::config::SiteConfig;
use crate::content::{shape_summaries, PostSummary};

/// Result of one [`ListingFeed::load_more`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched; holds the number of new posts appended
    Appended(usize),
    /// No cursor left, nothing was fetched
    Exhausted,
}

/// Query for the first listing page
pub fn listing_query(config: &SiteConfig, reference: Option<&str>) -> DocumentQuery {
    DocumentQuery::of_type(&config.cms.document_type)
        .page_size(config.listing.page_size)
        .page(1)
        .fetch(&config.cms.fetch)
        .reference(reference)
}

/// Query for the posts pre-rendered at build time
pub fn paths_query(config: &SiteConfig) -> DocumentQuery {
    DocumentQuery::of_type(&config.cms.document_type)
        .page_size(config.listing.paths_page_size)
        .page(1)
}

/// Accumulated listing state
#[derive(Debug, Clone, Default)]
pub struct ListingFeed {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    seen: HashSet<String>,
}

impl ListingFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed holding the first page of a query
    pub fn from_response(response: QueryResponse) -> Self {
        let mut feed = Self::new();
        feed.append(&response.results);
        feed.next_page = response.next_page;
        feed
    }

    /// Empty feed that continues from an existing cursor
    pub fn resume(next_page: impl Into<String>) -> Self {
        Self {
            next_page: Some(next_page.into()),
            ..Self::default()
        }
    }

    /// Fetch the first listing page, at `reference` when previewing
    pub async fn initial(
        source: &dyn ContentSource,
        config: &SiteConfig,
        reference: Option<&str>,
    ) -> Result<Self> {
        let response = source.query(&listing_query(config, reference)).await?;
        let feed = Self::from_response(response);
        tracing::debug!(
            "Listing starts with {} posts (more: {})",
            feed.posts.len(),
            feed.has_more()
        );
        Ok(feed)
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the page behind the cursor and append its posts.
    ///
    /// On error the posts and cursor are left as they were.
    pub async fn load_more(&mut self, source: &dyn ContentSource) -> Result<LoadOutcome> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(LoadOutcome::Exhausted);
        };

        let response = match source.fetch_page(cursor).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to load more posts: {}", e);
                return Err(e);
            }
        };

        let appended = self.append(&response.results);
        self.next_page = response.next_page;
        tracing::debug!(
            "Loaded {} more posts (more: {})",
            appended,
            self.has_more()
        );

        Ok(LoadOutcome::Appended(appended))
    }

    /// Follow the cursor until the last page; returns the total post count
    pub async fn load_all(&mut self, source: &dyn ContentSource) -> Result<usize> {
        while let LoadOutcome::Appended(_) = self.load_more(source).await? {}
        Ok(self.posts.len())
    }

    fn append(&mut self, docs: &[Document]) -> usize {
        let mut appended = 0;
        for post in shape_summaries(docs) {
            if !post.uid.is_empty() && !self.seen.insert(post.uid.clone()) {
                tracing::debug!("Skipping duplicate post {}", post.uid);
                continue;
            }
            self.posts.push(post);
            appended += 1;
        }
        appended
    }
}
