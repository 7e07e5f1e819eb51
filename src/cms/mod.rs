//! Headless CMS access (Prismic REST API v2)

mod client;
mod document;
mod error;

pub use client::{at, ContentSource, DocumentQuery, PrismicClient};
pub use document::{ApiInfo, ApiRef, Banner, Document, PostData, QueryResponse, Section};
pub use error::{Error, Result};

#[cfg(test)]
pub mod testing;
