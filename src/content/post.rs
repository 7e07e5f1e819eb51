//! Post view models shaped from raw CMS documents

use serde::{Deserialize, Serialize};

use super::reading::reading_time;
use super::RichField;
use crate::cms::{Banner, Document};

/// A post as shown on the home page listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Shape a raw document into a summary
    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.uid.clone().unwrap_or_default(),
            first_publication_date: doc.first_publication_date.clone(),
            title: flatten_title(doc.data.title.as_ref()),
            subtitle: doc.data.subtitle.clone().unwrap_or_default(),
            author: doc.data.author.clone().unwrap_or_default(),
        }
    }
}

/// Shape a batch of raw documents, keeping their order
pub fn shape_summaries(docs: &[Document]) -> Vec<PostSummary> {
    docs.iter().map(PostSummary::from_document).collect()
}

/// A heading and its rich text body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: RichField,
}

/// A post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Option<Banner>,
    pub content: Vec<ContentSection>,
}

impl PostDetail {
    /// Shape a raw document into a detail record
    pub fn from_document(doc: &Document) -> Self {
        let content = doc
            .data
            .content
            .iter()
            .map(|section| ContentSection {
                heading: section.heading.clone().unwrap_or_default(),
                body: section.body.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            uid: doc.uid.clone().unwrap_or_default(),
            first_publication_date: doc.first_publication_date.clone(),
            title: flatten_title(doc.data.title.as_ref()),
            subtitle: doc.data.subtitle.clone().unwrap_or_default(),
            author: doc.data.author.clone().unwrap_or_default(),
            banner: doc.data.banner.clone(),
            content,
        }
    }

    /// Banner URL, empty when the image field is unset
    pub fn banner_url(&self) -> &str {
        self.banner
            .as_ref()
            .and_then(|b| b.url.as_deref())
            .unwrap_or("")
    }

    /// Estimated reading time, e.g. "3 min"
    pub fn reading_time(&self, words_per_minute: usize) -> String {
        reading_time(&self.content, words_per_minute)
    }
}

fn flatten_title(title: Option<&RichField>) -> String {
    title.map(RichField::flatten).unwrap_or_default()
}
