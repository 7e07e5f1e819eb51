//! In-memory content source for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ContentSource, Document, DocumentQuery, Error, QueryResponse, Result};
use crate::content::RichField;

/// A post document with a plain title
pub fn doc(uid: &str, title: &str) -> Document {
    let mut doc = Document {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        kind: "posts".to_string(),
        first_publication_date: Some("2021-03-25T10:00:00+0000".to_string()),
        ..Document::default()
    };
    doc.data.title = Some(RichField::from(title));
    doc.data.subtitle = Some(format!("{} subtitle", title));
    doc.data.author = Some("Joseph Oliveira".to_string());
    doc
}

/// A query response page
pub fn page(next_page: Option<&str>, results: Vec<Document>) -> QueryResponse {
    QueryResponse {
        page: 1,
        results_per_page: results.len(),
        next_page: next_page.map(str::to_string),
        results,
        ..QueryResponse::default()
    }
}

#[derive(Default)]
pub struct MemorySource {
    first_page: Option<QueryResponse>,
    pages: HashMap<String, QueryResponse>,
    documents: Mutex<Vec<Document>>,
    page_fetches: AtomicUsize,
    queries: Mutex<Vec<DocumentQuery>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response of every `query` call
    pub fn with_first_page(mut self, response: QueryResponse) -> Self {
        self.first_page = Some(response);
        self
    }

    /// Response for a `next_page` cursor
    pub fn with_page(mut self, cursor: &str, response: QueryResponse) -> Self {
        self.pages.insert(cursor.to_string(), response);
        self
    }

    /// Document reachable through lookups
    pub fn with_document(mut self, doc: Document) -> Self {
        self.documents.get_mut().unwrap().push(doc);
        self
    }

    /// Make a document reachable after the source is in use
    pub fn publish(&self, doc: Document) {
        self.documents.lock().unwrap().push(doc);
    }

    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<DocumentQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query(&self, query: &DocumentQuery) -> Result<QueryResponse> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.first_page.clone().unwrap_or_else(|| {
            let results = self
                .documents
                .lock()
                .unwrap()
                .iter()
                .take(query.page_size)
                .cloned()
                .collect();
            page(None, results)
        }))
    }

    async fn get_by_uid(&self, uid: &str, _reference: Option<&str>) -> Result<Option<Document>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn get_by_id(&self, id: &str, _reference: Option<&str>) -> Result<Option<Document>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn fetch_page(&self, next_page: &str) -> Result<QueryResponse> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(next_page)
            .cloned()
            .ok_or_else(|| Error::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                url: next_page.to_string(),
            })
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with("mem://")
    }
}
