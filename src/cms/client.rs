//! Prismic REST API v2 client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::document::{ApiInfo, Document, QueryResponse};
use super::error::{Error, Result};
use crate::config::CmsConfig;

/// Source of post documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a document query
    async fn query(&self, query: &DocumentQuery) -> Result<QueryResponse>;

    /// Look up one post by its uid
    async fn get_by_uid(&self, uid: &str, reference: Option<&str>) -> Result<Option<Document>>;

    /// Look up one document by its id
    async fn get_by_id(&self, id: &str, reference: Option<&str>) -> Result<Option<Document>>;

    /// Fetch a `next_page` cursor verbatim
    async fn fetch_page(&self, next_page: &str) -> Result<QueryResponse>;

    /// Whether a cursor points at this repository
    fn owns_url(&self, url: &str) -> bool;
}

/// Build an `at` predicate, e.g. `[at(document.type,"posts")]`
pub fn at(path: &str, value: &str) -> String {
    format!("[at({},\"{}\")]", path, value.replace('"', "\\\""))
}

/// Parameters of a document search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub predicates: Vec<String>,
    pub page_size: usize,
    pub page: usize,
    pub fetch: Vec<String>,
    /// Content revision; the master ref when `None`
    pub reference: Option<String>,
}

impl DocumentQuery {
    /// All documents of one type, first page of 20
    pub fn of_type(document_type: &str) -> Self {
        Self {
            predicates: vec![at("document.type", document_type)],
            page_size: 20,
            page: 1,
            fetch: Vec::new(),
            reference: None,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn fetch(mut self, fields: &[String]) -> Self {
        self.fetch = fields.to_vec();
        self
    }

    pub fn reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    /// The `q` parameter: predicates wrapped in one list
    pub fn q(&self) -> String {
        format!("[{}]", self.predicates.concat())
    }
}

/// HTTP client for one Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    document_type: String,
}

impl PrismicClient {
    /// Create a client for the configured repository
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|source| Error::InvalidUrl {
            url: config.endpoint.clone(),
            source,
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
            document_type: config.document_type.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ref of the latest published revision
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn master_ref(&self) -> Result<String> {
        let url = self.with_token(self.endpoint.clone());
        let info: ApiInfo = self.get_json(url).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(Error::NoMasterRef)
    }

    async fn resolve_ref(&self, reference: Option<&str>) -> Result<String> {
        match reference {
            Some(r) => Ok(r.to_string()),
            None => self.master_ref().await,
        }
    }

    fn search_url(&self) -> Result<Url> {
        let raw = format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        );
        Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            let has_token = url.query_pairs().any(|(k, _)| k == "access_token");
            if !has_token {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    async fn lookup(&self, predicate: String, reference: Option<&str>) -> Result<Option<Document>> {
        let query = DocumentQuery {
            predicates: vec![predicate],
            page_size: 1,
            page: 1,
            fetch: Vec::new(),
            reference: reference.map(str::to_string),
        };
        let response = self.query(&query).await?;
        Ok(response.results.into_iter().next())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: redact(&url),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| Error::Decode {
            url: redact(&url),
            source,
        })
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    #[instrument(skip(self), fields(q = %query.q()))]
    async fn query(&self, query: &DocumentQuery) -> Result<QueryResponse> {
        let reference = self.resolve_ref(query.reference.as_deref()).await?;

        let mut url = self.search_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            pairs.append_pair("q", &query.q());
            pairs.append_pair("pageSize", &query.page_size.to_string());
            pairs.append_pair("page", &query.page.to_string());
            if !query.fetch.is_empty() {
                pairs.append_pair("fetch", &query.fetch.join(","));
            }
        }
        let url = self.with_token(url);

        debug!(page = query.page, page_size = query.page_size, "CMS query");
        self.get_json(url).await
    }

    async fn get_by_uid(&self, uid: &str, reference: Option<&str>) -> Result<Option<Document>> {
        let path = format!("my.{}.uid", self.document_type);
        self.lookup(at(&path, uid), reference).await
    }

    async fn get_by_id(&self, id: &str, reference: Option<&str>) -> Result<Option<Document>> {
        self.lookup(at("document.id", id), reference).await
    }

    #[instrument(skip_all)]
    async fn fetch_page(&self, next_page: &str) -> Result<QueryResponse> {
        let url = Url::parse(next_page).map_err(|source| Error::InvalidUrl {
            url: next_page.to_string(),
            source,
        })?;
        self.get_json(self.with_token(url)).await
    }

    fn owns_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(url) => {
                url.scheme() == self.endpoint.scheme()
                    && url.host_str() == self.endpoint.host_str()
                    && url.port_or_known_default() == self.endpoint.port_or_known_default()
            }
            Err(_) => false,
        }
    }
}

/// URL without its access token, for error messages and logs
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(pairs);
    }
    clean.to_string()
}
