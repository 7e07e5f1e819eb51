//! Blog server
//!
//! Serves pre-generated pages from the public dir and renders the rest on
//! demand: posts that were not generated are looked up in the background
//! while the visitor gets a loading page, and a preview cookie switches
//! every page to fresh renders at the previewed ref.

pub mod preview;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::ContentSource;
use crate::content::PostDetail;
use crate::generator::Generator;
use crate::helpers::is_path_safe_uid;
use crate::listing::ListingFeed;
use crate::templates::PostItem;
use crate::Site;

/// How long an unknown slug is answered with 404 before it is looked up again
const MISSING_TTL: Duration = Duration::from_secs(60);
/// Most unknown slugs remembered at once
const MISSING_CAPACITY: usize = 1024;

/// Shared server state
pub struct ServerState {
    site: Site,
    source: Arc<dyn ContentSource>,
    generator: Generator,
    /// Slugs with a lookup in progress
    pending: Mutex<HashSet<String>>,
    /// Slugs the CMS recently did not know
    missing: Mutex<MissingPosts>,
}

/// Recently unknown slugs, each forgotten after a while
struct MissingPosts {
    ttl: Duration,
    capacity: usize,
    seen: HashMap<String, Instant>,
}

impl MissingPosts {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            seen: HashMap::new(),
        }
    }

    fn insert(&mut self, slug: &str, now: Instant) {
        let ttl = self.ttl;
        self.seen.retain(|_, at| now.duration_since(*at) < ttl);

        if self.seen.len() >= self.capacity {
            let oldest = self
                .seen
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(slug, _)| slug.clone());
            if let Some(oldest) = oldest {
                self.seen.remove(&oldest);
            }
        }

        if self.capacity > 0 {
            self.seen.insert(slug.to_string(), now);
        }
    }

    fn contains(&mut self, slug: &str, now: Instant) -> bool {
        match self.seen.get(slug) {
            Some(at) if now.duration_since(*at) < self.ttl => true,
            Some(_) => {
                self.seen.remove(slug);
                false
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of a background post lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Written,
    Missing,
    Failed,
}

impl ServerState {
    pub fn new(site: &Site, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            source,
            generator: Generator::new(site)?,
            pending: Mutex::new(HashSet::new()),
            missing: Mutex::new(MissingPosts::new(MISSING_TTL, MISSING_CAPACITY)),
        })
    }

    /// Change how long unknown slugs are remembered
    pub fn with_missing_ttl(self, ttl: Duration) -> Self {
        lock(&self.missing).ttl = ttl;
        self
    }

    /// Fetch a post by slug and write its page, remembering unknown slugs
    pub async fn lookup_post(&self, slug: &str) -> Lookup {
        let outcome = match self.source.get_by_uid(slug, None).await {
            Ok(Some(doc)) => {
                let post = PostDetail::from_document(&doc);
                let written = self
                    .generator
                    .render_post(&post, false)
                    .and_then(|html| self.generator.write_post(slug, &html));
                match written {
                    Ok(_) => {
                        tracing::info!("Generated post {}", slug);
                        Lookup::Written
                    }
                    Err(e) => {
                        tracing::error!("Failed to write post {}: {}", slug, e);
                        Lookup::Failed
                    }
                }
            }
            Ok(None) => {
                let mut missing = lock(&self.missing);
                missing.insert(slug, Instant::now());
                tracing::debug!("No post with uid {} ({} remembered)", slug, missing.len());
                Lookup::Missing
            }
            Err(e) => {
                tracing::error!("Failed to look up post {}: {}", slug, e);
                Lookup::Failed
            }
        };

        lock(&self.pending).remove(slug);
        outcome
    }

    fn is_missing(&self, slug: &str) -> bool {
        lock(&self.missing).contains(slug, Instant::now())
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/posts", get(load_more_handler))
        .route("/api/preview", get(preview::enter))
        .route("/api/exit-preview", any(preview::exit))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16, open: bool) -> Result<()> {
    let client = site.client()?;
    tracing::info!("Content repository: {}", client.endpoint());

    let state = Arc::new(ServerState::new(site, Arc::new(client))?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>, jar: CookieJar) -> Response {
    let reference = preview::reference(&jar);

    if reference.is_none() {
        let cached = state.site.public_dir.join("index.html");
        if let Ok(html) = tokio::fs::read_to_string(&cached).await {
            return Html(html).into_response();
        }
    }

    let feed = match ListingFeed::initial(
        state.source.as_ref(),
        &state.site.config,
        reference.as_deref(),
    )
    .await
    {
        Ok(feed) => feed,
        Err(e) => {
            tracing::error!("Failed to load the listing: {}", e);
            return bad_gateway();
        }
    };

    let html = match state.generator.render_index(&feed, reference.is_some()) {
        Ok(html) => html,
        Err(e) => return render_error(e),
    };

    if reference.is_none() {
        if let Err(e) = state.generator.write_index(&html) {
            tracing::warn!("Failed to cache the listing: {}", e);
        }
    }

    Html(html).into_response()
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Response {
    if let Some(reference) = preview::reference(&jar) {
        return preview_post(&state, &slug, &reference).await;
    }

    if let Some(path) = state.generator.post_output_path(&slug) {
        if let Ok(html) = tokio::fs::read_to_string(&path).await {
            return Html(html).into_response();
        }
    }

    if !is_path_safe_uid(&slug) || state.is_missing(&slug) {
        return not_found(&state);
    }

    let started = lock(&state.pending).insert(slug.clone());
    if started {
        tracing::debug!("Looking up post {} in the background", slug);
        let state = state.clone();
        tokio::spawn(async move {
            state.lookup_post(&slug).await;
        });
    }

    match state.generator.render_loading() {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_error(e),
    }
}

async fn preview_post(state: &ServerState, slug: &str, reference: &str) -> Response {
    match state.source.get_by_uid(slug, Some(reference)).await {
        Ok(Some(doc)) => {
            let post = PostDetail::from_document(&doc);
            match state.generator.render_post(&post, true) {
                Ok(html) => Html(html).into_response(),
                Err(e) => render_error(e),
            }
        }
        Ok(None) => not_found(state),
        Err(e) => {
            tracing::error!("Failed to load preview of {}: {}", slug, e);
            bad_gateway()
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    next_page: String,
}

/// One page of the listing, as consumed by the "load more" button
#[derive(Debug, Serialize, Deserialize)]
pub struct LoadMoreResponse {
    pub next_page: Option<String>,
    pub results: Vec<PostItem>,
}

async fn load_more_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LoadMoreParams>,
) -> Response {
    if !state.source.owns_url(&params.next_page) {
        tracing::warn!("Rejected foreign cursor {}", params.next_page);
        return (StatusCode::BAD_REQUEST, "Invalid next_page").into_response();
    }

    let mut feed = ListingFeed::resume(params.next_page);
    if feed.load_more(state.source.as_ref()).await.is_err() {
        return bad_gateway();
    }

    let results = feed
        .posts()
        .iter()
        .map(|post| state.generator.post_item(post))
        .collect();

    Json(LoadMoreResponse {
        next_page: feed.next_page().map(str::to_string),
        results,
    })
    .into_response()
}

/// Static files from the public dir
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.site.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Content repository unavailable").into_response()
}

fn render_error(e: anyhow::Error) -> Response {
    tracing::error!("Render error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
