//! Preview sessions: a cookie holding the CMS ref to render drafts at

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use super::ServerState;
use crate::helpers::post_path;

/// Cookie carrying the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Active preview ref, if any
pub fn reference(jar: &CookieJar) -> Option<String> {
    jar.get(PREVIEW_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Start a preview session and redirect to the previewed post
pub async fn enter(
    State(state): State<Arc<ServerState>>,
    jar: CookieJar,
    Query(params): Query<PreviewParams>,
) -> Response {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    };

    let location = match params.document_id.as_deref() {
        Some(id) => match state.source.get_by_id(id, Some(&token)).await {
            Ok(Some(doc)) => doc
                .uid
                .map(|uid| post_path(&uid))
                .unwrap_or_else(|| "/".to_string()),
            Ok(None) => "/".to_string(),
            Err(e) => {
                tracing::warn!("Failed to resolve previewed document {}: {}", id, e);
                "/".to_string()
            }
        },
        None => "/".to_string(),
    };

    tracing::info!("Preview session started, redirecting to {}", location);
    let cookie = Cookie::build((PREVIEW_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    (jar.add(cookie), Redirect::temporary(&location)).into_response()
}

/// End the preview session and go back to the home page
pub async fn exit(jar: CookieJar) -> impl IntoResponse {
    let mut removal = Cookie::build((PREVIEW_COOKIE, "")).path("/").build();
    removal.make_removal();

    (jar.add(removal), Redirect::temporary("/"))
}
