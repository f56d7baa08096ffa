//! Bundled web UI

use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub async fn serve(uri: Uri) -> Response {
    match uri.path() {
        "/" | "/index.html" => Html(INDEX_HTML).into_response(),
        path => {
            tracing::debug!("No bundled asset at {}", path);
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
