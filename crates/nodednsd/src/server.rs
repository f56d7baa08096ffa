//! HTTP control surface
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /api?dnsName&forwardName&id&hostType` | reconcile node `id` |
//! | `GET /page-date`, `/update-node`, `/update-forward` | whole store as JSON |
//! | anything else | bundled UI, 404 for unknown assets |

use crate::assets;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nodedns_core::{ReconcileRequest, Reconciler, Store};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

const SUCCESS_MESSAGE: &str = "Data processed successfully";

#[derive(Clone)]
struct AppState {
    reconciler: Reconciler,
}

pub fn router(reconciler: Reconciler) -> Router {
    Router::new()
        .route("/api", get(reconcile_node))
        .route("/page-date", get(dump_store))
        .route("/update-node", get(dump_store))
        .route("/update-forward", get(dump_store))
        .fallback(assets::serve)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { reconciler })
}

/// Query of `/api`; absent parameters are empty strings
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiQuery {
    dns_name: String,
    forward_name: String,
    id: String,
    host_type: String,
}

async fn reconcile_node(State(state): State<AppState>, Query(q): Query<ApiQuery>) -> Response {
    let index: i64 = match q.id.trim().parse() {
        Ok(index) => index,
        Err(_) => {
            warn!("Rejecting /api call with invalid id {:?}", q.id);
            return (StatusCode::BAD_REQUEST, format!("Invalid id: {:?}", q.id)).into_response();
        }
    };

    let request = ReconcileRequest::new(index, q.dns_name, q.host_type, q.forward_name);
    match state.reconciler.reconcile(&request).await {
        Ok(_) => Json(serde_json::json!({ "message": SUCCESS_MESSAGE })).into_response(),
        Err(e) => {
            let status = if e.is_invalid_input() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

async fn dump_store(State(state): State<AppState>) -> Json<Store> {
    Json(state.reconciler.store().snapshot().await)
}
