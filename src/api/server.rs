//! HTTP server for the rostersync API.
//!
//! Provides REST endpoints for import preview/apply and bulk actions over
//! the in-process roster store.
//!
//! # API Endpoints
//!
//! | Method | Path                     | Description                        |
//! |--------|--------------------------|------------------------------------|
//! | GET    | `/health`                | Health check                       |
//! | GET    | `/api/employees`         | Roster snapshot                    |
//! | POST   | `/api/import/preview`    | Preview pasted CSV text            |
//! | POST   | `/api/import/upload`     | Preview an uploaded CSV file       |
//! | POST   | `/api/import/apply`      | Preview + apply in one step        |
//! | POST   | `/api/employees/archive` | Bulk archive, per-target outcomes  |
//! | GET    | `/api/logs`              | SSE stream for real-time logs      |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::Value;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{
    error_response, ApplyResponse, ArchiveRequest, CsvMetadata, ImportRequest, PreviewResponse,
};
use crate::bulk;
use crate::error::ImportError;
use crate::import::{apply, preview_parsed, preview_text};
use crate::models::Employee;
use crate::store::RosterStore;

type ApiError = (StatusCode, Json<Value>);

/// Build the application router around a shared store.
pub fn router(store: Arc<RosterStore>) -> Router {
    // CORS is permissive for development; the dashboard runs on its own
    // origin.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/employees", get(list_employees))
        .route("/api/import/preview", post(import_preview))
        .route("/api/import/upload", post(import_upload))
        .route("/api/import/apply", post(import_apply))
        .route("/api/employees/archive", post(bulk_archive))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(store)
}

/// Start the HTTP server with a fresh store.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(RosterStore::new());
    let app = router(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 rostersync server running on http://localhost:{}", port);
    println!("   POST /api/import/preview - Preview CSV text");
    println!("   POST /api/import/apply   - Apply an import");
    println!("   GET  /api/logs           - SSE log stream");
    println!("   GET  /health             - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "rostersync",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Roster snapshot.
async fn list_employees(State(store): State<Arc<RosterStore>>) -> Json<Vec<Employee>> {
    Json(store.read().as_ref().clone())
}

/// Preview pasted CSV text.
async fn import_preview(
    State(store): State<Arc<RosterStore>>,
    Json(req): Json<ImportRequest>,
) -> Json<PreviewResponse> {
    let preview = preview_text(&req.csv_text, &store, req.auto_create_team);
    Json(PreviewResponse::from(preview))
}

/// Preview an uploaded CSV file (multipart: `file`, optional
/// `autoCreateTeam` text field).
async fn import_upload(
    State(store): State<Arc<RosterStore>>,
    mut multipart: Multipart,
) -> Result<Json<PreviewResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut auto_create_team = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request(format!("Multipart error: {}", e))
    })? {
        match field.name().unwrap_or("") {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "autoCreateTeam" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                auto_create_team = text.trim().eq_ignore_ascii_case("true");
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided".to_string()))?;

    let parsed = crate::parser::parse_bytes_auto(&bytes)
        .map_err(|e| bad_request(e.to_string()))?;
    let csv_info = CsvMetadata {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter.to_string(),
        row_count: parsed.rows.len(),
        columns: parsed.headers,
    };

    let preview = preview_parsed(parsed.rows, &store, auto_create_team);

    let mut response = PreviewResponse::from(preview);
    response.csv_info = Some(csv_info);
    Ok(Json(response))
}

/// Preview and apply in one step against the current roster generation.
async fn import_apply(
    State(store): State<Arc<RosterStore>>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ApplyResponse>, ApiError> {
    let preview = preview_text(&req.csv_text, &store, req.auto_create_team);

    let outcome = apply(&preview, &store).map_err(|e| match e {
        ImportError::StaleSnapshot { .. } => {
            (StatusCode::CONFLICT, Json(error_response(&e.to_string())))
        }
        ImportError::Csv(_) => bad_request(e.to_string()),
    })?;

    Ok(Json(ApplyResponse::new(outcome, store.read().len())))
}

/// Bulk archive; one outcome per requested id.
async fn bulk_archive(
    State(store): State<Arc<RosterStore>>,
    Json(req): Json<ArchiveRequest>,
) -> Json<Value> {
    let outcomes = bulk::archive(&store, &req.ids);
    Json(serde_json::json!({ "outcomes": outcomes }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(&message)))
}
