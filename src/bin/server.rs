use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use noisescope::config::Params;
use noisescope::render::Frame;
use noisescope::scheduler::Surface;
use noisescope::session::{Command, Session};
use noisescope::transport::{MemoryBlob, TextBlob};

const MAX_DIMENSION: usize = 4096;

/// The one live session every client edits and watches.
type Shared = Arc<Mutex<Session<LatestPng>>>;

/// Surface that keeps the last presented frame as a PNG data URL.
#[derive(Default)]
struct LatestPng {
    size: (usize, usize),
    data_url: String,
}

impl Surface for LatestPng {
    type Error = image::ImageError;

    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        self.data_url = encode_png(&frame.rgba, frame.width, frame.height)?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct ParamEvent {
    field: String,
    /// Raw control value, parsed by the store.
    value: String,
}

#[derive(Deserialize)]
struct ImportRequest {
    text: String,
}

#[derive(Deserialize)]
struct FrameRequest {
    width: Option<usize>,
    height: Option<usize>,
}

#[derive(Serialize)]
struct FrameResponse {
    data_url: String,
    width: usize,
    height: usize,
    frame: u64,
    fps: Option<u32>,
    timings: Vec<TimingEntry>,
    state: Params,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ExportResponse {
    text: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

enum ApiError {
    Rejected(noisescope::Error),
    BadSize(usize, usize),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Rejected(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::BadSize(w, h) => (
                StatusCode::BAD_REQUEST,
                format!("surface {w}x{h} must be between 1 and {MAX_DIMENSION} on each side"),
            ),
            ApiError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<noisescope::Error> for ApiError {
    fn from(e: noisescope::Error) -> Self {
        ApiError::Rejected(e)
    }
}

fn encode_png(rgba: &[u8], w: usize, h: usize) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

/// Queue `command`, apply it before the next frame, and answer with the
/// resulting set or the rejection.
async fn run_command(state: &Shared, command: Command) -> Result<Json<Params>, ApiError> {
    let mut session = state.lock().await;
    session.submit(command);
    match session.process_commands().into_iter().next() {
        Some(e) => Err(ApiError::Rejected(e)),
        None => Ok(Json(session.params())),
    }
}

async fn defaults_handler() -> Json<Params> {
    Json(Params::default())
}

async fn params_handler(State(state): State<Shared>) -> Json<Params> {
    Json(state.lock().await.params())
}

async fn param_handler(
    State(state): State<Shared>,
    Json(ev): Json<ParamEvent>,
) -> Result<Json<Params>, ApiError> {
    run_command(&state, Command::set(ev.field, ev.value)).await
}

/// Bulk replace: every field, each as its raw control string.
async fn replace_handler(
    State(state): State<Shared>,
    Json(pairs): Json<BTreeMap<String, String>>,
) -> Result<Json<Params>, ApiError> {
    run_command(&state, Command::Replace(pairs.into_iter().collect())).await
}

async fn reset_handler(State(state): State<Shared>) -> Result<Json<Params>, ApiError> {
    run_command(&state, Command::Reset).await
}

async fn import_handler(
    State(state): State<Shared>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<Params>, ApiError> {
    let mut session = state.lock().await;
    session.import_from(&mut MemoryBlob::with_text(req.text))?;
    Ok(Json(session.params()))
}

async fn export_handler(State(state): State<Shared>) -> Result<Json<ExportResponse>, ApiError> {
    let mut clipboard = MemoryBlob::new();
    state.lock().await.export_to(&mut clipboard)?;
    let text = clipboard
        .read_text()
        .map_err(|e| ApiError::Rejected(e.into()))?;
    Ok(Json(ExportResponse { text }))
}

async fn frame_handler(
    State(state): State<Shared>,
    Json(req): Json<FrameRequest>,
) -> Result<Json<FrameResponse>, ApiError> {
    let width = req.width.unwrap_or(512);
    let height = req.height.unwrap_or(512);
    if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
        return Err(ApiError::BadSize(width, height));
    }

    let mut session = state.lock_owned().await;
    let response = tokio::task::spawn_blocking(move || -> Result<FrameResponse, ApiError> {
        session.surface_mut().size = (width, height);
        session
            .frame(Instant::now())
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let data_url = std::mem::take(&mut session.surface_mut().data_url);

        let scheduler = session.scheduler();
        let timings = scheduler
            .last_timings()
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect();

        Ok(FrameResponse {
            data_url,
            width,
            height,
            frame: scheduler.frame_number(),
            fps: scheduler.last_fps(),
            timings,
            state: session.params(),
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let state: Shared = Arc::new(Mutex::new(Session::new(LatestPng::default(), Instant::now())));
    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/defaults", get(defaults_handler))
        .route("/api/params", get(params_handler).put(replace_handler))
        .route("/api/param", post(param_handler))
        .route("/api/reset", post(reset_handler))
        .route("/api/import", post(import_handler))
        .route("/api/export", get(export_handler))
        .route("/api/frame", post(frame_handler))
        .fallback_service(frontend)
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    log::info!("noisescope server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
