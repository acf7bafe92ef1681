//! Purpose: Provide the HTTP/JSON server for larder.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum-based server mapping recipe routes onto table operations.
//! Invariants: Error kinds map to stable status codes (404/403/400/500).
//! Invariants: Loopback-only unless explicitly allowed.
//! Invariants: The data file is read once at startup and never rewritten.

use axum::extract::{DefaultBodyLimit, Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::api::{Error, ErrorKind};
use crate::core::loader::load_csv;
use crate::core::record::{field_f64, field_u64, Record};
use crate::core::table::Table;
use crate::core::rating;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub data_file: PathBuf,
    pub per_page: usize,
    pub max_body_bytes: u64,
    pub allow_non_loopback: bool,
}

struct AppState {
    table: RwLock<Table>,
    per_page: usize,
}

impl AppState {
    fn read_table(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(|poison| poison.into_inner())
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, Table> {
        self.table
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;

    let rows = load_csv(&config.data_file)?;
    tracing::info!(
        rows = rows.len(),
        data_file = %config.data_file.display(),
        "loaded recipe data"
    );

    let state = Arc::new(AppState {
        table: RwLock::new(Table::new(rows)),
        per_page: config.per_page,
    });

    let app = router(state).layer(DefaultBodyLimit::max(max_body_bytes));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/page/:page", get(list_recipes_page))
        .route("/recipes/:id", get(show_recipe).patch(update_recipe))
        .route(
            "/recipes/:id/ratings",
            put(rate_recipe).post(rate_recipe),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.per_page == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--per-page must be greater than zero")
            .with_hint("Use a positive value like 10."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    recipe_cuisine: Option<String>,
    per_page: Option<usize>,
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    list_page(&state, 1, query)
}

async fn list_recipes_page(
    State(state): State<Arc<AppState>>,
    AxumPath(page): AxumPath<usize>,
    Query(query): Query<ListQuery>,
) -> Response {
    list_page(&state, page, query)
}

fn list_page(state: &AppState, page: usize, query: ListQuery) -> Response {
    let mut criteria = Record::new();
    if let Some(cuisine) = query.recipe_cuisine {
        criteria.insert("recipe_cuisine".to_string(), Value::from(cuisine));
    }
    let per_page = query.per_page.unwrap_or(state.per_page);

    let result = state
        .read_table()
        .query(&criteria, page, per_page, "recipes");
    match result {
        Ok(envelope) => {
            // An empty page 1 is a valid result; an empty later page is
            // off the end of the query.
            if page > 1 && envelope.data.is_empty() {
                return error_response(
                    Error::new(ErrorKind::NotFound)
                        .with_message(format!("page {page} is past the last page")),
                );
            }
            Json(envelope).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn show_recipe(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<usize>,
) -> Response {
    match state.read_table().find(id) {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_recipe(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<usize>,
    payload: Option<Json<Value>>,
) -> Response {
    let patch = match record_payload(payload) {
        Ok(patch) => patch,
        Err(err) => return error_response(err),
    };
    match state.write_table().update(id, &patch) {
        Ok(merged) => Json(merged).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_recipe(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<Value>>,
) -> Response {
    let fields = match record_payload(payload) {
        Ok(fields) => fields,
        Err(err) => return error_response(err),
    };
    let stored = state.write_table().append(fields);
    (StatusCode::CREATED, Json(stored)).into_response()
}

async fn rate_recipe(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<usize>,
    payload: Option<Json<Value>>,
) -> Response {
    let rating = match payload
        .as_ref()
        .and_then(|Json(value)| value.get("rating"))
        .and_then(Value::as_f64)
    {
        Some(rating) => rating,
        None => {
            return error_response(
                Error::new(ErrorKind::MalformedRequest)
                    .with_message("request payload must include a numeric `rating`"),
            );
        }
    };
    if let Err(err) = rating::validate(rating) {
        return error_response(err);
    }

    // find + fold + update under one write guard so two ratings cannot
    // interleave and lose a count.
    let mut table = state.write_table();
    let found = table.find(id);
    let result = found.and_then(|record| {
        let average = field_f64(&record, "average_rating")?;
        let count = field_u64(&record, "rating_count")?;
        let (new_average, new_count) = rating::fold(average, count, rating);

        let mut patch = Record::new();
        patch.insert("average_rating".to_string(), json!(new_average));
        patch.insert("rating_count".to_string(), json!(new_count));
        table.update(id, &patch)
    });
    match result {
        Ok(merged) => Json(merged).into_response(),
        Err(err) => error_response(err),
    }
}

fn record_payload(payload: Option<Json<Value>>) -> Result<Record, Error> {
    match payload {
        Some(Json(Value::Object(fields))) => Ok(fields),
        _ => Err(Error::new(ErrorKind::MalformedRequest)
            .with_message("request payload must be a JSON object")),
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::FORBIDDEN,
        ErrorKind::MalformedRequest | ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::Io | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
            hint: err.hint().map(str::to_string),
        },
    };
    (status, Json(body)).into_response()
}
