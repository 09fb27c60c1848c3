// 🌐 HTTP surface - thin axum layer over the ledger core
//
// The upstream identity provider (gateway) verifies the caller and forwards
// the owner id in `x-owner-id`. `require_owner` turns that header into an
// `OwnerId` extension; every ledger route sits behind it.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db::{DeletedId, NewTransaction, Transaction};
use crate::error::LedgerError;
use crate::identity::OwnerId;
use crate::queries::{self, TransactionQuery, TransactionView};
use crate::summary::{summarize, Summary, SummaryRequest};
use crate::{db::Account, mutations};

/// Header carrying the verified owner identity.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
        }
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub transactions: Vec<NewTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

// ============================================================================
// Error mapping
// ============================================================================

/// Failures rendered as an `ApiResponse` error body.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    /// Request body missing, not JSON, or the wrong shape.
    Body(JsonRejection),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Ledger(err) => match &err {
                LedgerError::Unauthorized => (StatusCode::UNAUTHORIZED, err.to_string()),
                LedgerError::InvalidRange { .. } | LedgerError::Validation { .. } => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                LedgerError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                LedgerError::StorageFailure(e) => {
                    error!(error = %e, "storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn with_conn<T>(
    state: &AppState,
    f: impl FnOnce(&mut Connection) -> crate::error::Result<T>,
) -> Result<T, ApiError> {
    // A panicking holder cannot leave a half-applied write: every mutation
    // is its own SQLite transaction, so a poisoned lock is still usable.
    let mut conn = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(f(&mut *conn)?)
}

// ============================================================================
// Middleware
// ============================================================================

async fn require_owner(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = req
        .headers()
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok());
    let owner = OwnerId::from_identity(identity)?;

    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// GET /api/summary?from&to&accountId
async fn get_summary(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Query(request): Query<SummaryRequest>,
) -> ApiResult<Summary> {
    let summary = with_conn(&state, |conn| summarize(conn, &owner, &request))?;
    Ok(ApiResponse::ok(summary))
}

/// GET /api/accounts
async fn get_accounts(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> ApiResult<Vec<Account>> {
    let accounts = with_conn(&state, |conn| queries::list_accounts(conn, &owner))?;
    Ok(ApiResponse::ok(accounts))
}

/// GET /api/transactions?from&to&accountId
async fn get_transactions(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Vec<TransactionView>> {
    let rows = with_conn(&state, |conn| queries::list_transactions(conn, &owner, &query))?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/transactions/:id
async fn get_transaction(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
) -> ApiResult<Transaction> {
    let row = with_conn(&state, |conn| queries::get_transaction(conn, &owner, &id))?;
    Ok(ApiResponse::ok(row))
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<Transaction> {
    let Json(fields) = payload?;
    let row = with_conn(&state, |conn| mutations::create_transaction(conn, &owner, fields))?;
    Ok(ApiResponse::ok(row))
}

/// POST /api/transactions/bulk-create
async fn bulk_create(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    payload: Result<Json<BulkCreateRequest>, JsonRejection>,
) -> ApiResult<Vec<Transaction>> {
    let Json(body) = payload?;
    let rows = with_conn(&state, |conn| {
        mutations::bulk_create_transactions(conn, &owner, body.transactions)
    })?;
    Ok(ApiResponse::ok(rows))
}

/// POST /api/transactions/bulk-delete
async fn bulk_delete(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    payload: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> ApiResult<Vec<DeletedId>> {
    let Json(body) = payload?;
    let deleted = with_conn(&state, |conn| {
        mutations::bulk_delete_transactions(conn, &owner, &body.ids)
    })?;
    Ok(ApiResponse::ok(deleted))
}

/// PATCH /api/transactions/:id
async fn update_transaction(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<Transaction> {
    let Json(fields) = payload?;
    let row = with_conn(&state, |conn| {
        mutations::update_transaction(conn, &owner, &id, fields)
    })?;
    Ok(ApiResponse::ok(row))
}

/// DELETE /api/transactions/:id
async fn delete_transaction(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
) -> ApiResult<DeletedId> {
    let deleted = with_conn(&state, |conn| mutations::delete_transaction(conn, &owner, &id))?;
    Ok(ApiResponse::ok(deleted))
}

// ============================================================================
// Router
// ============================================================================

/// Full application router, mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/summary", get(get_summary))
        .route("/accounts", get(get_accounts))
        .route("/transactions", get(get_transactions).post(create_transaction))
        .route("/transactions/bulk-create", post(bulk_create))
        .route("/transactions/bulk-delete", post(bulk_delete))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
        .route_layer(middleware::from_fn(require_owner));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
