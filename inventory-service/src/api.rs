use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use shared::{InventoryError, NewProduct, NewWarehouse, Product, RemainingProduct, Warehouse};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::reservation::ReservationEngine;
use crate::store::InventoryStore;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub reservations: ReservationEngine,
    pub store: Arc<dyn InventoryStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            reservations: ReservationEngine::new(store.clone()),
            store,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub kind: &'static str,
    pub message: String,
}

/// Engine and extractor failures rendered as an `ErrorResponse`.
#[derive(Debug)]
pub struct ApiError(InventoryError);

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(InventoryError::invalid_argument(format!(
            "invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }

        let body = ErrorResponse {
            code: status.as_u16(),
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn path_id(param: Result<Path<i32>, PathRejection>, what: &str) -> Result<i32, ApiError> {
    param
        .map(|Path(id)| id)
        .map_err(|_| InventoryError::invalid_argument(format!("invalid {} ID", what)).into())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/create-warehouse", post(create_warehouse))
        .route("/create-product", post(create_product))
        .route("/delete-product/:id", delete(delete_product))
        .route("/reserve-products", post(reserve_products))
        .route("/release-products", post(release_products))
        .route("/remaining-products/:warehouse_id", get(remaining_products))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    request: Result<Json<NewWarehouse>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Warehouse>>), ApiError> {
    let Json(request) = request?;
    let warehouse = state.catalog.create_warehouse(request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: warehouse })))
}

pub async fn create_product(
    State(state): State<AppState>,
    request: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Product>>), ApiError> {
    let Json(request) = request?;
    let product = state.catalog.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id, "product")?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reserve_products(
    State(state): State<AppState>,
    codes: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(codes) = codes?;
    state.reservations.reserve_products(&codes).await?;
    Ok(StatusCode::OK)
}

pub async fn release_products(
    State(state): State<AppState>,
    codes: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(codes) = codes?;
    state.reservations.release_products(&codes).await?;
    Ok(StatusCode::OK)
}

pub async fn remaining_products(
    State(state): State<AppState>,
    warehouse_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<RemainingProduct>>, ApiError> {
    let warehouse_id = path_id(warehouse_id, "warehouse")?;
    let products = state.catalog.remaining_products(warehouse_id).await?;
    Ok(Json(products))
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}
