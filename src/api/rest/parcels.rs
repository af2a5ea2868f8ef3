use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::{require_auth, require_role};
use crate::auth::AuthUser;
use crate::engine::accounts;
use crate::engine::dashboard::{self, DashboardMetrics};
use crate::engine::lifecycle::{self, Booking};
use crate::error::AppError;
use crate::export::{csv_report, pdf_report};
use crate::models::parcel::{Parcel, ParcelDetail};
use crate::models::user::{Role, User};
use crate::state::AppState;

/// Every route requires a bearer token plus exactly one role.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let customer = Router::new()
        .route("/book", post(book_parcel))
        .route("/my", get(my_parcels))
        .route_layer(middleware::from_fn_with_state(Role::Customer, require_role));

    let admin = Router::new()
        .route("/", get(all_parcels))
        .route("/agents", get(list_agents))
        .route("/assign-agent", patch(assign_agent))
        .route("/dashboard/metrics", get(dashboard_metrics))
        .route("/export/csv", get(export_csv))
        .route("/export/pdf", get(export_pdf))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role));

    let agent = Router::new()
        .route("/assigned", get(assigned_parcels))
        .route("/status", patch(update_status))
        .route("/update-location", patch(update_location))
        .route_layer(middleware::from_fn_with_state(Role::Agent, require_role));

    Router::new()
        .merge(customer)
        .merge(admin)
        .merge(agent)
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[derive(Serialize)]
pub struct ParcelResponse<T> {
    pub message: &'static str,
    pub parcel: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignAgentRequest {
    #[serde(default)]
    pub parcel_id: String,
    #[serde(default)]
    pub agent_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub parcel_id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[serde(default)]
    pub parcel_id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

async fn book_parcel(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<Booking>, JsonRejection>,
) -> Result<(StatusCode, Json<ParcelResponse<Parcel>>), AppError> {
    let Json(payload) = payload?;
    let parcel = lifecycle::book(&state, &caller, payload)?;

    Ok((
        StatusCode::CREATED,
        Json(ParcelResponse {
            message: "Parcel booked successfully",
            parcel,
        }),
    ))
}

async fn my_parcels(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Json<Vec<Parcel>> {
    Json(lifecycle::list_for_customer(&state, caller.id))
}

async fn all_parcels(State(state): State<Arc<AppState>>) -> Json<Vec<ParcelDetail>> {
    Json(lifecycle::list_all(&state))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(accounts::list_agents(&state))
}

async fn assign_agent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AssignAgentRequest>, JsonRejection>,
) -> Result<Json<ParcelResponse<ParcelDetail>>, AppError> {
    let Json(payload) = payload?;
    let parcel = lifecycle::assign_agent(&state, &payload.parcel_id, &payload.agent_id)?;

    Ok(Json(ParcelResponse {
        message: "Agent assigned",
        parcel,
    }))
}

async fn assigned_parcels(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Json<Vec<Parcel>> {
    Json(lifecycle::list_assigned(&state, caller.id))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ParcelResponse<Parcel>>, AppError> {
    let Json(payload) = payload?;
    let parcel = lifecycle::update_status(&state, &caller, &payload.parcel_id, &payload.status)?;

    Ok(Json(ParcelResponse {
        message: "Status updated",
        parcel,
    }))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<Json<ParcelResponse<Parcel>>, AppError> {
    let Json(payload) = payload?;
    let (Some(lat), Some(lng)) = (payload.lat, payload.lng) else {
        return Err(AppError::BadRequest("lat and lng are required".to_string()));
    };

    let parcel = lifecycle::update_location(&state, &caller, &payload.parcel_id, lat, lng)?;

    Ok(Json(ParcelResponse {
        message: "Location updated",
        parcel,
    }))
}

async fn dashboard_metrics(State(state): State<Arc<AppState>>) -> Json<DashboardMetrics> {
    Json(dashboard::snapshot(&state))
}

async fn export_csv(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let body = csv_report::render(&lifecycle::list_all(&state))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"parcels.csv\""),
        ],
        body,
    ))
}

async fn export_pdf(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let parcels = lifecycle::list_all(&state);
    let body = tokio::task::spawn_blocking(move || pdf_report::render(&parcels, Utc::now()))
        .await
        .map_err(|err| AppError::Internal(format!("pdf render task failed: {err}")))??;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"parcels.pdf\""),
        ],
        body,
    ))
}
