//! Request handlers for the resolution API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use zonal::{CourierZoneMatch, Diagnostic, GeoPoint, ResolutionService, Zone, ZoneKind};

/// Application state shared across handlers
pub struct AppState {
    pub service: ResolutionService,
}

type HandlerError = (StatusCode, String);

fn parse_point(lat: f64, lng: f64) -> Result<GeoPoint, HandlerError> {
    GeoPoint::new(lat, lng).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn unavailable(e: anyhow::Error) -> HandlerError {
    tracing::error!("Zone snapshot unavailable: {:#}", e);
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

/// Run a service call on the blocking pool; a snapshot reload reads and
/// validates the whole zone file.
async fn with_service<T, F>(state: &Arc<AppState>, f: F) -> Result<T, HandlerError>
where
    T: Send + 'static,
    F: FnOnce(&ResolutionService) -> anyhow::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.service))
        .await
        .map_err(|e| {
            tracing::error!("Resolution task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .map_err(unavailable)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    zones: usize,
    rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    loaded_at: Option<DateTime<Utc>>,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    match with_service(&state, |service| service.snapshot()).await {
        Ok(snapshot) => Json(HealthResponse {
            status: "ok",
            zones: snapshot.len(),
            rejected: snapshot
                .diagnostics()
                .iter()
                .filter(|d| d.is_rejection())
                .count(),
            loaded_at: Some(snapshot.loaded_at()),
        }),
        Err(_) => Json(HealthResponse {
            status: "degraded",
            zones: 0,
            rejected: 0,
            loaded_at: None,
        }),
    }
}

#[derive(Deserialize)]
pub struct ServiceableParams {
    /// Store owning the service areas
    store: String,
    lat: f64,
    lng: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceableResponse {
    serviceable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    zone_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    blocked_by: Vec<String>,
}

/// Can a store deliver to a point
pub async fn serviceable_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ServiceableParams>,
) -> Result<Json<ServiceableResponse>, HandlerError> {
    let point = parse_point(params.lat, params.lng)?;
    let store = params.store;
    let result = with_service(&state, move |service| {
        service.check_serviceability(&store, &point)
    })
    .await?;

    Ok(Json(ServiceableResponse {
        serviceable: result.servable,
        zone_id: result.winner_id().map(String::from),
        blocked_by: result.blocked_by.iter().map(|z| z.id.clone()).collect(),
    }))
}

#[derive(Deserialize)]
pub struct CourierZoneParams {
    lat: f64,
    lng: f64,
    /// Number of packages (defaults to 1)
    packages: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierZoneResponse {
    courier_zone: Option<CourierZoneMatch>,
}

/// Courier zone and radius tier for a point
pub async fn courier_zone_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CourierZoneParams>,
) -> Result<Json<CourierZoneResponse>, HandlerError> {
    let point = parse_point(params.lat, params.lng)?;
    let packages = params.packages.unwrap_or(1);
    let courier_zone = with_service(&state, move |service| {
        service.find_courier_zone(&point, packages)
    })
    .await?;

    Ok(Json(CourierZoneResponse { courier_zone }))
}

#[derive(Deserialize)]
pub struct CoveringParams {
    lat: f64,
    lng: f64,
    /// Filter by zone kind
    kind: Option<ZoneKind>,
}

#[derive(Serialize)]
pub struct CoveringResponse {
    zones: Vec<Arc<Zone>>,
}

/// All zones covering a point (admin diagnostics)
pub async fn covering_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CoveringParams>,
) -> Result<Json<CoveringResponse>, HandlerError> {
    let point = parse_point(params.lat, params.lng)?;
    let kind = params.kind;
    let zones = with_service(&state, move |service| {
        service.list_covering_zones(&point, kind)
    })
    .await?;

    Ok(Json(CoveringResponse { zones }))
}

#[derive(Deserialize)]
pub struct PointParams {
    lat: f64,
    lng: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResponse {
    zone_id: String,
    /// Positive inside the zone, negative outside
    distance_meters: f64,
    inside: bool,
}

/// Signed distance from a point to a zone's edge
pub async fn distance_handler(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<String>,
    Query(params): Query<PointParams>,
) -> Result<Json<DistanceResponse>, HandlerError> {
    let point = parse_point(params.lat, params.lng)?;
    let id = zone_id.clone();
    let distance = with_service(&state, move |service| service.distance_to_edge(&id, &point))
        .await?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("zone not found: {}", zone_id)))?;

    Ok(Json(DistanceResponse {
        zone_id,
        distance_meters: distance,
        inside: distance >= 0.0,
    }))
}

#[derive(Serialize)]
pub struct DiagnosticsResponse {
    diagnostics: Vec<Diagnostic>,
}

/// Problems found while loading the current snapshot
pub async fn diagnostics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiagnosticsResponse>, HandlerError> {
    let snapshot = with_service(&state, |service| service.snapshot()).await?;
    Ok(Json(DiagnosticsResponse {
        diagnostics: snapshot.diagnostics().to_vec(),
    }))
}
