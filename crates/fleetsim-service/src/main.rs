use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use fleetsim_api::{
    DetailRequest, EventCard, EventDetail, EventList, EventTimeline, FleetSimApi,
    ListEventsRequest, MapMarker, StatusView, VehicleRequest, API_CONTRACT_VERSION,
};
use fleetsim_core::{serde_date, VehicleIdentity, VehicleProfile};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";

#[derive(Debug, Clone)]
struct ServiceState {
    api: FleetSimApi,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEnvelope<T>
where
    T: Serialize,
{
    service_contract_version: &'static str,
    api_contract_version: &'static str,
    data: T,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    service_contract_version: &'static str,
    error: String,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CardQuery {
    #[serde(default, with = "serde_date::option")]
    reference_date: Option<Date>,
}

/// Detail request plus an optional caller clock; the server clock is used
/// when `as_of` is absent.
#[derive(Debug, Clone, Deserialize)]
struct TimedDetailRequest {
    #[serde(flatten)]
    request: DetailRequest,
    #[serde(default, with = "time::serde::rfc3339::option")]
    as_of: Option<OffsetDateTime>,
}

impl TimedDetailRequest {
    fn now(&self) -> OffsetDateTime {
        self.as_of.unwrap_or_else(OffsetDateTime::now_utc)
    }
}

#[derive(Debug, Parser)]
#[command(name = "fleetsim-service")]
#[command(about = "Local HTTP service serving synthetic fleet data")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:4020")]
    bind: SocketAddr,
    /// JSON file replacing the built-in catalogs.
    #[arg(long)]
    catalogs: Option<PathBuf>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        (status, Json(self)).into_response()
    }
}

impl ServiceState {
    fn error(message: impl Into<String>) -> ServiceError {
        let error = message.into();
        tracing::warn!(%error, "request rejected");
        ServiceError { service_contract_version: SERVICE_CONTRACT_VERSION, error }
    }
}

fn envelope<T>(data: T) -> ServiceEnvelope<T>
where
    T: Serialize,
{
    ServiceEnvelope {
        service_contract_version: SERVICE_CONTRACT_VERSION,
        api_contract_version: API_CONTRACT_VERSION,
        data,
    }
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/events/:event_id", get(event_card))
        .route("/v1/events/:event_id/status", get(event_status))
        .route("/v1/events/detail", post(event_detail))
        .route("/v1/events/marker", post(event_marker))
        .route("/v1/events/list", post(event_list))
        .route("/v1/events/timeline", post(event_timeline))
        .route("/v1/vehicles", post(vehicle))
        .route("/v1/callsign/:index", get(callsign))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let state =
        ServiceState { api: FleetSimApi::from_optional_catalog_file(args.catalogs.as_deref())? };
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "fleetsim service listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn health() -> Json<ServiceEnvelope<HealthResponse>> {
    Json(envelope(HealthResponse { status: "ok" }))
}

async fn event_card(
    State(state): State<ServiceState>,
    Path(event_id): Path<String>,
    Query(query): Query<CardQuery>,
) -> Json<ServiceEnvelope<EventCard>> {
    let reference_date =
        query.reference_date.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    Json(envelope(state.api.event_card(&event_id, reference_date)))
}

async fn event_status(
    State(state): State<ServiceState>,
    Path(event_id): Path<String>,
) -> Json<ServiceEnvelope<StatusView>> {
    Json(envelope(state.api.event_status(&event_id)))
}

async fn event_detail(
    State(state): State<ServiceState>,
    Json(request): Json<TimedDetailRequest>,
) -> Result<Json<ServiceEnvelope<EventDetail>>, ServiceError> {
    let detail = state
        .api
        .event_detail(&request.request, request.now())
        .map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(detail)))
}

async fn event_marker(
    State(state): State<ServiceState>,
    Json(request): Json<TimedDetailRequest>,
) -> Result<Json<ServiceEnvelope<MapMarker>>, ServiceError> {
    let marker = state
        .api
        .map_marker(&request.request, request.now())
        .map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(marker)))
}

async fn event_timeline(
    State(state): State<ServiceState>,
    Json(request): Json<TimedDetailRequest>,
) -> Result<Json<ServiceEnvelope<EventTimeline>>, ServiceError> {
    let timeline = state
        .api
        .timeline(&request.request, request.now())
        .map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(timeline)))
}

async fn event_list(
    State(state): State<ServiceState>,
    Json(request): Json<ListEventsRequest>,
) -> Result<Json<ServiceEnvelope<EventList>>, ServiceError> {
    let list = state.api.list_events(&request).map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(list)))
}

async fn vehicle(
    State(state): State<ServiceState>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<ServiceEnvelope<VehicleProfile>>, ServiceError> {
    let profile = state.api.vehicle(&request).map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(profile)))
}

async fn callsign(
    State(state): State<ServiceState>,
    Path(index): Path<u32>,
) -> Json<ServiceEnvelope<VehicleIdentity>> {
    Json(envelope(state.api.callsign(index)))
}
