use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::{check_auth, parse_facility_type};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Facility;
use crate::services::facilities::{self, FacilityChanges, NewFacility};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FacilitiesQuery {
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
}

// GET /api/facilities, GET /api/admin/facilities
fn list(state: &AppState, query: FacilitiesQuery) -> Result<Vec<Facility>, AppError> {
    let facility_type = query
        .facility_type
        .as_deref()
        .map(parse_facility_type)
        .transpose()?;

    let db = state.db()?;
    Ok(queries::list_facilities(&db, facility_type)?)
}

pub async fn list_facilities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FacilitiesQuery>,
) -> Result<Json<Vec<Facility>>, AppError> {
    Ok(Json(list(&state, query)?))
}

// GET /api/facilities/:id
pub async fn get_facility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Facility>, AppError> {
    let db = state.db()?;
    Ok(Json(facilities::get_facility(&db, &id)?))
}

pub async fn admin_list_facilities(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FacilitiesQuery>,
) -> Result<Json<Vec<Facility>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(list(&state, query)?))
}

// POST /api/admin/facilities
#[derive(Deserialize)]
pub struct CreateFacilityRequest {
    pub name: String,
    #[serde(rename = "type", alias = "facility_type")]
    pub facility_type: String,
    #[serde(alias = "pricePerHour")]
    pub price_per_hour: f64,
    pub description: Option<String>,
    #[serde(alias = "isAvailable")]
    pub is_available: Option<bool>,
}

pub async fn create_facility(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateFacilityRequest>,
) -> Result<(StatusCode, Json<Facility>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let new = NewFacility {
        name: req.name,
        facility_type: parse_facility_type(&req.facility_type)?,
        price_per_hour: req.price_per_hour,
        description: req.description,
        is_available: req.is_available.unwrap_or(true),
    };

    let db = state.db()?;
    let facility = facilities::create_facility(&db, new)?;
    Ok((StatusCode::CREATED, Json(facility)))
}

// PUT /api/admin/facilities/:id
#[derive(Deserialize)]
pub struct UpdateFacilityRequest {
    pub name: Option<String>,
    #[serde(alias = "pricePerHour")]
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    #[serde(alias = "isAvailable")]
    pub is_available: Option<bool>,
}

pub async fn update_facility(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateFacilityRequest>,
) -> Result<Json<Facility>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let changes = FacilityChanges {
        name: req.name,
        price_per_hour: req.price_per_hour,
        description: req.description,
        is_available: req.is_available,
    };

    let db = state.db()?;
    Ok(Json(facilities::update_facility(&db, &id, changes)?))
}

// POST /api/admin/facilities/:id/availability
#[derive(Deserialize)]
pub struct AvailabilityRequest {
    #[serde(alias = "isAvailable")]
    pub is_available: bool,
}

pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<Facility>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    Ok(Json(facilities::set_availability(&db, &id, req.is_available)?))
}

// DELETE /api/admin/facilities/:id
pub async fn delete_facility(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    facilities::delete_facility(&db, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
