//! Parcel lifecycle: booking, agent assignment, status and location changes.
//!
//! Each operation touches at most one parcel entry and holds that entry's
//! lock only for the write itself. Nothing here coordinates concurrent
//! writers beyond that.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::geo::{haversine_km, validate_point};
use crate::models::location::{GeoPoint, LocationUpdate};
use crate::models::parcel::{Parcel, ParcelDetail, ParcelSize, ParcelStatus};
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub pickup_address: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub parcel_size: String,
    #[serde(default)]
    pub parcel_type: String,
    #[serde(default)]
    pub is_prepaid: Option<bool>,
    #[serde(default)]
    pub cod_amount: Option<f64>,
}

pub fn book(state: &AppState, customer: &AuthUser, booking: Booking) -> Result<Parcel, AppError> {
    let pickup_address = required("pickupAddress", &booking.pickup_address)?;
    let delivery_address = required("deliveryAddress", &booking.delivery_address)?;
    let parcel_type = required("parcelType", &booking.parcel_type)?;
    let parcel_size = booking
        .parcel_size
        .trim()
        .parse::<ParcelSize>()
        .map_err(AppError::BadRequest)?;

    let now = Utc::now();
    let parcel = Parcel {
        id: Uuid::new_v4(),
        customer: customer.id,
        pickup_address,
        delivery_address,
        parcel_size,
        parcel_type,
        is_prepaid: booking.is_prepaid.unwrap_or(true),
        cod_amount: booking.cod_amount.unwrap_or(0.0),
        status: ParcelStatus::Pending,
        assigned_agent: None,
        current_location: GeoPoint::default(),
        created_at: now,
        updated_at: now,
    };

    state.parcels.insert(parcel.id, parcel.clone());
    state.metrics.parcels_booked_total.inc();

    info!(parcel_id = %parcel.id, customer_id = %customer.id, "parcel booked");
    Ok(parcel)
}

/// Newest booking first.
pub fn list_for_customer(state: &AppState, customer_id: Uuid) -> Vec<Parcel> {
    let mut parcels: Vec<Parcel> = state
        .parcels
        .iter()
        .filter(|entry| entry.value().customer == customer_id)
        .map(|entry| entry.value().clone())
        .collect();

    parcels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    parcels
}

/// Every parcel with customer and agent populated, newest booking first.
pub fn list_all(state: &AppState) -> Vec<ParcelDetail> {
    let mut parcels: Vec<Parcel> = state
        .parcels
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    parcels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    parcels
        .into_iter()
        .map(|parcel| populate(state, parcel))
        .collect()
}

/// Most recently touched first.
pub fn list_assigned(state: &AppState, agent_id: Uuid) -> Vec<Parcel> {
    let mut parcels: Vec<Parcel> = state
        .parcels
        .iter()
        .filter(|entry| entry.value().is_assigned_to(agent_id))
        .map(|entry| entry.value().clone())
        .collect();

    parcels.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    parcels
}

pub fn populate(state: &AppState, parcel: Parcel) -> ParcelDetail {
    let customer = state.user_summary(parcel.customer);
    let agent = parcel.assigned_agent.and_then(|id| state.user_summary(id));
    ParcelDetail::new(parcel, customer, agent)
}

/// Overwrites the assigned agent. Reassignment is allowed and agents have no
/// capacity limit.
pub fn assign_agent(state: &AppState, parcel_id: &str, agent_id: &str) -> Result<ParcelDetail, AppError> {
    let agent_id = parse_agent_id(agent_id)?;
    let is_agent = state
        .users
        .get(&agent_id)
        .map(|entry| entry.value().role == Role::Agent)
        .unwrap_or(false);
    if !is_agent {
        return Err(AppError::BadRequest("Invalid delivery agent".to_string()));
    }

    let parcel_id = parse_parcel_id(parcel_id)?;
    let (updated, previous) = {
        let mut parcel = state
            .parcels
            .get_mut(&parcel_id)
            .ok_or_else(|| parcel_not_found(parcel_id))?;

        let previous = parcel.assigned_agent.replace(agent_id);
        parcel.updated_at = Utc::now();
        (parcel.clone(), previous)
    };

    state.metrics.agent_assignments_total.inc();
    match previous {
        Some(previous) if previous != agent_id => info!(
            parcel_id = %parcel_id,
            agent_id = %agent_id,
            previous_agent_id = %previous,
            "parcel reassigned"
        ),
        _ => info!(parcel_id = %parcel_id, agent_id = %agent_id, "agent assigned"),
    }

    Ok(populate(state, updated))
}

pub fn update_status(
    state: &AppState,
    agent: &AuthUser,
    parcel_id: &str,
    status: &str,
) -> Result<Parcel, AppError> {
    let status = status
        .trim()
        .parse::<ParcelStatus>()
        .ok()
        .filter(ParcelStatus::is_agent_settable)
        .ok_or_else(|| AppError::BadRequest("Invalid status".to_string()))?;

    let parcel_id = parse_parcel_id(parcel_id)?;
    let (updated, previous) = {
        let mut parcel = state
            .parcels
            .get_mut(&parcel_id)
            .ok_or_else(|| parcel_not_found(parcel_id))?;
        ensure_assigned(&parcel, agent)?;

        let previous = parcel.status;
        parcel.status = status;
        parcel.updated_at = Utc::now();
        (parcel.clone(), previous)
    };

    state
        .metrics
        .status_updates_total
        .with_label_values(&[status.as_str()])
        .inc();

    info!(
        parcel_id = %parcel_id,
        agent_id = %agent.id,
        from = %previous,
        to = %status,
        "parcel status updated"
    );
    Ok(updated)
}

/// Stores the new position and then broadcasts it. Sending with no listeners
/// connected is not an error.
pub fn update_location(
    state: &AppState,
    agent: &AuthUser,
    parcel_id: &str,
    lat: f64,
    lng: f64,
) -> Result<Parcel, AppError> {
    let location = validate_point(lat, lng)?;
    let parcel_id = parse_parcel_id(parcel_id)?;

    let (updated, moved_km) = {
        let mut parcel = state
            .parcels
            .get_mut(&parcel_id)
            .ok_or_else(|| parcel_not_found(parcel_id))?;
        ensure_assigned(&parcel, agent)?;

        let moved_km = haversine_km(&parcel.current_location, &location);
        parcel.current_location = location;
        parcel.updated_at = Utc::now();
        (parcel.clone(), moved_km)
    };

    let event = LocationUpdate {
        parcel_id,
        agent_id: agent.id,
        location,
        moved_km,
        status: updated.status,
        updated_at: updated.updated_at,
    };

    state.metrics.location_updates_total.inc();
    match state.location_events_tx.send(event) {
        Ok(listeners) => debug!(parcel_id = %parcel_id, listeners, "location update broadcast"),
        Err(_) => debug!(parcel_id = %parcel_id, "location update broadcast with no listeners"),
    }

    info!(
        parcel_id = %parcel_id,
        agent_id = %agent.id,
        lat = location.lat,
        lng = location.lng,
        moved_km,
        "parcel location updated"
    );
    Ok(updated)
}

fn ensure_assigned(parcel: &Parcel, agent: &AuthUser) -> Result<(), AppError> {
    if parcel.is_assigned_to(agent.id) {
        return Ok(());
    }

    warn!(parcel_id = %parcel.id, agent_id = %agent.id, "agent is not assigned to parcel");
    Err(AppError::Forbidden(
        "You are not assigned to this parcel".to_string(),
    ))
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn parse_parcel_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid parcel id: {raw}")))
}

fn parse_agent_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest("Invalid delivery agent".to_string()))
}

fn parcel_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("parcel {id} not found"))
}
