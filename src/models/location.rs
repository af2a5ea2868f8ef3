use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::parcel::ParcelStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Broadcast to every `/ws` listener after an agent moves a parcel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub parcel_id: Uuid,
    pub agent_id: Uuid,
    pub location: GeoPoint,
    pub moved_km: f64,
    pub status: ParcelStatus,
    pub updated_at: DateTime<Utc>,
}
