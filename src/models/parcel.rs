use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::GeoPoint;
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelSize {
    Small,
    Medium,
    Large,
}

impl ParcelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelSize::Small => "Small",
            ParcelSize::Medium => "Medium",
            ParcelSize::Large => "Large",
        }
    }
}

impl FromStr for ParcelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Small" => Ok(ParcelSize::Small),
            "Medium" => Ok(ParcelSize::Medium),
            "Large" => Ok(ParcelSize::Large),
            other => Err(format!(
                "unknown parcel size: {other}, expected Small/Medium/Large"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParcelStatus {
    #[default]
    Pending,
    #[serde(rename = "Picked Up")]
    PickedUp,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Failed,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 5] = [
        ParcelStatus::Pending,
        ParcelStatus::PickedUp,
        ParcelStatus::InTransit,
        ParcelStatus::Delivered,
        ParcelStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Pending => "Pending",
            ParcelStatus::PickedUp => "Picked Up",
            ParcelStatus::InTransit => "In Transit",
            ParcelStatus::Delivered => "Delivered",
            ParcelStatus::Failed => "Failed",
        }
    }

    /// Agents may move a parcel to any status except back to `Pending`.
    /// The previous status is not consulted.
    pub fn is_agent_settable(&self) -> bool {
        !matches!(self, ParcelStatus::Pending)
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParcelStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown parcel status: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub customer: Uuid,
    pub pickup_address: String,
    pub delivery_address: String,
    pub parcel_size: ParcelSize,
    pub parcel_type: String,
    pub is_prepaid: bool,
    pub cod_amount: f64,
    pub status: ParcelStatus,
    pub assigned_agent: Option<Uuid>,
    pub current_location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Parcel {
    pub fn is_assigned_to(&self, agent_id: Uuid) -> bool {
        self.assigned_agent == Some(agent_id)
    }
}

/// A parcel with its customer and agent resolved to user summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelDetail {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub customer: Option<UserSummary>,
    pub pickup_address: String,
    pub delivery_address: String,
    pub parcel_size: ParcelSize,
    pub parcel_type: String,
    pub is_prepaid: bool,
    pub cod_amount: f64,
    pub status: ParcelStatus,
    pub assigned_agent: Option<UserSummary>,
    pub current_location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParcelDetail {
    pub fn new(
        parcel: Parcel,
        customer: Option<UserSummary>,
        assigned_agent: Option<UserSummary>,
    ) -> Self {
        Self {
            id: parcel.id,
            customer,
            pickup_address: parcel.pickup_address,
            delivery_address: parcel.delivery_address,
            parcel_size: parcel.parcel_size,
            parcel_type: parcel.parcel_type,
            is_prepaid: parcel.is_prepaid,
            cod_amount: parcel.cod_amount,
            status: parcel.status,
            assigned_agent,
            current_location: parcel.current_location,
            created_at: parcel.created_at,
            updated_at: parcel.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ParcelStatus;

    #[test]
    fn status_uses_spaced_labels_on_the_wire() {
        let json = serde_json::to_string(&ParcelStatus::InTransit).unwrap();
        assert_eq!(json, "\"In Transit\"");

        let parsed: ParcelStatus = serde_json::from_str("\"Picked Up\"").unwrap();
        assert_eq!(parsed, ParcelStatus::PickedUp);
    }

    #[test]
    fn status_from_str_matches_labels() {
        for status in ParcelStatus::ALL {
            assert_eq!(status.as_str().parse::<ParcelStatus>().unwrap(), status);
        }
        assert!("InTransit".parse::<ParcelStatus>().is_err());
    }

    #[test]
    fn pending_is_not_agent_settable() {
        assert!(!ParcelStatus::Pending.is_agent_settable());
        assert!(ParcelStatus::Failed.is_agent_settable());
        assert!(ParcelStatus::Delivered.is_agent_settable());
    }
}
