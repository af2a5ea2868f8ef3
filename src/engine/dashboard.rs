use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::parcel::{Parcel, ParcelStatus};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_bookings_today: usize,
    pub failed_deliveries: usize,
    pub cod_amount: f64,
    pub total_parcels: usize,
    pub unassigned_parcels: usize,
    pub status_breakdown: BTreeMap<&'static str, usize>,
}

pub fn snapshot(state: &AppState) -> DashboardMetrics {
    let parcels: Vec<Parcel> = state
        .parcels
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    compute(&parcels, Utc::now())
}

/// "Today" is the UTC calendar day of `now`. COD is only owed on parcels
/// that are not prepaid.
pub fn compute(parcels: &[Parcel], now: DateTime<Utc>) -> DashboardMetrics {
    let today = now.date_naive();

    let mut status_breakdown: BTreeMap<&'static str, usize> = ParcelStatus::ALL
        .iter()
        .map(|status| (status.as_str(), 0))
        .collect();

    let mut metrics = DashboardMetrics {
        total_bookings_today: 0,
        failed_deliveries: 0,
        cod_amount: 0.0,
        total_parcels: parcels.len(),
        unassigned_parcels: 0,
        status_breakdown: BTreeMap::new(),
    };

    for parcel in parcels {
        if parcel.created_at.date_naive() == today {
            metrics.total_bookings_today += 1;
        }
        if parcel.status == ParcelStatus::Failed {
            metrics.failed_deliveries += 1;
        }
        if !parcel.is_prepaid {
            metrics.cod_amount += parcel.cod_amount;
        }
        if parcel.assigned_agent.is_none() {
            metrics.unassigned_parcels += 1;
        }
        *status_breakdown.entry(parcel.status.as_str()).or_insert(0) += 1;
    }

    metrics.status_breakdown = status_breakdown;
    metrics
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::compute;
    use crate::models::location::GeoPoint;
    use crate::models::parcel::{Parcel, ParcelSize, ParcelStatus};

    fn parcel(status: ParcelStatus, is_prepaid: bool, cod_amount: f64, age: Duration) -> Parcel {
        let created = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap() - age;
        Parcel {
            id: Uuid::new_v4(),
            customer: Uuid::from_u128(1),
            pickup_address: "Mirpur 10".to_string(),
            delivery_address: "Uttara Sector 7".to_string(),
            parcel_size: ParcelSize::Small,
            parcel_type: "Documents".to_string(),
            is_prepaid,
            cod_amount,
            status,
            assigned_agent: None,
            current_location: GeoPoint::default(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn empty_store_reports_zeroes_for_every_status() {
        let metrics = compute(&[], Utc::now());

        assert_eq!(metrics.total_parcels, 0);
        assert_eq!(metrics.cod_amount, 0.0);
        assert_eq!(metrics.status_breakdown.len(), ParcelStatus::ALL.len());
        assert!(metrics.status_breakdown.values().all(|count| *count == 0));
    }

    #[test]
    fn aggregates_today_failures_and_cod() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let parcels = vec![
            parcel(ParcelStatus::Pending, false, 500.0, Duration::hours(1)),
            parcel(ParcelStatus::Failed, false, 250.5, Duration::days(2)),
            parcel(ParcelStatus::Failed, true, 900.0, Duration::hours(3)),
            parcel(ParcelStatus::Delivered, true, 0.0, Duration::days(1)),
        ];

        let metrics = compute(&parcels, now);

        assert_eq!(metrics.total_bookings_today, 2);
        assert_eq!(metrics.failed_deliveries, 2);
        assert_eq!(metrics.cod_amount, 750.5);
        assert_eq!(metrics.total_parcels, 4);
        assert_eq!(metrics.unassigned_parcels, 4);
        assert_eq!(metrics.status_breakdown["Failed"], 2);
        assert_eq!(metrics.status_breakdown["In Transit"], 0);
    }
}
