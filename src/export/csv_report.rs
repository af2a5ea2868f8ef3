use csv::Writer;

use crate::error::AppError;
use crate::export::{prepaid_label, summary_email, summary_name};
use crate::models::parcel::ParcelDetail;

pub const HEADERS: [&str; 15] = [
    "id",
    "customer_name",
    "customer_email",
    "pickup_address",
    "delivery_address",
    "parcel_size",
    "parcel_type",
    "prepaid",
    "cod_amount",
    "status",
    "agent_name",
    "agent_email",
    "latitude",
    "longitude",
    "created_at",
];

pub fn render(parcels: &[ParcelDetail]) -> Result<Vec<u8>, AppError> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(HEADERS).map_err(csv_error)?;

    for parcel in parcels {
        wtr.write_record([
            parcel.id.to_string().as_str(),
            summary_name(&parcel.customer),
            summary_email(&parcel.customer),
            parcel.pickup_address.as_str(),
            parcel.delivery_address.as_str(),
            parcel.parcel_size.as_str(),
            parcel.parcel_type.as_str(),
            prepaid_label(parcel),
            format!("{:.2}", parcel.cod_amount).as_str(),
            parcel.status.as_str(),
            summary_name(&parcel.assigned_agent),
            summary_email(&parcel.assigned_agent),
            parcel.current_location.lat.to_string().as_str(),
            parcel.current_location.lng.to_string().as_str(),
            parcel.created_at.to_rfc3339().as_str(),
        ])
        .map_err(csv_error)?;
    }

    wtr.into_inner()
        .map_err(|err| AppError::Internal(format!("failed to flush csv: {err}")))
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::Internal(format!("failed to write csv: {err}"))
}
