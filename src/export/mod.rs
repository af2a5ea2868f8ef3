//! Admin report downloads.

pub mod csv_report;
pub mod pdf_report;

use crate::models::parcel::ParcelDetail;
use crate::models::user::UserSummary;

fn summary_name(summary: &Option<UserSummary>) -> &str {
    summary.as_ref().map(|user| user.name.as_str()).unwrap_or("")
}

fn summary_email(summary: &Option<UserSummary>) -> &str {
    summary.as_ref().map(|user| user.email.as_str()).unwrap_or("")
}

fn prepaid_label(parcel: &ParcelDetail) -> &'static str {
    if parcel.is_prepaid { "yes" } else { "no" }
}
