use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::error::AppError;
use crate::export::{prepaid_label, summary_name};
use crate::models::parcel::ParcelDetail;

// A4 landscape.
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 12.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 8.0;

/// (header, x offset in mm, max characters)
const COLUMNS: [(&str, f32, usize); 8] = [
    ("ID", 0.0, 8),
    ("Customer", 18.0, 20),
    ("Pickup", 55.0, 32),
    ("Delivery", 112.0, 32),
    ("Size", 169.0, 6),
    ("Status", 184.0, 11),
    ("Agent", 206.0, 20),
    ("COD", 244.0, 14),
];

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

pub fn render(parcels: &[ParcelDetail], generated_at: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
    let (doc, page, layer) = PdfDocument::new(
        "Parcel Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| pdf_error("load font", err))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| pdf_error("load font", err))?,
    };

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    current.use_text("Parcel Report", TITLE_SIZE, Mm(MARGIN_MM), Mm(y), &fonts.bold);
    y -= LINE_HEIGHT_MM * 1.5;
    current.use_text(
        format!(
            "Generated {} - {} parcels",
            generated_at.format("%Y-%m-%d %H:%M UTC"),
            parcels.len()
        ),
        BODY_SIZE,
        Mm(MARGIN_MM),
        Mm(y),
        &fonts.regular,
    );
    y -= LINE_HEIGHT_MM * 1.5;
    write_header_row(&current, &fonts, y);
    y -= LINE_HEIGHT_MM;

    for parcel in parcels {
        if y < MARGIN_MM {
            current = new_page(&doc);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
            write_header_row(&current, &fonts, y);
            y -= LINE_HEIGHT_MM;
        }

        let cod = format!("{:.2} ({})", parcel.cod_amount, prepaid_label(parcel));
        let id = parcel.id.to_string();
        let cells = [
            id.as_str(),
            summary_name(&parcel.customer),
            parcel.pickup_address.as_str(),
            parcel.delivery_address.as_str(),
            parcel.parcel_size.as_str(),
            parcel.status.as_str(),
            summary_name(&parcel.assigned_agent),
            cod.as_str(),
        ];

        for ((_, x, max_chars), cell) in COLUMNS.iter().zip(cells) {
            current.use_text(
                truncate(cell, *max_chars),
                BODY_SIZE,
                Mm(MARGIN_MM + x),
                Mm(y),
                &fonts.regular,
            );
        }
        y -= LINE_HEIGHT_MM;
    }

    drop(current);
    doc.save_to_bytes()
        .map_err(|err| pdf_error("serialize document", err))
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    doc.get_page(page).get_layer(layer)
}

fn write_header_row(layer: &PdfLayerReference, fonts: &Fonts, y: f32) {
    for (header, x, _) in COLUMNS {
        layer.use_text(header, BODY_SIZE, Mm(MARGIN_MM + x), Mm(y), &fonts.bold);
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn pdf_error(stage: &str, err: impl std::fmt::Debug) -> AppError {
    AppError::Internal(format!("failed to {stage} for pdf: {err:?}"))
}
