//! AVB bin endpoints

use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Json;
use mm_common::avb::{self, AvbDocument, AvbSummary};
use tracing::info;

use super::upload::{csv_attachment, ScopedUpload, UploadForm, UploadedFile};
use crate::error::ApiResult;
use crate::AppState;

/// Download name of the mob export
pub const AVB_CSV_FILENAME: &str = "avb_export.csv";

async fn read_document(state: &AppState, file: &UploadedFile) -> ApiResult<AvbDocument> {
    let upload = ScopedUpload::write(file).await?;
    let read = state.bin_reader.read_bin(upload.path()).await;
    upload.close().await;

    let document = read?;
    info!(file = %file.filename, mobs = document.mobs.len(), "AVB bin read");
    Ok(document)
}

/// POST /api/avb
///
/// Returns the bin summary, one entry per mob, and the normalized document.
pub async fn parse_avb(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<AvbSummary>> {
    let form = UploadForm::read(multipart).await?;
    let file = form.single_file()?;
    let document = read_document(&state, file).await?;

    Ok(Json(avb::summarize(&file.filename, &document, &state.normalizer)))
}

/// POST /api/avb/csv
///
/// Returns a Name / Mob ID CSV attachment.
pub async fn export_avb_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let file = form.single_file()?;
    let document = read_document(&state, file).await?;

    let csv = avb::mob_table(&document).to_csv();
    Ok(csv_attachment(AVB_CSV_FILENAME, csv))
}
