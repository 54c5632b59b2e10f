//! EDL endpoint

use axum::extract::Multipart;
use axum::response::Response;
use mm_common::batch::csv_filename;
use mm_common::edl::EdlDocument;
use tracing::info;

use super::upload::{csv_attachment, UploadForm};
use crate::error::ApiResult;

/// POST /api/edl
///
/// Returns the nine-column event table as `<stem>.csv`.
pub async fn export_edl_csv(multipart: Multipart) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let file = form.single_file()?.clone();

    let filename = file.filename.clone();
    let csv = tokio::task::spawn_blocking(move || {
        EdlDocument::parse_bytes(&file.bytes).map(|doc| {
            info!(file = %file.filename, events = doc.events.len(), "EDL parsed");
            doc.event_table().to_csv()
        })
    })
    .await??;

    Ok(csv_attachment(&csv_filename(&filename), csv))
}
