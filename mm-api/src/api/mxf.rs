//! MXF endpoint

use axum::extract::{Multipart, State};
use axum::Json;
use mm_common::probe::{self, ProbeSummary};
use tracing::info;

use super::upload::{ScopedUpload, UploadForm};
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/mxf
///
/// Probes the upload and returns the format summary with streams grouped by
/// type.
pub async fn parse_mxf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ProbeSummary>> {
    let form = UploadForm::read(multipart).await?;
    let file = form.single_file()?;

    let upload = ScopedUpload::write(file).await?;
    let probed = state.prober.probe(upload.path()).await;
    upload.close().await;

    let summary = probe::summarize(probed?);
    info!(
        file = %file.filename,
        video = summary.video_streams.len(),
        audio = summary.audio_streams.len(),
        other = summary.other_streams.len(),
        "Media probed"
    );
    Ok(Json(summary))
}
