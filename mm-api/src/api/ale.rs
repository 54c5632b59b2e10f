//! ALE endpoints
//!
//! All three read the optional `check_tape_length` form field (default
//! true) and forward it to the reader for every file.

use axum::extract::Multipart;
use axum::response::Response;
use axum::Json;
use mm_common::ale::AleOptions;
use mm_common::batch::{self, csv_filename, AleInput, CsvOutput};
use tracing::{info, warn};

use super::upload::{csv_attachment, has_extension, require_extension, UploadForm};
use crate::error::ApiResult;

/// Download name of the merged export
pub const MERGED_CSV_FILENAME: &str = "merged.csv";

const ALE_EXTENSION: &str = "ale";

fn options(form: &UploadForm) -> ApiResult<AleOptions> {
    Ok(AleOptions {
        check_tape_length: form.bool_field("check_tape_length", true)?,
    })
}

/// Batch inputs, skipping unnamed parts and files without the `.ale` extension
fn batch_inputs(form: &UploadForm) -> ApiResult<Vec<AleInput>> {
    let files = form.require_files()?;
    for original in &form.rejected {
        warn!(file = %original, "Skipping upload with invalid or empty filename");
    }

    let inputs = files
        .iter()
        .filter(|file| {
            let keep = has_extension(&file.filename, ALE_EXTENSION);
            if !keep {
                warn!(file = %file.filename, "Skipping upload without .ale extension");
            }
            keep
        })
        .map(|file| AleInput::new(file.filename.clone(), file.bytes.to_vec()))
        .collect();
    Ok(inputs)
}

/// POST /api/ale
///
/// Converts one ALE file to a CSV attachment named `<stem>.csv`.
pub async fn convert_ale(multipart: Multipart) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let options = options(&form)?;
    let file = form.single_file()?.clone();
    require_extension(&file, ALE_EXTENSION)?;

    let download = csv_filename(&file.filename);
    let csv = tokio::task::spawn_blocking(move || {
        batch::convert_one(&file.filename, &file.bytes, options).map(|table| {
            info!(file = %file.filename, rows = table.row_count(), "ALE converted");
            table.to_csv()
        })
    })
    .await??;

    Ok(csv_attachment(&download, csv))
}

/// POST /api/ale/multi_to_csvs
///
/// Converts each file independently; failures are skipped.
pub async fn convert_ale_batch(multipart: Multipart) -> ApiResult<Json<Vec<CsvOutput>>> {
    let form = UploadForm::read(multipart).await?;
    let options = options(&form)?;
    let inputs = batch_inputs(&form)?;

    let outputs =
        tokio::task::spawn_blocking(move || batch::convert_batch(&inputs, options)).await??;
    Ok(Json(outputs))
}

/// POST /api/ale/merge_to_csv
///
/// Concatenates every convertible file into one CSV attachment.
pub async fn merge_ale(multipart: Multipart) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let options = options(&form)?;
    let inputs = batch_inputs(&form)?;

    let csv = tokio::task::spawn_blocking(move || {
        batch::merge(&inputs, options).map(|table| table.to_csv())
    })
    .await??;
    Ok(csv_attachment(MERGED_CSV_FILENAME, csv))
}
