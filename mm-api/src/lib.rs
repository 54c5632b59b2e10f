//! mm-api library - media metadata upload and conversion service
//!
//! Accepts AVB, MXF, EDL and ALE uploads and returns JSON summaries or CSV
//! exports.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use mm_common::avb::{BinReader, ExternalBinReader};
use mm_common::config::TomlConfig;
use mm_common::probe::{FfprobeProber, MediaProber};
use mm_common::tool::{ExternalTool, AVB_DUMP, FFPROBE};
use mm_common::Normalizer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
///
/// Holds immutable configuration and the collaborators handlers call into.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TomlConfig>,
    pub normalizer: Normalizer,
    /// Media prober for MXF uploads
    pub prober: Arc<dyn MediaProber>,
    /// AVB bin reader
    pub bin_reader: Arc<dyn BinReader>,
    /// Server startup timestamp (for uptime)
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create state from explicit collaborators
    pub fn new(
        config: TomlConfig,
        prober: Arc<dyn MediaProber>,
        bin_reader: Arc<dyn BinReader>,
    ) -> Self {
        Self {
            normalizer: Normalizer::with_max_depth(config.normalize_max_depth),
            config: Arc::new(config),
            prober,
            bin_reader,
            startup_time: Utc::now(),
        }
    }

    /// Create state with ffprobe and the AVB dumper located from config
    pub fn from_config(config: TomlConfig) -> Self {
        let timeout = config.tool_timeout();
        let ffprobe = ExternalTool::resolve(&FFPROBE, config.ffprobe_path.as_deref(), timeout);
        let avb_dump = ExternalTool::resolve(&AVB_DUMP, config.avb_dump_path.as_deref(), timeout);

        Self::new(
            config,
            Arc::new(FfprobeProber::new(ffprobe)),
            Arc::new(ExternalBinReader::new(avb_dump)),
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .route("/api/avb", post(api::avb::parse_avb))
        .route("/api/avb/csv", post(api::avb::export_avb_csv))
        .route("/api/edl", post(api::edl::export_edl_csv))
        .route("/api/mxf", post(api::mxf::parse_mxf))
        .route("/api/ale", post(api::ale::convert_ale))
        .route("/api/ale/multi_to_csvs", post(api::ale::convert_ale_batch))
        .route("/api/ale/merge_to_csv", post(api::ale::merge_ale))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(api::health::health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
