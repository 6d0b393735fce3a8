//! Simplify Handlers

use axum::{extract::State, Json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::{
    ApplicationError, CancelRunCommand, GetRunStatusQuery, RunSimplificationCommand,
};
use crate::domain::{Level, SegmentId, TargetLang};
use crate::infrastructure::adapters::HtmlDocument;
use crate::infrastructure::http::dto::*;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Simplify Document
// ============================================================================

pub async fn simplify_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimplifyDocumentRequest>,
) -> Result<Json<ApiResponse<SimplifyDocumentResponseDto>>, ApiError> {
    if req.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("session_id is required".to_string()));
    }

    let target_lang = match req.target_lang.as_deref() {
        Some(s) => TargetLang::from_str(s)
            .ok_or_else(|| ApiError::BadRequest(format!("Unsupported target_lang: {}", s)))?,
        None => state.defaults.target_lang,
    };
    let level = match req.level.as_deref() {
        Some(s) => Level::from_str(s)
            .ok_or_else(|| ApiError::BadRequest(format!("Unsupported level: {}", s)))?,
        None => state.defaults.level,
    };

    // 在第一个 await 之前完成解析
    let document = HtmlDocument::parse(&req.html).map_err(ApplicationError::from)?;

    let cmd = RunSimplificationCommand {
        session_id: req.session_id.clone(),
        document,
        target_lang,
        level,
        domain: req.domain,
        cancel_token: None,
    };

    let mut simplified: HashMap<SegmentId, String> = HashMap::new();
    let summary = state
        .run_simplification_handler
        .handle(
            cmd,
            |id, text| {
                simplified.insert(id, text.to_string());
            },
            state.event_publisher.as_ref(),
        )
        .await?;

    state
        .event_publisher
        .publish_run_completed(&req.session_id, &summary);

    let segments = summary
        .segments
        .iter()
        .map(|segment| SegmentDto {
            node_id: segment.id().node().index(),
            original: segment.original_text().to_string(),
            simplified: simplified.remove(&segment.id()),
        })
        .collect();

    Ok(Json(ApiResponse::success(SimplifyDocumentResponseDto {
        run_id: summary.run_id,
        status: summary.status.as_str().to_string(),
        succeeded: summary.succeeded,
        failed: summary.failed,
        chunk_count: summary.chunk_count,
        batch_count: summary.batch_count,
        segments,
        failures: summary.failures.into_iter().map(FailureDto::from).collect(),
        mismatches: summary.mismatches,
    })))
}

// ============================================================================
// Cancel / Status
// ============================================================================

pub async fn cancel_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<CancelRunResponseDto>>, ApiError> {
    let result = state.cancel_run_handler.handle(CancelRunCommand {
        session_id: req.session_id,
    })?;

    state
        .event_publisher
        .publish_cancel_requested(&result.session_id, result.run_id);

    Ok(Json(ApiResponse::success(CancelRunResponseDto {
        session_id: result.session_id,
        run_id: result.run_id,
    })))
}

pub async fn run_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<RunStatusDto>>, ApiError> {
    let status = state.get_run_status_handler.handle(GetRunStatusQuery {
        session_id: req.session_id,
    })?;

    Ok(Json(ApiResponse::success(RunStatusDto::from(status))))
}

pub async fn simplifier_health(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SimplifierHealthDto>> {
    let healthy = state.simplifier.health_check().await;
    Json(ApiResponse::success(SimplifierHealthDto { healthy }))
}
