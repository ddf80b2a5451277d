//! HTTP API handlers
//!
//! Request handlers for pipeline runs, schema updates and result export.

use axum::{
    extract::State,
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use lx_core::{FieldSchema, ResultSet};
use lx_extract::{to_csv, to_json, visible_records, RunErrorKind, RunState};

use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Run trigger response payload
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub status: String,
    /// Records captured by this run
    pub records: usize,
    pub processed: usize,
    pub skipped: usize,
}

/// Field schema replacement payload
#[derive(Debug, Deserialize)]
pub struct FieldsRequest {
    pub fields: Vec<String>,
}

/// Generic status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Latest results payload
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub fields: FieldSchema,
    pub records: ResultSet,
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Run one extraction pass
///
/// The schema active right now is captured and threaded through the whole
/// run; replacing it mid-run does not affect this pass.
pub async fn run_pipeline(
    State(state): State<AppState>,
) -> Result<Json<RunResponse>, HandlerError> {
    let schema = state.store.current_schema();
    info!(fields = ?schema.fields(), "pipeline run triggered");

    let report = state.runner.run_once(schema).await;

    match report.state {
        RunState::Done => Ok(Json(RunResponse {
            status: "ok".to_string(),
            records: report.records.len(),
            processed: report.processed,
            skipped: report.skipped,
        })),
        _ => {
            let message = report
                .error
                .unwrap_or_else(|| "pipeline run failed".to_string());
            error!("pipeline run failed: {message}");
            let status = match report.error_kind {
                Some(RunErrorKind::Auth) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            Err(error_response(status, message))
        }
    }
}

/// Replace the active field schema
pub async fn update_fields(
    State(state): State<AppState>,
    Json(req): Json<FieldsRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    debug!("field update request: {:?}", req.fields);

    if req.fields.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No fields provided",
        ));
    }

    let schema = FieldSchema::new(req.fields)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    state.store.set_schema(schema);
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

/// Latest results with the active schema
pub async fn results(State(state): State<AppState>) -> Json<ResultsResponse> {
    Json(ResultsResponse {
        fields: state.store.current_schema(),
        records: state.store.current(),
    })
}

type Download = ([(header::HeaderName, String); 2], String);

/// Download the visible records as a JSON attachment
pub async fn download_json(
    State(state): State<AppState>,
) -> Result<Download, HandlerError> {
    let records = state.store.current();
    let schema = state.store.current_schema();

    let visible = visible_records(&records, &schema);
    if visible.is_empty() {
        return Err(error_response(StatusCode::NOT_FOUND, "No data available"));
    }

    let body = to_json(&visible).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"data.json\"".to_string(),
            ),
        ],
        body,
    ))
}

/// Download the visible records as a flattened CSV attachment
pub async fn download_csv(
    State(state): State<AppState>,
) -> Result<Download, HandlerError> {
    let records = state.store.current();
    let schema = state.store.current_schema();

    let visible = visible_records(&records, &schema);
    if visible.is_empty() {
        return Err(error_response(StatusCode::NOT_FOUND, "No data available"));
    }

    let body = to_csv(&visible, &schema);

    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV.to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"data.csv\"".to_string(),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lx_core::{Config, ExtractedField, ExtractionRecord, RecordStore};
    use lx_extract::RunReport;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct StubRunner {
        report: RunReport,
    }

    #[async_trait]
    impl crate::server::PipelineRunner for StubRunner {
        async fn run_once(&self, _schema: FieldSchema) -> RunReport {
            self.report.clone()
        }
    }

    fn record(name: &str, value: &str) -> ExtractionRecord {
        let mut fields = BTreeMap::new();
        fields.insert(name.to_string(), ExtractedField::found(value, "context"));
        ExtractionRecord::from_fields(fields)
    }

    fn state_with(records: ResultSet, schema: FieldSchema, report: RunReport) -> AppState {
        let store = RecordStore::new("unused.json", schema);
        store.replace(records);
        AppState {
            config: Config::default(),
            store: Arc::new(store),
            runner: Arc::new(StubRunner { report }),
        }
    }

    fn done_report(records: ResultSet) -> RunReport {
        RunReport {
            state: RunState::Done,
            processed: records.len(),
            skipped: 0,
            records,
            error: None,
            error_kind: None,
        }
    }

    fn schema(names: &[&str]) -> FieldSchema {
        FieldSchema::new(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_run_reports_counts() {
        let report = done_report(vec![record("origin", "Chicago")]);
        let state = state_with(vec![], schema(&["origin"]), report);

        let response = run_pipeline(State(state)).await.unwrap();
        assert_eq!(response.status, "ok");
        assert_eq!(response.records, 1);
        assert_eq!(response.processed, 1);
    }

    #[tokio::test]
    async fn test_run_auth_failure_is_unauthorized() {
        let report = RunReport {
            state: RunState::Failed,
            records: vec![],
            processed: 0,
            skipped: 0,
            error: Some("please re-authenticate".to_string()),
            error_kind: Some(RunErrorKind::Auth),
        };
        let state = state_with(vec![], schema(&["origin"]), report);

        let (status, body) = run_pipeline(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.error.contains("re-authenticate"));
    }

    #[tokio::test]
    async fn test_update_fields_rejects_empty() {
        let state = state_with(vec![], schema(&["origin"]), done_report(vec![]));
        let request = FieldsRequest { fields: vec![] };

        let (status, body) = update_fields(State(state), Json(request)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "No fields provided");
    }

    #[tokio::test]
    async fn test_update_fields_replaces_schema() {
        let state = state_with(vec![], schema(&["origin"]), done_report(vec![]));
        let request = FieldsRequest {
            fields: vec!["carrier".to_string()],
        };

        update_fields(State(state.clone()), Json(request)).await.unwrap();
        assert_eq!(state.store.current_schema(), schema(&["carrier"]));
    }

    #[tokio::test]
    async fn test_download_json_404_when_empty() {
        let state = state_with(vec![], schema(&["origin"]), done_report(vec![]));
        let (status, body) = download_json(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "No data available");
    }

    #[tokio::test]
    async fn test_download_suppressed_under_new_schema() {
        // record has data for "origin" only; active schema asks for "carrier"
        let state = state_with(
            vec![record("origin", "Chicago")],
            schema(&["carrier"]),
            done_report(vec![]),
        );
        let (status, _) = download_json(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_csv_headers_and_body() {
        let state = state_with(
            vec![record("origin", "Chicago")],
            schema(&["origin"]),
            done_report(vec![]),
        );

        let (headers, body) = download_csv(State(state)).await.unwrap();
        assert_eq!(headers[0].1, "text/csv");
        assert!(headers[1].1.contains("data.csv"));
        assert!(body.starts_with("origin_value,origin_context\r\n"));
        assert!(body.contains("Chicago"));
    }
}
