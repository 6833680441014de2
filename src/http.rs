//! HTTP upload endpoint
//!
//! `POST /api/properties/import` takes a multipart form with one spreadsheet
//! file and a bearer token, and answers with the import counts.

use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        DefaultBodyLimit, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::auth;
use crate::error::{ImportError, SheetError};
use crate::state::AppState;
use crate::types::ImportResult;

/// Multipart framing allowance on top of the file itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Uploaded spreadsheet
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.import.max_upload_bytes() + FORM_OVERHEAD_BYTES;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/properties/import", post(import_properties))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "store": state.store().name() })))
}

async fn import_properties(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let outcome = match authorize(&state, authorization) {
        Ok(caller) => match read_upload(multipart, state.import.max_upload_bytes()).await {
            Ok(upload) => run_upload(&state, caller, upload).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => (StatusCode::OK, Json(json!(result))),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Import upload failed: {}", e);
            } else {
                warn!("Import upload rejected ({}): {}", status, e);
            }
            (status, Json(json!({ "error": e.to_string() })))
        }
    }
}

fn authorize(state: &AppState, authorization: Option<&str>) -> Result<uuid::Uuid, ImportError> {
    auth::extract_bearer(authorization, &state.jwt_secret)
        .map(|info| info.user_id)
        .map_err(|e| ImportError::Unauthorized(e.to_string()))
}

/// First file field of the form; fields without a filename are ignored
async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<Option<Upload>, ImportError> {
    let multipart_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ImportError::FileTooLarge { limit }
        } else {
            ImportError::InvalidRequest(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(Upload {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// Import an already-received upload for `caller`
pub async fn run_upload(
    state: &AppState,
    caller: uuid::Uuid,
    upload: Option<Upload>,
) -> Result<ImportResult, ImportError> {
    let upload = upload.ok_or(ImportError::NoFile)?;
    state.import.run(caller, &upload.filename, &upload.bytes).await
}

pub fn status_for(error: &ImportError) -> StatusCode {
    match error {
        ImportError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ImportError::NoFile | ImportError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ImportError::Sheet(SheetError::NoWorksheetFound) => StatusCode::BAD_REQUEST,
        ImportError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ImportError::Sheet(SheetError::Unreadable(_)) | ImportError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_xlsxwriter::Workbook;
    use uuid::Uuid;

    use crate::auth::generate_token;
    use crate::auth::tests::TEST_SECRET;
    use crate::services::import_processor::tests::{workbook, Value as Cell};
    use crate::store::MemoryLeadStore;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryLeadStore::new()), TEST_SECRET.to_string(), 1024 * 1024)
    }

    fn upload(bytes: Vec<u8>) -> Option<Upload> {
        Some(Upload {
            filename: "leads.xlsx".to_string(),
            bytes,
        })
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ImportError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&ImportError::NoFile), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ImportError::Sheet(SheetError::NoWorksheetFound)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ImportError::FileTooLarge { limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&ImportError::Internal(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_authorize_requires_bearer_token() {
        let state = state();
        assert!(matches!(authorize(&state, None), Err(ImportError::Unauthorized(_))));

        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "agent@example.com", 1, TEST_SECRET).unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(authorize(&state, Some(&header)).unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_missing_file_is_bad_request() {
        let err = run_upload(&state(), Uuid::nil(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "No file provided");
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_workbook_without_cells_is_no_worksheet() {
        let mut book = Workbook::new();
        book.add_worksheet();
        let bytes = book.save_to_buffer().unwrap();

        let err = run_upload(&state(), Uuid::nil(), upload(bytes)).await.unwrap_err();
        assert_eq!(err.to_string(), "No worksheet found");
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_successful_upload_returns_counts() {
        let bytes = workbook(
            &["ALN Id", "Property Name", "# Units"],
            &[
                vec![Cell::Text("X1"), Cell::Text("Oak Apts"), Cell::Number(50.0)],
                vec![Cell::Blank, Cell::Text("No Id"), Cell::Number(3.0)],
            ],
        );

        let result = run_upload(&state(), Uuid::nil(), upload(bytes)).await.unwrap();
        let body = json!(result);
        assert_eq!(body["created"], 1);
        assert_eq!(body["updated"], 0);
        assert_eq!(body["errors"][0], "Row 3: Missing ALN Id");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }
}
