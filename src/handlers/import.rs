//! Lead import message handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth;
use crate::error::ImportError;
use crate::services::import_history::ImportHistoryResponse;
use crate::state::AppState;
use crate::types::{ErrorResponse, ImportHistoryRequest, ImportResult, PropertyImportRequest, Request, SuccessResponse};

const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Authenticate, decode and run one import request
pub async fn process_import(state: &AppState, request: &Request<PropertyImportRequest>) -> Result<ImportResult, ImportError> {
    let auth_info =
        auth::extract_auth(request, &state.jwt_secret).map_err(|e| ImportError::Unauthorized(e.to_string()))?;

    let payload = &request.payload;
    if payload.content_base64.trim().is_empty() {
        return Err(ImportError::NoFile);
    }

    // base64 inflates by 4/3; refuse before decoding anything oversized
    let limit = state.import.max_upload_bytes();
    if payload.content_base64.len() / 4 * 3 > limit + 2 {
        return Err(ImportError::FileTooLarge { limit });
    }

    let bytes = BASE64
        .decode(payload.content_base64.trim())
        .map_err(|e| ImportError::InvalidRequest(format!("contentBase64 is not valid base64: {}", e)))?;

    state.import.run(auth_info.user_id, &payload.filename, &bytes).await
}

/// Handle leadbook.property.import messages
pub async fn handle_import(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received property import message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<PropertyImportRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse import request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match process_import(&state, &request).await {
            Ok(result) => {
                let response = SuccessResponse::new(request.id, result);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(e) => {
                error!("Import request {} failed: {}", request.id, e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

/// Recent import runs of the caller
pub fn process_history(state: &AppState, request: &Request<ImportHistoryRequest>) -> Result<ImportHistoryResponse> {
    let auth_info = auth::extract_auth(request, &state.jwt_secret)?;
    let limit = request.payload.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(state.import.history().recent_for_user(auth_info.user_id, limit))
}

/// Handle leadbook.import.history messages
pub async fn handle_history(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import history message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<ImportHistoryRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse import history request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match process_history(&state, &request) {
            Ok(history) => {
                let response = SuccessResponse::new(request.id, history);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(_) => {
                let error = ErrorResponse::new(request.id, "UNAUTHORIZED", "Authentication required");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}
