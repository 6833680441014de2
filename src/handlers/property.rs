//! Property message handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth;
use crate::services::property_status;
use crate::state::AppState;
use crate::types::{
    ErrorResponse, GetPropertyRequest, Property, Request, SuccessResponse, UpdatePropertyStatusRequest,
};

/// Handle leadbook.property.get messages
pub async fn handle_get(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received property.get message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<GetPropertyRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        if auth::extract_auth(&request, &state.jwt_secret).is_err() {
            let error = ErrorResponse::new(request.id, "UNAUTHORIZED", "Authentication required");
            let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            continue;
        }

        match property_status::get_property(state.store(), &request.payload.external_id).await {
            Ok(Some(property)) => {
                let response = SuccessResponse::new(request.id, property);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Ok(None) => {
                let error = ErrorResponse::new(request.id, "NOT_FOUND", "Property not found");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
            Err(e) => {
                error!("Failed to get property: {}", e);
                let error = ErrorResponse::new(request.id, "DATABASE_ERROR", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

/// Validate the caller and apply a status change
pub async fn process_status_update(
    state: &AppState,
    request: &Request<UpdatePropertyStatusRequest>,
) -> Result<Property, ErrorResponse> {
    let auth_info = auth::extract_auth(request, &state.jwt_secret)
        .map_err(|_| ErrorResponse::new(request.id, "UNAUTHORIZED", "Authentication required"))?;

    let payload = &request.payload;
    match property_status::get_property(state.store(), &payload.external_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ErrorResponse::new(request.id, "NOT_FOUND", "Property not found")),
        Err(e) => return Err(ErrorResponse::new(request.id, "DATABASE_ERROR", e.to_string())),
    }

    property_status::set_property_status(state.store(), &payload.external_id, payload.status, auth_info.user_id)
        .await
        .map_err(|e| ErrorResponse::new(request.id, "DATABASE_ERROR", e.to_string()))
}

/// Handle leadbook.property.status.update messages
pub async fn handle_update_status(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received property.status.update message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        // Unknown status strings fail here, at deserialization
        let request: Request<UpdatePropertyStatusRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match process_status_update(&state, &request).await {
            Ok(property) => {
                let response = SuccessResponse::new(request.id, property);
                let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
            }
            Err(error) => {
                warn!("Status update {} rejected: {}", request.id, error.error.message);
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::generate_token;
    use crate::auth::tests::TEST_SECRET;
    use crate::store::{LeadStore, MemoryLeadStore};
    use crate::types::PropertyStatus;

    async fn seeded_state() -> (AppState, Arc<MemoryLeadStore>) {
        let store = Arc::new(MemoryLeadStore::new());
        store
            .insert_property(&Property::new("X1", "Oak Apts", 50, Uuid::nil()))
            .await
            .unwrap();
        (AppState::new(store.clone(), TEST_SECRET.to_string(), 1024), store)
    }

    fn status_request(token: String, external_id: &str, status: PropertyStatus) -> Request<UpdatePropertyStatusRequest> {
        Request::with_token(
            token,
            UpdatePropertyStatusRequest {
                external_id: external_id.to_string(),
                status,
            },
        )
    }

    #[tokio::test]
    async fn status_update_records_caller() {
        let (state, store) = seeded_state().await;
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "agent@example.com", 1, TEST_SECRET).unwrap();

        let property = process_status_update(&state, &status_request(token, "X1", PropertyStatus::ProposalSent))
            .await
            .unwrap();

        assert_eq!(property.status, PropertyStatus::ProposalSent);
        assert_eq!(store.properties()[0].status_history[0].changed_by, user_id);
    }

    #[tokio::test]
    async fn status_update_for_unknown_property_is_not_found() {
        let (state, _) = seeded_state().await;
        let token = generate_token(Uuid::new_v4(), "agent@example.com", 1, TEST_SECRET).unwrap();

        let error = process_status_update(&state, &status_request(token, "X9", PropertyStatus::Lead))
            .await
            .unwrap_err();
        assert_eq!(error.error.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn status_update_requires_token() {
        let (state, _) = seeded_state().await;
        let mut request = status_request(String::new(), "X1", PropertyStatus::Lead);
        request.token = None;

        let error = process_status_update(&state, &request).await.unwrap_err();
        assert_eq!(error.error.code, "UNAUTHORIZED");
    }
}
