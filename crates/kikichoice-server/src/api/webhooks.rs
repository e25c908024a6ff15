use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};
use kikichoice_core::clerk::{ClerkWebhookEvent, CLERK_AUTH_PROVIDER, USER_CREATED_EVENT};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

const FAILED_TO_DECODE_WEBHOOK: &str = "FAILED_TO_DECODE_WEBHOOK";
const UNSUPPORTED_EVENT_TYPE: &str = "UNSUPPORTED_EVENT_TYPE";
const INVALID_WEBHOOK_PAYLOAD: &str = "INVALID_WEBHOOK_PAYLOAD";
const FAILED_TO_CREATE_USER: &str = "FAILED_TO_CREATE_USER";

#[derive(Debug, Serialize)]
pub(super) struct CreateUserResponse {
    message: &'static str,
    user_id: i64,
    clerk_id: String,
}

/// Provisions a local user for a Clerk `user.created` event.
///
/// Redelivered events return the existing user.
pub(super) async fn clerk_create_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<CreateUserResponse>>, ApiError> {
    let bad_request = |code: &str, message: String| {
        ApiError::new(StatusCode::BAD_REQUEST, req_id.0.clone(), code, message)
    };

    let event: ClerkWebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "failed to decode webhook payload");
        bad_request(FAILED_TO_DECODE_WEBHOOK, format!("invalid webhook payload: {e}"))
    })?;

    tracing::info!(
        event_type = %event.event_type,
        object = %event.object,
        clerk_id = %event.data.id,
        "received clerk webhook"
    );

    if event.event_type != USER_CREATED_EVENT {
        tracing::warn!(event_type = %event.event_type, "unsupported webhook event type");
        return Err(bad_request(
            UNSUPPORTED_EVENT_TYPE,
            format!("unsupported event type \"{}\"", event.event_type),
        ));
    }

    let user = &event.data;
    if user.id.trim().is_empty() {
        return Err(bad_request(
            INVALID_WEBHOOK_PAYLOAD,
            "missing user id".to_string(),
        ));
    }

    let name = user.full_name();
    let new_user = kikichoice_db::NewUser {
        name: &name,
        email: user.primary_email(),
        auth_provider: CLERK_AUTH_PROVIDER,
        auth_provider_id: &user.id,
        created_at: user.created_at_time(),
    };

    let provisioned = kikichoice_db::get_or_create_user(&state.pool, &new_user)
        .await
        .map_err(|e| {
            tracing::error!(clerk_id = %user.id, error = %e, "failed to create user");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                req_id.0.clone(),
                FAILED_TO_CREATE_USER,
                "failed to create user",
            )
        })?;

    tracing::info!(
        clerk_id = %user.id,
        user_id = provisioned.user.id,
        created = provisioned.created,
        "processed user.created webhook"
    );

    let data = CreateUserResponse {
        message: "User created successfully",
        user_id: provisioned.user.id,
        clerk_id: user.id.clone(),
    };
    Ok(ApiResponse::new(data, req_id.0.clone()))
}
