//! Notification intake handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info, warn};

use email::{Notification, ValidationError};
use messaging::PublishError;

use crate::state::AppState;

/// Acknowledgment returned once the notification is durably enqueued.
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub stream: String,
    pub sequence: u64,
}

/// Error envelope shared by every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub message: String,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
        }
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        let status = if err.is_client_error() {
            warn!(error = %err, "Rejected unpublishable notification");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %err, "Failed to enqueue notification");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: true,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// POST /notif-svc/v1/create
///
/// Validates the notification and appends it to the durable stream.
/// A success response means the broker has the message; delivery
/// happens asynchronously.
pub async fn create(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> Result<Json<CreateResponse>, ApiError> {
    notification.validate()?;

    let sequence = state.publisher.publish(&notification).await?;

    info!(
        stream = %state.publisher.stream_name(),
        sequence,
        recipients = notification.to_list.len(),
        "Notification accepted"
    );

    Ok(Json(CreateResponse {
        stream: state.publisher.stream_name().to_string(),
        sequence,
    }))
}
