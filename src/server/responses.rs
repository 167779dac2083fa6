use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// Error envelope shared by every failing route: `{"success": false, "message": …}`.
#[derive(Serialize, Debug)]
struct ErrorEnvelope {
    success: bool,
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// A required request field is missing or the body is malformed (400).
    Validation(&'static str),

    /// The addressed resource does not exist (404).
    NotFound(&'static str),

    /// Anything else; details are logged but not exposed to the client (500).
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.into()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.into()),

            Self::Internal(e) => {
                error!("Error occured while processing an HTTP request: {e:#}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".into(),
                )
            }
        };

        (
            status,
            Json(ErrorEnvelope {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
