use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use phr_core::PhrError;

/// HTTP wrapper around [`PhrError`].
#[derive(Debug)]
pub struct ApiError(pub PhrError);

impl From<PhrError> for ApiError {
    fn from(err: PhrError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PhrError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PhrError::Duplicate(_) | PhrError::ConfirmationRequired(_) => StatusCode::CONFLICT,
            PhrError::NotFound(..) | PhrError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            PhrError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PhrError::Store { .. } => StatusCode::BAD_GATEWAY,
            PhrError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        }

        let mut body = ErrorRes::new(self.0.to_string());
        if let PhrError::Validation(errors) = &self.0 {
            body.field_errors = errors
                .iter()
                .map(|(field, message)| (field.to_owned(), message.to_owned()))
                .collect();
        }
        (status, Json(body)).into_response()
    }
}
