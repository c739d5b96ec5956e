use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use countries_core::Error;
use serde_json::{Map, Value, json};

/// The one place core errors become HTTP responses.
///
/// Validation failures are 400 with the parameter's help text; everything
/// else is a 500 carrying the error message.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            Error::Validation { param, message } => {
                tracing::debug!(param = *param, %message, "rejected request");
                let mut fields = Map::new();
                fields.insert(param.to_string(), Value::String(message.clone()));
                (StatusCode::BAD_REQUEST, Json(json!({ "message": fields }))).into_response()
            }
            err => {
                let provider = err.provider();
                match err {
                    Error::NotFound(_) | Error::Timeout { .. } => {
                        tracing::warn!(error = %err, ?provider, "request failed")
                    }
                    _ => tracing::error!(error = %err, ?provider, "request failed"),
                }
                let body = Json(json!({ "error": err.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
