use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

/// Unified error for every diagnostic surface. The Python scripts each
/// carried their own ad-hoc exception classes; here one enum covers the
/// CLI and the server, and `IntoResponse` decides what leaks to clients.
#[derive(Debug, ThisError)]
pub enum DiagError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Turso API error {status}: {message}")]
    TursoApi { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

impl IntoResponse for DiagError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match &self {
            DiagError::Database(_) | DiagError::Io(_) => {
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            DiagError::Config(_) | DiagError::MissingEnv(_) => {
                // A diagnostics endpoint is allowed to name the missing knob.
                let body = ApiErrorBody {
                    code: "CONFIG_ERROR".to_string(),
                    message: self.to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            DiagError::Http(_)
            | DiagError::UrlParse(_)
            | DiagError::Json(_)
            | DiagError::TursoApi { .. }
            | DiagError::UnexpectedResponse(_) => {
                let body = ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Upstream service is unavailable.".to_string(),
                };
                (StatusCode::BAD_GATEWAY, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn missing_env_maps_to_config_error() {
        let resp = DiagError::MissingEnv("NEON_DATABASE_URL").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn turso_api_maps_to_bad_gateway() {
        let err = DiagError::TursoApi {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
