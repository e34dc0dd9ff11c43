/// Error responses of the proxy
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use skywatch_core::{Endpoint, ProviderError};
use thiserror::Error;

/// Fallback when the provider rate-limits us without saying for how long.
const DEFAULT_PROVIDER_RETRY_SECS: u64 = 60;

/// `{error, details?, retryAfter?}`
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    fn new(error: &str, details: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            details: Some(details.into()),
            retry_after: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing location parameter for /{0}")]
    MissingLocation(Endpoint),

    #[error("invalid coordinates")]
    InvalidCoordinates,

    #[error("unparsable query string for /{0}")]
    InvalidQuery(Endpoint),

    #[error("provider API key is not configured")]
    NotConfigured,

    #[error("client exceeded the rate limit")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApiError {
    pub fn parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::MissingLocation(endpoint) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "Missing required parameter. Please provide either \"city\" or both \"lat\" and \"lon\" coordinates.",
                    format!("Examples: /{endpoint}?city=London or /{endpoint}?lat=51.5074&lon=-0.1278"),
                ),
            ),
            ApiError::InvalidCoordinates => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "Invalid coordinates",
                    "\"lat\" and \"lon\" must both be numbers.",
                ),
            ),
            ApiError::InvalidQuery(endpoint) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "Invalid query parameters",
                    format!("Pass each parameter once, e.g. /{endpoint}?city=London"),
                ),
            ),
            ApiError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(
                    "Server configuration error",
                    "Weather service is not properly configured.",
                ),
            ),
            ApiError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    error: "Too many requests from this IP, please try again later.".to_string(),
                    details: None,
                    retry_after: Some(*retry_after_secs),
                },
            ),
            ApiError::Provider(err) => provider_parts(err),
        }
    }
}

fn provider_parts(err: &ProviderError) -> (StatusCode, ErrorResponse) {
    match err {
        ProviderError::Status { status: 400, .. } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid request", "Please check your input parameters."),
        ),
        // A rejected key is our fault, not the caller's.
        ProviderError::Status { status: 401, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("API key error", "Weather service authentication failed."),
        ),
        ProviderError::Status { status: 404, .. } => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new(
                "City not found",
                "The specified city could not be found. Please check the spelling and try again.",
            ),
        ),
        ProviderError::Status {
            status: 429,
            retry_after,
            ..
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse {
                retry_after: Some(
                    retry_after
                        .as_deref()
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(DEFAULT_PROVIDER_RETRY_SECS),
                ),
                ..ErrorResponse::new(
                    "API rate limit exceeded",
                    "Too many requests to the weather service. Please try again later.",
                )
            },
        ),
        ProviderError::Status { .. } => (
            StatusCode::BAD_GATEWAY,
            ErrorResponse::new(
                "Weather service temporarily unavailable",
                "The weather service is experiencing issues. Please try again later.",
            ),
        ),
        ProviderError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            ErrorResponse::new(
                "Request timeout",
                "The weather service is taking too long to respond. Please try again.",
            ),
        ),
        ProviderError::Unreachable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::new(
                "Service unavailable",
                "Unable to connect to the weather service. Please try again later.",
            ),
        ),
        ProviderError::Other(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Internal server error", "An unexpected error occurred"),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        let retry_after = body.retry_after;

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
