use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::SettingsPayloadError;
use domain::services::{AuthError, ContentError, GeocodeError, IdentityError, UploadError};
use domain::store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                msg.clone(),
            ),
            ApiError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                msg.clone(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(m) => format!("{}: {}", field, m),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();

        let message = if messages.len() == 1 {
            messages.remove(0)
        } else {
            format!("{} validation errors: {}", messages.len(), messages.join("; "))
        };

        ApiError::Validation(message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ContentError::Invalid(msg) => ApiError::Validation(msg),
            ContentError::Store(e) => e.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UnsupportedMediaType(_) => ApiError::UnsupportedMediaType(err.to_string()),
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            UploadError::InvalidName(_) => ApiError::Validation(err.to_string()),
            UploadError::NotFound(_) => ApiError::NotFound(err.to_string()),
            UploadError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::EmptyAddress => ApiError::Validation(err.to_string()),
            GeocodeError::NotFound(_) => ApiError::NotFound(err.to_string()),
            GeocodeError::Request(_) | GeocodeError::InvalidResponse(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Identity(IdentityError::InvalidToken(msg)) => ApiError::Unauthorized(msg),
            AuthError::Identity(IdentityError::KeysUnavailable(msg)) => {
                ApiError::ServiceUnavailable(msg)
            }
            AuthError::Forbidden => ApiError::Forbidden(err.to_string()),
            AuthError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::Token(e) => ApiError::Internal(format!("Session token error: {}", e)),
            AuthError::Store(e) => e.into(),
        }
    }
}

impl From<SettingsPayloadError> for ApiError {
    fn from(err: SettingsPayloadError) -> Self {
        match err {
            SettingsPayloadError::Malformed(e) => ApiError::Validation(e.to_string()),
            SettingsPayloadError::Invalid(errors) => errors.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use domain::models::Collection;
    use validator::Validate;

    #[test]
    fn test_api_error_statuses() {
        let cases = [
            (ApiError::Unauthorized("t".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("t".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("t".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("t".into()), StatusCode::CONFLICT),
            (ApiError::Validation("t".into()), StatusCode::BAD_REQUEST),
            (ApiError::PayloadTooLarge("t".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (
                ApiError::UnsupportedMediaType("t".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (ApiError::Internal("t".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::ServiceUnavailable("t".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Unauthorized("test".to_string())),
            "Unauthorized: test"
        );
        assert_eq!(
            format!("{}", ApiError::PayloadTooLarge("test".to_string())),
            "Payload too large: test"
        );
        assert_eq!(
            format!("{}", ApiError::Internal("test".to_string())),
            "Internal error: test"
        );
    }

    #[test]
    fn test_upload_errors_map_to_http_statuses() {
        let too_large: ApiError = UploadError::TooLarge {
            size: 6_000_000,
            max: 5_242_880,
        }
        .into();
        assert!(matches!(too_large, ApiError::PayloadTooLarge(_)));

        let wrong_type: ApiError = UploadError::UnsupportedMediaType("text/plain".into()).into();
        assert!(matches!(wrong_type, ApiError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_content_not_found_maps_to_404() {
        let err: ApiError = ContentError::NotFound {
            collection: Collection::Services,
            id: "svc-1".into(),
        }
        .into();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("svc-1")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_store_backend_error_is_internal() {
        let err: ApiError = StoreError::Backend("pool timed out".into()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_geocode_errors() {
        assert!(matches!(
            ApiError::from(GeocodeError::EmptyAddress),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(GeocodeError::NotFound("x".into())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(GeocodeError::Request("timeout".into())),
            ApiError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_auth_errors() {
        assert!(matches!(
            ApiError::from(AuthError::Forbidden),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::Identity(IdentityError::InvalidToken("bad".into()))),
            ApiError::Unauthorized(_)
        ));
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn test_validation_errors_keep_field_message() {
        let errors = Probe {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        match ApiError::from(errors) {
            ApiError::Validation(msg) => assert_eq!(msg, "name: Name is required"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
