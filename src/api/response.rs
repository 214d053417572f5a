// JSON responses with optional permissive CORS headers

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::error::ApiError;

const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "Content-Type, X-Requested-With",
    ),
];

/// Whether a JSON response carries the CORS headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cors {
    #[default]
    Allow,
    Omit,
}

/// 200 response with `value` as the JSON body.
pub fn json_response<T: Serialize>(value: &T, cors: Cors) -> Result<Response, ApiError> {
    json_response_with_status(StatusCode::OK, value, cors)
}

pub fn json_response_with_status<T: Serialize>(
    status: StatusCode,
    value: &T,
    cors: Cors,
) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(value)
        .map_err(|e| ApiError::Internal(format!("failed to serialize response: {}", e)))?;

    let mut response = (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response();

    if cors == Cors::Allow {
        let headers = response.headers_mut();
        for (name, value) in CORS_HEADERS {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_json_response_with_cors() {
        let response = json_response(&serde_json::json!({"a": 1}), Cors::Allow).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, GET, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, X-Requested-With"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"a":1}"#);
    }

    #[test]
    fn test_json_response_without_cors() {
        let response = json_response(&vec!["x"], Cors::Omit).unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_custom_status() {
        let response = json_response_with_status(
            StatusCode::FORBIDDEN,
            &serde_json::json!({"status": 403}),
            Cors::Allow,
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
